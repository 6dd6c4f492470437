//! Pages: the page tree index and per-page attributes and operations.

use super::catalog::PDFDocument;
use crate::error::{PdfError, Result};
use crate::interp::device::{ImageCollector, PageImage, TextExtractor, TextRun, TextRunCollector};
use crate::interp::interpreter::PDFPageInterpreter;
use crate::model::objects::PDFObject;
use crate::utils::Rect;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// US Letter, used when no `/MediaBox` is found on the page or its ancestors.
const DEFAULT_MEDIABOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Inheritable attributes of one page tree node, linked to its parent.
#[derive(Debug, Default)]
struct InheritedNode {
    parent: Option<Arc<InheritedNode>>,
    attrs: HashMap<&'static str, PDFObject>,
}

impl InheritedNode {
    fn from_dict(parent: Option<Arc<Self>>, dict: &HashMap<String, PDFObject>) -> Arc<Self> {
        let attrs = INHERITABLE
            .iter()
            .filter_map(|&key| dict.get(key).map(|value| (key, value.clone())))
            .collect();
        Arc::new(Self { parent, attrs })
    }

    fn lookup(&self, key: &str) -> Option<&PDFObject> {
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(value) = current.attrs.get(key) {
                return Some(value);
            }
            node = current.parent.as_deref();
        }
        None
    }

    /// Copy inherited values into `attrs` where the page has none.
    fn apply_to(&self, attrs: &mut HashMap<String, PDFObject>) {
        for key in INHERITABLE {
            if !attrs.contains_key(key)
                && let Some(value) = self.lookup(key)
            {
                attrs.insert(key.to_string(), value.clone());
            }
        }
    }
}

/// A leaf of the page tree.
#[derive(Debug, Clone)]
pub(crate) struct PageEntry {
    pub(crate) objid: u32,
    inherited: Option<Arc<InheritedNode>>,
}

/// Page leaves in document order, built once per document.
#[derive(Debug, Default)]
pub(crate) struct PageIndex {
    pages: Vec<PageEntry>,
}

impl PageIndex {
    pub(crate) fn new(doc: &PDFDocument) -> Self {
        let pages = Self::collect_from_page_tree(doc);
        if !pages.is_empty() {
            return Self { pages };
        }
        tracing::warn!("page tree yielded no pages, scanning for /Type /Page objects");
        Self {
            pages: Self::collect_from_fallback(doc),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&PageEntry> {
        self.pages.get(index)
    }

    /// Depth-first, in-order walk from `/Pages`. Nodes already visited are
    /// skipped so cyclic trees terminate.
    fn collect_from_page_tree(doc: &PDFDocument) -> Vec<PageEntry> {
        let Some(root) = doc.catalog().get("Pages") else {
            return Vec::new();
        };
        let Ok(root) = root.as_ref() else {
            return Vec::new();
        };

        let mut stack = vec![(root.objid, None::<Arc<InheritedNode>>)];
        let mut visited = HashSet::new();
        let mut pages = Vec::new();

        while let Some((objid, parent)) = stack.pop() {
            if !visited.insert(objid) {
                tracing::debug!(objid, "page tree revisits node");
                continue;
            }
            let obj = match doc.getobj_shared(objid) {
                Ok(obj) => obj,
                Err(err) => {
                    tracing::debug!(objid, %err, "unreadable page tree node");
                    continue;
                }
            };
            let Ok(dict) = obj.as_dict() else {
                continue;
            };

            let kids = dict.get("Kids").and_then(|kids| doc.resolve(kids).ok());
            let is_leaf = match dict.get("Type").and_then(|t| t.as_name().ok()) {
                Some("Page") => true,
                Some("Pages") => false,
                _ => kids.is_none(),
            };

            if is_leaf {
                pages.push(PageEntry {
                    objid,
                    inherited: parent,
                });
                continue;
            }

            let node = InheritedNode::from_dict(parent, dict);
            let Some(PDFObject::Array(kids)) = kids else {
                continue;
            };
            for kid in kids.iter().rev() {
                match kid {
                    PDFObject::Ref(r) => stack.push((r.objid, Some(Arc::clone(&node)))),
                    PDFObject::Int(n) => {
                        if let Ok(id) = u32::try_from(*n) {
                            stack.push((id, Some(Arc::clone(&node))));
                        }
                    }
                    other => tracing::debug!(objid, kid = other.type_name(), "ignoring page kid"),
                }
            }
        }
        pages
    }

    fn collect_from_fallback(doc: &PDFDocument) -> Vec<PageEntry> {
        doc.object_ids()
            .into_iter()
            .filter(|&objid| {
                doc.getobj_shared(objid).is_ok_and(|obj| {
                    obj.as_dict()
                        .is_ok_and(|d| d.get("Type").and_then(|t| t.as_name().ok()) == Some("Page"))
                })
            })
            .map(|objid| PageEntry {
                objid,
                inherited: None,
            })
            .collect()
    }
}

/// A page of a document.
///
/// The page holds its own copy of the attributes it was built from;
/// rotating it does not change the document.
#[derive(Debug, Clone)]
pub struct PDFPage {
    pub pageid: u32,
    /// Page dictionary with inherited attributes filled in.
    pub attrs: HashMap<String, PDFObject>,
    mediabox: [f64; 4],
    cropbox: [f64; 4],
    rotate: i64,
    pub resources: HashMap<String, PDFObject>,
}

impl PDFPage {
    pub(crate) fn from_entry(doc: &PDFDocument, entry: &PageEntry) -> Result<Self> {
        let obj = doc.getobj_shared(entry.objid)?;
        let mut attrs = obj.as_dict()?.clone();
        if let Some(inherited) = &entry.inherited {
            inherited.apply_to(&mut attrs);
        }
        Self::from_attrs(doc, entry.objid, attrs)
    }

    fn from_attrs(
        doc: &PDFDocument,
        pageid: u32,
        attrs: HashMap<String, PDFObject>,
    ) -> Result<Self> {
        let mediabox = match attrs.get("MediaBox").and_then(|b| parse_box(doc, b)) {
            Some(mediabox) => mediabox,
            None => {
                tracing::warn!(pageid, "page has no usable /MediaBox, assuming US Letter");
                DEFAULT_MEDIABOX
            }
        };
        let cropbox = attrs
            .get("CropBox")
            .and_then(|b| parse_box(doc, b))
            .unwrap_or(mediabox);
        let rotate = attrs
            .get("Rotate")
            .and_then(|r| doc.resolve(r).ok())
            .and_then(|r| r.as_int().ok())
            .unwrap_or(0)
            .rem_euclid(360);
        let resources = match attrs.get("Resources") {
            Some(res) => doc.resolve(res)?.as_dict().cloned().unwrap_or_default(),
            None => HashMap::new(),
        };

        Ok(Self {
            pageid,
            attrs,
            mediabox,
            cropbox,
            rotate,
            resources,
        })
    }

    pub const fn mediabox(&self) -> [f64; 4] {
        self.mediabox
    }

    pub const fn cropbox(&self) -> [f64; 4] {
        self.cropbox
    }

    pub(crate) const fn mediabox_rect(&self) -> Rect {
        let [x0, y0, x1, y1] = self.mediabox;
        (x0, y0, x1, y1)
    }

    /// Clockwise rotation in degrees, one of 0, 90, 180 or 270.
    pub const fn rotation(&self) -> i64 {
        self.rotate
    }

    /// Rotate the page view counter-clockwise by `degrees`.
    ///
    /// `degrees` must be a multiple of 90; negative values rotate the
    /// other way.
    pub fn rotate_counter_clockwise(&mut self, degrees: i64) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(PdfError::InvalidArgument(
                "Rotation angle must be a multiple of 90".into(),
            ));
        }
        self.set_rotation((self.rotate - degrees.rem_euclid(360)).rem_euclid(360));
        Ok(())
    }

    pub fn rotate_clockwise(&mut self, degrees: i64) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(PdfError::InvalidArgument(
                "Rotation angle must be a multiple of 90".into(),
            ));
        }
        self.set_rotation((self.rotate + degrees.rem_euclid(360)).rem_euclid(360));
        Ok(())
    }

    fn set_rotation(&mut self, rotate: i64) {
        self.rotate = rotate;
        self.attrs.insert("Rotate".into(), PDFObject::Int(rotate));
    }

    /// Decoded content of every `/Contents` stream, joined by newlines.
    ///
    /// Streams that cannot be read are skipped.
    pub fn content_data(&self, doc: &PDFDocument) -> Result<Vec<u8>> {
        let Some(contents) = self.attrs.get("Contents") else {
            return Ok(Vec::new());
        };
        let streams = match doc.resolve(contents)? {
            PDFObject::Array(items) => items,
            other => vec![other],
        };

        let mut out = Vec::new();
        for (i, item) in streams.iter().enumerate() {
            let data = doc.resolve_shared(item).and_then(|obj| obj.as_stream()?.get_data());
            match data {
                Ok(data) => {
                    if i > 0 {
                        out.push(b'\n');
                    }
                    out.extend_from_slice(&data);
                }
                Err(err) => {
                    tracing::warn!(pageid = self.pageid, index = i, %err, "skipping content stream");
                }
            }
        }
        Ok(out)
    }

    /// Plain text of the page.
    ///
    /// `tj_sep` is written before each `Tj` string and `tj_array_sep`
    /// before each string element of a `TJ` array.
    pub fn extract_text(&self, doc: &PDFDocument, tj_sep: &str, tj_array_sep: &str) -> Result<String> {
        let mut device = TextExtractor::new(tj_sep, tj_array_sep);
        PDFPageInterpreter::new(doc, &mut device).process_page(self)?;
        Ok(device.into_text())
    }

    /// One run per text-showing operation, in content order.
    pub fn text_runs(&self, doc: &PDFDocument) -> Result<Vec<TextRun>> {
        let mut device = TextRunCollector::default();
        PDFPageInterpreter::new(doc, &mut device).process_page(self)?;
        Ok(device.into_runs())
    }

    /// Images painted on the page, including those inside forms.
    pub fn images(&self, doc: &PDFDocument) -> Result<Vec<PageImage>> {
        let mut device = ImageCollector::default();
        PDFPageInterpreter::new(doc, &mut device).process_page(self)?;
        Ok(device.into_images())
    }

    /// Data of the XObject named `name` in the page resources.
    pub fn get_resource_image(&self, doc: &PDFDocument, name: &str) -> Result<Vec<u8>> {
        let name = name.strip_prefix('/').unwrap_or(name);
        let not_found = || PdfError::ResourceNotFound(format!("/{name}"));
        let xobjects = self.resources.get("XObject").ok_or_else(not_found)?;
        let xobjects = doc.resolve_shared(xobjects)?;
        let entry = xobjects.as_dict()?.get(name).ok_or_else(not_found)?;
        let image = doc.resolve_shared(entry)?;
        image.as_stream()?.get_data()
    }
}

fn parse_box(doc: &PDFDocument, obj: &PDFObject) -> Option<[f64; 4]> {
    let resolved = doc.resolve(obj).ok()?;
    let items = resolved.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = doc.resolve(item).ok()?.as_num().ok()?;
    }
    Some(out)
}
