//! PDF document: cross-reference loading, object resolution and decryption.

use super::page::{PDFPage, PageIndex};
use super::repair::rebuild_xref;
use super::security::{PDFSecurityHandler, Permissions, create_security_handler};
use super::xref::{XRefEntry, XRefTable, find_startxref, load_chain, object_stream_index};
use crate::config::OpenOptions;
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject, PDFStream};
use crate::parser::pdf_parser::{PDFParser, read_indirect_object};
use crate::utils::decode_text;
use bytes::Bytes;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// Bounded LRU of resolved objects keyed by object number.
struct ObjectCache {
    capacity: usize,
    map: IndexMap<u32, Arc<PDFObject>>,
}

impl ObjectCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: IndexMap::new(),
        }
    }

    fn get(&mut self, objid: u32) -> Option<Arc<PDFObject>> {
        let index = self.map.get_index_of(&objid)?;
        let value = Arc::clone(self.map.get_index(index)?.1);
        let last = self.map.len() - 1;
        if index != last {
            self.map.move_index(index, last);
        }
        Some(value)
    }

    fn insert(&mut self, objid: u32, value: Arc<PDFObject>) {
        if self.capacity == 0 {
            return;
        }
        self.map.shift_remove(&objid);
        self.map.insert(objid, value);
        if self.map.len() > self.capacity {
            self.map.shift_remove_index(0);
        }
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

/// Whether strings and streams are currently readable.
pub enum EncryptionState {
    Unencrypted,
    Locked(Box<dyn PDFSecurityHandler>),
    Unlocked(Box<dyn PDFSecurityHandler>),
    /// `/Encrypt` names a handler or parameters this library cannot use.
    Unsupported(String),
}

impl fmt::Debug for EncryptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unencrypted => f.write_str("Unencrypted"),
            Self::Locked(_) => f.write_str("Locked"),
            Self::Unlocked(_) => f.write_str("Unlocked"),
            Self::Unsupported(reason) => f.debug_tuple("Unsupported").field(reason).finish(),
        }
    }
}

/// A parsed PDF file. Owns its bytes; objects are resolved lazily and
/// memoized.
pub struct PDFDocument {
    data: Bytes,
    options: OpenOptions,
    xref: XRefTable,
    recovered: bool,
    catalog: HashMap<String, PDFObject>,
    cache: Mutex<ObjectCache>,
    /// Scan-based table used when an xref offset turns out to be wrong.
    recovery_index: OnceLock<Option<XRefTable>>,
    encryption: EncryptionState,
    encrypt_objid: Option<u32>,
    page_index: OnceLock<PageIndex>,
}

impl fmt::Debug for PDFDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PDFDocument")
            .field("len", &self.data.len())
            .field("objects", &self.xref.objids().len())
            .field("recovered", &self.recovered)
            .field("encryption", &self.encryption)
            .finish_non_exhaustive()
    }
}

impl PDFDocument {
    /// Open a document with default options.
    ///
    /// # Example
    /// ```no_run
    /// use quire_core::PDFDocument;
    ///
    /// let data = std::fs::read("sample.pdf").unwrap();
    /// let doc = PDFDocument::open(data).unwrap();
    /// let page = doc.get_page(0).unwrap();
    /// println!("{}", page.extract_text(&doc, "", "").unwrap());
    /// ```
    pub fn open<D: AsRef<[u8]>>(data: D) -> Result<Self> {
        Self::open_with(data, &OpenOptions::default())
    }

    pub fn open_with<D: AsRef<[u8]>>(data: D, options: &OpenOptions) -> Result<Self> {
        Self::open_bytes(Bytes::copy_from_slice(data.as_ref()), options)
    }

    /// Open without copying the buffer.
    pub fn open_bytes(data: Bytes, options: &OpenOptions) -> Result<Self> {
        let (xref, recovered) = match load_strict(&data) {
            Ok(xref) => (xref, false),
            Err(err) if options.allows_recovery() => {
                tracing::warn!(%err, "cross-reference chain unusable, scanning file");
                (XRefTable::from(rebuild_xref(&data)?), true)
            }
            Err(err) => return Err(err),
        };

        let mut doc = Self {
            data,
            options: options.clone(),
            xref,
            recovered,
            catalog: HashMap::new(),
            cache: Mutex::new(ObjectCache::new(options.cache_capacity)),
            recovery_index: OnceLock::new(),
            encryption: EncryptionState::Unencrypted,
            encrypt_objid: None,
            page_index: OnceLock::new(),
        };

        doc.init_encryption();
        match doc.load_catalog() {
            Ok(catalog) => doc.catalog = catalog,
            Err(err) if !doc.recovered && doc.options.allows_recovery() => {
                tracing::warn!(%err, "trailer /Root unresolvable, scanning file");
                doc.xref = XRefTable::from(rebuild_xref(&doc.data)?);
                doc.recovered = true;
                doc.clear_cache();
                doc.init_encryption();
                doc.catalog = doc.load_catalog()?;
            }
            Err(err) if doc.recovered => return Err(err),
            Err(err) => return Err(PdfError::BrokenXRef(format!("trailer /Root: {err}"))),
        }

        if let Some(password) = doc.options.password.clone()
            && matches!(doc.encryption, EncryptionState::Locked(_))
            && !doc.decrypt(&password)
        {
            tracing::warn!("password from OpenOptions did not unlock the document");
        }
        Ok(doc)
    }

    fn init_encryption(&mut self) {
        self.encryption = EncryptionState::Unencrypted;
        self.encrypt_objid = None;
        let Some(encrypt) = self.xref.trailer().get("Encrypt").cloned() else {
            return;
        };
        if let PDFObject::Ref(r) = &encrypt {
            self.encrypt_objid = Some(r.objid);
        }
        let docid = match self.xref.trailer().get("ID") {
            Some(PDFObject::Array(ids)) => ids
                .first()
                .and_then(|id| id.as_string().ok())
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let handler = self
            .resolve(&encrypt)
            .and_then(|obj| create_security_handler(obj.as_dict()?, &docid));
        self.encryption = match handler {
            Ok(handler) => EncryptionState::Locked(handler),
            Err(err) => {
                tracing::warn!(%err, "unsupported encryption");
                EncryptionState::Unsupported(err.to_string())
            }
        };
    }

    fn load_catalog(&self) -> Result<HashMap<String, PDFObject>> {
        let root = self
            .xref
            .trailer()
            .get("Root")
            .ok_or_else(|| PdfError::KeyError("Root".into()))?;
        let catalog = self.resolve(root)?;
        Ok(catalog.as_dict()?.clone())
    }

    fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Whether the trailer carries `/Encrypt`. Stays `true` after unlocking.
    pub fn is_encrypted(&self) -> bool {
        !matches!(self.encryption, EncryptionState::Unencrypted)
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(
            self.encryption,
            EncryptionState::Unencrypted | EncryptionState::Unlocked(_)
        )
    }

    pub const fn encryption_state(&self) -> &EncryptionState {
        &self.encryption
    }

    /// Permissions granted by `/P`, or `None` for an unencrypted file.
    pub fn permissions(&self) -> Option<Permissions> {
        match &self.encryption {
            EncryptionState::Locked(h) | EncryptionState::Unlocked(h) => Some(h.permissions()),
            _ => None,
        }
    }

    /// Unlock the document with a user or owner password.
    ///
    /// Returns `false` for a wrong password or an unsupported handler. On an
    /// unencrypted document there is nothing to unlock and `true` is
    /// returned.
    pub fn decrypt(&mut self, password: &str) -> bool {
        let state = std::mem::replace(&mut self.encryption, EncryptionState::Unencrypted);
        let (state, unlocked, changed) = match state {
            EncryptionState::Unencrypted => (EncryptionState::Unencrypted, true, false),
            EncryptionState::Unsupported(reason) => {
                (EncryptionState::Unsupported(reason), false, false)
            }
            EncryptionState::Unlocked(mut handler) => {
                let ok = handler.authenticate(password);
                (EncryptionState::Unlocked(handler), ok, false)
            }
            EncryptionState::Locked(mut handler) => {
                if handler.authenticate(password) {
                    (EncryptionState::Unlocked(handler), true, true)
                } else {
                    (EncryptionState::Locked(handler), false, false)
                }
            }
        };
        self.encryption = state;

        if changed {
            tracing::debug!("document unlocked");
            self.clear_cache();
            self.page_index = OnceLock::new();
            match self.load_catalog() {
                Ok(catalog) => self.catalog = catalog,
                Err(err) => tracing::warn!(%err, "catalog unreadable after unlocking"),
            }
        }
        unlocked
    }

    /// Resolve an object number, sharing the memoized value.
    pub fn getobj_shared(&self, objid: u32) -> Result<Arc<PDFObject>> {
        thread_local! {
            static RESOLVING: RefCell<HashSet<u32>> = RefCell::new(HashSet::new());
        }

        struct ResolvingGuard(u32);

        impl Drop for ResolvingGuard {
            fn drop(&mut self) {
                RESOLVING.with(|set| {
                    set.borrow_mut().remove(&self.0);
                });
            }
        }

        if let Ok(mut cache) = self.cache.lock()
            && let Some(obj) = cache.get(objid)
        {
            return Ok(obj);
        }

        let entered = RESOLVING.with(|set| set.borrow_mut().insert(objid));
        if !entered {
            return Err(PdfError::MalformedSyntax(format!(
                "circular reference to object {objid}"
            )));
        }
        let _guard = ResolvingGuard(objid);

        let obj = Arc::new(self.load_object(objid)?);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(objid, Arc::clone(&obj));
        }
        Ok(obj)
    }

    pub fn getobj(&self, objid: u32) -> Result<PDFObject> {
        Ok((*self.getobj_shared(objid)?).clone())
    }

    /// Follow references until a direct object is reached.
    pub fn resolve_shared(&self, obj: &PDFObject) -> Result<Arc<PDFObject>> {
        let PDFObject::Ref(first) = obj else {
            return Ok(Arc::new(obj.clone()));
        };
        let mut seen = HashSet::from([first.objid]);
        let mut current = self.getobj_ref(first)?;
        while let PDFObject::Ref(next) = &*current {
            if !seen.insert(next.objid) {
                return Err(PdfError::MalformedSyntax(format!(
                    "reference chain loops at object {}",
                    next.objid
                )));
            }
            let next = *next;
            current = self.getobj_ref(&next)?;
        }
        Ok(current)
    }

    /// Like [`getobj_shared`](Self::getobj_shared), reporting the
    /// reference's own generation when the object is missing.
    fn getobj_ref(&self, r: &PDFObjRef) -> Result<Arc<PDFObject>> {
        self.getobj_shared(r.objid).map_err(|err| match err {
            PdfError::UnresolvedReference { objid, .. } if objid == r.objid => {
                PdfError::UnresolvedReference {
                    objid,
                    genno: r.genno,
                }
            }
            other => other,
        })
    }

    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        Ok((*self.resolve_shared(obj)?).clone())
    }

    fn load_object(&self, objid: u32) -> Result<PDFObject> {
        match self.xref.get(objid) {
            Some(XRefEntry::InFile { offset, genno }) => {
                match self.read_in_file(objid, genno, offset) {
                    Ok(obj) => Ok(obj),
                    Err(err) if !self.recovered && self.options.allows_recovery() => {
                        tracing::debug!(objid, offset, %err, "xref offset is wrong, using scan");
                        self.load_recovered(objid).ok_or(err)?
                    }
                    Err(err) => Err(err),
                }
            }
            Some(XRefEntry::InStream {
                stream_objid,
                index,
            }) => self.read_in_object_stream(objid, stream_objid, index),
            Some(XRefEntry::Free) | None => {
                Err(PdfError::UnresolvedReference { objid, genno: 0 })
            }
        }
    }

    fn load_recovered(&self, objid: u32) -> Option<Result<PDFObject>> {
        let table = self
            .recovery_index
            .get_or_init(|| rebuild_xref(&self.data).ok().map(XRefTable::from))
            .as_ref()?;
        match table.get(objid)? {
            XRefEntry::InFile { offset, genno } => Some(self.read_in_file(objid, genno, offset)),
            XRefEntry::InStream {
                stream_objid,
                index,
            } => Some(self.read_in_object_stream(objid, stream_objid, index)),
            XRefEntry::Free => None,
        }
    }

    fn read_in_file(&self, objid: u32, genno: u32, offset: usize) -> Result<PDFObject> {
        let (found_id, found_gen, obj) = read_indirect_object(&self.data, offset, |r| {
            self.resolve_shared(&PDFObject::Ref(*r))
                .ok()
                .and_then(|len| len.as_int().ok())
        })?;
        if found_id != objid {
            return Err(PdfError::MalformedSyntax(format!(
                "offset {offset} holds object {found_id}, expected {objid}"
            )));
        }
        if found_gen != genno {
            tracing::debug!(objid, expected = genno, found = found_gen, "generation mismatch");
        }
        self.finish_object(obj, objid, found_gen, true)
    }

    fn read_in_object_stream(&self, objid: u32, stream_objid: u32, index: usize) -> Result<PDFObject> {
        let container = self.getobj_shared(stream_objid)?;
        let stream = container.as_stream()?;
        let data = stream.get_data()?;
        let count = stream
            .get("N")
            .ok_or_else(|| PdfError::KeyError("N".into()))?
            .as_int()?;
        let first = stream
            .get("First")
            .ok_or_else(|| PdfError::KeyError("First".into()))?
            .as_int()?;
        let first = usize::try_from(first).unwrap_or(0).min(data.len());
        let members = object_stream_index(&data[..first], usize::try_from(count).unwrap_or(0));

        let relative = match members.get(index) {
            Some(&(id, offset)) if id == objid => offset,
            _ => members
                .iter()
                .find(|(id, _)| *id == objid)
                .map(|&(_, offset)| offset)
                .ok_or(PdfError::UnresolvedReference { objid, genno: 0 })?,
        };
        let start = first.saturating_add(relative).min(data.len());
        let obj = PDFParser::new(&data[start..]).parse_object()?;
        // the container was decrypted as a whole
        self.finish_object(obj, objid, 0, false)
    }

    /// Decrypt strings and stream data, and resolve indirect filter entries.
    fn finish_object(
        &self,
        obj: PDFObject,
        objid: u32,
        genno: u32,
        decrypt: bool,
    ) -> Result<PDFObject> {
        let handler = match &self.encryption {
            EncryptionState::Unlocked(h) if decrypt && self.encrypt_objid != Some(objid) => {
                Some(h.as_ref())
            }
            _ => None,
        };
        let obj = match handler {
            Some(handler) => decrypt_strings(handler, obj, objid, genno),
            None => obj,
        };
        let PDFObject::Stream(mut stream) = obj else {
            return Ok(obj);
        };

        for key in ["Filter", "DecodeParms"] {
            if let Some(value) = stream.attrs.get(key).cloned() {
                stream.attrs.insert(key.to_string(), self.resolve_filter_entry(value)?);
            }
        }
        if let Some(handler) = handler
            && !stream.rawdata_is_decrypted()
            && stream.type_name() != Some("XRef")
        {
            match handler.decrypt_stream(objid, genno, stream.get_rawdata(), &stream.attrs) {
                Ok(plain) => stream.set_rawdata_decrypted(plain),
                Err(err) => tracing::debug!(objid, %err, "stream left encrypted"),
            }
        }
        Ok(PDFObject::Stream(stream))
    }

    fn resolve_filter_entry(&self, value: PDFObject) -> Result<PDFObject> {
        match value {
            PDFObject::Ref(_) => self.resolve_filter_entry(self.resolve(&value)?),
            PDFObject::Array(items) => items
                .into_iter()
                .map(|item| self.resolve(&item))
                .collect::<Result<Vec<_>>>()
                .map(PDFObject::Array),
            other => Ok(other),
        }
    }

    /// Decode a stream through its filter chain.
    pub fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        stream.get_data()
    }

    pub const fn catalog(&self) -> &HashMap<String, PDFObject> {
        &self.catalog
    }

    /// The merged trailer dictionary.
    pub fn trailer(&self) -> &HashMap<String, PDFObject> {
        self.xref.trailer()
    }

    /// In-use object numbers, ascending.
    pub fn object_ids(&self) -> Vec<u32> {
        self.xref.objids()
    }

    /// Whether the cross-reference table was rebuilt by scanning.
    pub const fn was_recovered(&self) -> bool {
        self.recovered
    }

    /// `/Info` entries keyed `/Name`, with text strings decoded.
    pub fn document_info(&self) -> Result<BTreeMap<String, String>> {
        let Some(info) = self.xref.trailer().get("Info") else {
            return Ok(BTreeMap::new());
        };
        let info = self.resolve_shared(info)?;
        let mut out = BTreeMap::new();
        for (key, value) in info.as_dict()? {
            let value = self.resolve_shared(value)?;
            out.insert(format!("/{key}"), render_value(&value));
        }
        Ok(out)
    }

    pub(crate) fn page_index(&self) -> &PageIndex {
        self.page_index.get_or_init(|| PageIndex::new(self))
    }

    pub fn page_count(&self) -> usize {
        self.page_index().len()
    }

    /// The `index`th page in document order.
    pub fn get_page(&self, index: usize) -> Result<PDFPage> {
        let pages = self.page_index();
        let entry = pages.get(index).ok_or(PdfError::PageOutOfRange {
            index,
            count: pages.len(),
        })?;
        PDFPage::from_entry(self, entry)
    }
}

fn load_strict(data: &Bytes) -> Result<XRefTable> {
    let start = find_startxref(data)?;
    let table = load_chain(data, start)?;
    if table.is_empty() {
        return Err(PdfError::BrokenXRef("empty cross-reference table".into()));
    }
    if !table.trailer().contains_key("Root") {
        return Err(PdfError::BrokenXRef("trailer has no /Root".into()));
    }
    Ok(table)
}

fn decrypt_strings(
    handler: &dyn PDFSecurityHandler,
    obj: PDFObject,
    objid: u32,
    genno: u32,
) -> PDFObject {
    match obj {
        PDFObject::String(data) => match handler.decrypt_string(objid, genno, &data) {
            Ok(plain) => PDFObject::String(plain),
            Err(err) => {
                tracing::debug!(objid, %err, "string left encrypted");
                PDFObject::String(data)
            }
        },
        PDFObject::Array(items) => PDFObject::Array(
            items
                .into_iter()
                .map(|item| decrypt_strings(handler, item, objid, genno))
                .collect(),
        ),
        PDFObject::Dict(dict) => PDFObject::Dict(
            dict.into_iter()
                .map(|(k, v)| (k, decrypt_strings(handler, v, objid, genno)))
                .collect(),
        ),
        PDFObject::Stream(mut stream) => {
            let attrs = std::mem::take(&mut stream.attrs);
            stream.attrs = attrs
                .into_iter()
                .map(|(k, v)| (k, decrypt_strings(handler, v, objid, genno)))
                .collect();
            PDFObject::Stream(stream)
        }
        other => other,
    }
}

/// Render an `/Info` value: text strings decoded, everything else in PDF
/// syntax.
fn render_value(obj: &PDFObject) -> String {
    match obj {
        PDFObject::String(s) => decode_text(s),
        PDFObject::Null => "null".into(),
        PDFObject::Bool(b) => b.to_string(),
        PDFObject::Int(n) => n.to_string(),
        PDFObject::Real(x) => format_real(*x),
        PDFObject::Name(name) => format!("/{name}"),
        PDFObject::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", parts.join(" "))
        }
        PDFObject::Dict(dict) => {
            let mut keys: Vec<&String> = dict.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("/{k} {}", render_value(&dict[k])))
                .collect();
            format!("<<{}>>", parts.join(" "))
        }
        PDFObject::Stream(_) => "<stream>".into(),
        PDFObject::Ref(PDFObjRef { objid, genno }) => format!("{objid} {genno} R"),
    }
}

fn format_real(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}
