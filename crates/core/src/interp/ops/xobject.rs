//! XObject and inline image operators.
//!
//! Handles: Do, EI
//!
//! - Do: paint a named XObject. Forms are executed with their own
//!   resources; images go to the device.
//! - EI: paint an inline image (`BI ... ID ... EI`, already collected by the
//!   content parser).

use std::collections::HashMap;

use crate::interp::device::PDFDevice;
use crate::interp::interpreter::PDFPageInterpreter;
use crate::model::objects::{PDFObject, PDFStream};
use crate::model::state::PDFGraphicState;
use crate::utils::{MATRIX_IDENTITY, Matrix, mult_matrix};

/// Forms nested deeper than this are not executed.
const MAX_FORM_DEPTH: usize = 32;

/// Interpreter state saved around a form XObject.
struct SavedState {
    gstack: Vec<PDFGraphicState>,
    current: PDFGraphicState,
    resources: HashMap<String, PDFObject>,
}

#[allow(non_snake_case)]
impl<D: PDFDevice> PDFPageInterpreter<'_, D> {
    /// Do - Invoke the XObject named `xobjid` in the current resources.
    pub fn do_Do(&mut self, xobjid: &str) {
        let doc = self.doc;
        let Some(entry) = self
            .resources
            .get("XObject")
            .and_then(|x| doc.resolve_shared(x).ok())
            .and_then(|x| x.as_dict().ok()?.get(xobjid).cloned())
        else {
            tracing::debug!(xobjid, "undefined XObject");
            return;
        };
        let objid = entry.as_ref().ok().map(|r| r.objid);
        let xobj = match doc.resolve_shared(&entry) {
            Ok(xobj) => xobj,
            Err(err) => {
                tracing::debug!(xobjid, %err, "unreadable XObject");
                return;
            }
        };
        let Ok(stream) = xobj.as_stream() else {
            return;
        };

        match stream.get("Subtype").and_then(|s| s.as_name().ok()) {
            Some("Form") => self.render_form(xobjid, objid, stream),
            Some("Image") => self.device.render_image(xobjid, stream, self.ctm),
            other => tracing::debug!(xobjid, subtype = ?other, "ignoring XObject"),
        }
    }

    /// EI - Paint an inline image.
    pub fn do_EI(&mut self, stream: &PDFStream) {
        let name = format!("inline-{}", self.inline_image_count);
        self.inline_image_count += 1;
        self.device.render_image(&name, stream, self.ctm);
    }

    fn render_form(&mut self, xobjid: &str, objid: Option<u32>, stream: &PDFStream) {
        if self.form_stack.len() >= MAX_FORM_DEPTH {
            tracing::debug!(xobjid, "form nesting too deep");
            return;
        }
        if objid.is_some() && self.form_stack.contains(&objid) {
            tracing::debug!(xobjid, "skipping recursive form");
            return;
        }
        let data = match stream.get_data() {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(xobjid, %err, "form content undecodable");
                return;
            }
        };
        let matrix = parse_matrix(stream.get("Matrix"));
        let resources = stream
            .get("Resources")
            .and_then(|r| self.doc.resolve(r).ok())
            .and_then(|r| r.as_dict().ok().cloned())
            .unwrap_or_else(|| self.resources.clone());

        let saved = SavedState {
            gstack: std::mem::take(&mut self.gstack),
            current: self.get_current_state(),
            resources: std::mem::take(&mut self.resources),
        };
        self.form_stack.push(objid);
        self.device.begin_figure(xobjid, matrix);

        let form_ctm = mult_matrix(matrix, self.ctm);
        self.render_contents(resources, &data, form_ctm);

        self.device.end_figure(xobjid);
        self.form_stack.pop();
        self.gstack = saved.gstack;
        self.set_current_state(saved.current);
        self.resources = saved.resources;
    }
}

fn parse_matrix(obj: Option<&PDFObject>) -> Matrix {
    let Some(PDFObject::Array(items)) = obj else {
        return MATRIX_IDENTITY;
    };
    let nums: Vec<f64> = items.iter().filter_map(|v| v.as_num().ok()).collect();
    match nums[..] {
        [a, b, c, d, e, f] => (a, b, c, d, e, f),
        _ => MATRIX_IDENTITY,
    }
}
