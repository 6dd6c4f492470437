//! Page interpreter: executes content streams against a [`PDFDevice`].
//!
//! Operators are grouped into `impl` blocks under `interp::ops`. Only the
//! operators that affect text placement, the graphics state stack and
//! painted XObjects are interpreted; everything else is ignored.

use crate::document::catalog::PDFDocument;
use crate::document::page::PDFPage;
use crate::error::Result;
use crate::interp::device::PDFDevice;
use crate::model::objects::PDFObject;
use crate::model::state::{PDFGraphicState, PDFTextState};
use crate::parser::content::{Operation, PDFContentParser};
use crate::parser::lexer::Keyword;
use crate::utils::{MATRIX_IDENTITY, Matrix};
use std::collections::HashMap;

/// Executes page content, reporting text and images to a device.
///
/// Method names like `do_Q` and `do_Tj` keep the operator's case.
pub struct PDFPageInterpreter<'a, D: PDFDevice> {
    pub(crate) doc: &'a PDFDocument,
    pub(crate) device: &'a mut D,
    /// Saved states for `q`/`Q`
    pub(crate) gstack: Vec<PDFGraphicState>,
    pub(crate) ctm: Matrix,
    pub(crate) textstate: PDFTextState,
    /// Resources of the page or of the form being executed
    pub(crate) resources: HashMap<String, PDFObject>,
    /// Object numbers of the forms currently executing
    pub(crate) form_stack: Vec<Option<u32>>,
    pub(crate) inline_image_count: usize,
}

#[allow(non_snake_case)]
impl<'a, D: PDFDevice> PDFPageInterpreter<'a, D> {
    pub fn new(doc: &'a PDFDocument, device: &'a mut D) -> Self {
        Self {
            doc,
            device,
            gstack: Vec::new(),
            ctm: MATRIX_IDENTITY,
            textstate: PDFTextState::new(),
            resources: HashMap::new(),
            form_stack: Vec::new(),
            inline_image_count: 0,
        }
    }

    pub fn init_state(&mut self, ctm: Matrix) {
        self.gstack.clear();
        self.ctm = ctm;
        self.textstate = PDFTextState::new();
    }

    pub const fn ctm(&self) -> Matrix {
        self.ctm
    }

    pub const fn textstate(&self) -> &PDFTextState {
        &self.textstate
    }

    pub(crate) fn get_current_state(&self) -> PDFGraphicState {
        PDFGraphicState {
            ctm: self.ctm,
            textstate: self.textstate.clone(),
        }
    }

    pub(crate) fn set_current_state(&mut self, state: PDFGraphicState) {
        self.ctm = state.ctm;
        self.textstate = state.textstate;
    }

    /// Interpret the page's content streams.
    pub fn process_page(&mut self, page: &PDFPage) -> Result<()> {
        let [x0, y0, x1, y1] = page.mediabox();
        let ctm = match page.rotation() {
            90 => (0.0, -1.0, 1.0, 0.0, -y0, x1),
            180 => (-1.0, 0.0, 0.0, -1.0, x1, y1),
            270 => (0.0, 1.0, -1.0, 0.0, y1, -x0),
            _ => (1.0, 0.0, 0.0, 1.0, -x0, -y0),
        };

        let data = page.content_data(self.doc)?;
        self.device.begin_page(page.pageid, page.mediabox_rect(), ctm);
        self.render_contents(page.resources.clone(), &data, ctm);
        self.device.end_page(page.pageid);
        Ok(())
    }

    /// Execute `data` with `resources` starting from a fresh state at `ctm`.
    pub fn render_contents(&mut self, resources: HashMap<String, PDFObject>, data: &[u8], ctm: Matrix) {
        self.resources = resources;
        self.init_state(ctm);
        self.execute(&PDFContentParser::parse(data));
    }

    pub fn execute(&mut self, ops: &[Operation]) {
        for op in ops {
            let mut args = op.operands.clone();
            self.dispatch_operator(&op.operator, &mut args);
        }
    }

    fn dispatch_operator(&mut self, op: &Keyword, args: &mut Vec<PDFObject>) {
        match op {
            Keyword::Qq => self.do_q(),
            Keyword::Q => self.do_Q(),
            Keyword::Cm => {
                if let Some((a, b, c, d, e, f)) = Self::pop_matrix(args) {
                    self.do_cm(a, b, c, d, e, f);
                }
            }

            Keyword::BT => self.do_BT(),
            Keyword::ET => self.do_ET(),
            Keyword::Tc => {
                if let Some(n) = Self::pop_number(args) {
                    self.do_Tc(n);
                }
            }
            Keyword::Tw => {
                if let Some(n) = Self::pop_number(args) {
                    self.do_Tw(n);
                }
            }
            Keyword::Tz => {
                if let Some(n) = Self::pop_number(args) {
                    self.do_Tz(n);
                }
            }
            Keyword::TL => {
                if let Some(n) = Self::pop_number(args) {
                    self.do_TL(n);
                }
            }
            Keyword::Tf => {
                let size = Self::pop_number(args).unwrap_or(0.0);
                let name = Self::pop_name(args).unwrap_or_default();
                self.do_Tf(&name, size);
            }
            Keyword::Tr => {
                if let Some(n) = Self::pop_number(args) {
                    self.do_Tr(n as i32);
                }
            }
            Keyword::Ts => {
                if let Some(n) = Self::pop_number(args) {
                    self.do_Ts(n);
                }
            }
            Keyword::Td => {
                if let Some((x, y)) = Self::pop_point(args) {
                    self.do_Td(x, y);
                }
            }
            Keyword::TD => {
                if let Some((x, y)) = Self::pop_point(args) {
                    self.do_TD(x, y);
                }
            }
            Keyword::Tm => {
                if let Some((a, b, c, d, e, f)) = Self::pop_matrix(args) {
                    self.do_Tm(a, b, c, d, e, f);
                }
            }
            Keyword::TStar => self.do_T_star(),
            Keyword::Tj => {
                if let Some(s) = Self::pop_string(args) {
                    self.do_Tj(&s);
                }
            }
            Keyword::TJ => {
                if let Some(seq) = Self::pop_array(args) {
                    self.do_TJ(&seq);
                }
            }
            Keyword::Quote => {
                let s = Self::pop_string(args);
                self.do_quote(s.as_deref());
            }
            Keyword::DoubleQuote => {
                let s = Self::pop_string(args);
                let ac = Self::pop_number(args).unwrap_or(0.0);
                let aw = Self::pop_number(args).unwrap_or(0.0);
                self.do_doublequote(aw, ac, s.as_deref());
            }

            Keyword::Do => {
                if let Some(name) = Self::pop_name(args) {
                    self.do_Do(&name);
                }
            }
            Keyword::EI => {
                if let Some(PDFObject::Stream(stream)) = args.pop() {
                    self.do_EI(&stream);
                }
            }
            _ => {}
        }
    }

    fn pop_number(args: &mut Vec<PDFObject>) -> Option<f64> {
        args.pop().and_then(|obj| obj.as_num().ok())
    }

    fn pop_string(args: &mut Vec<PDFObject>) -> Option<Vec<u8>> {
        args.pop().and_then(|obj| match obj {
            PDFObject::String(s) => Some(s),
            _ => None,
        })
    }

    fn pop_name(args: &mut Vec<PDFObject>) -> Option<String> {
        args.pop().and_then(|obj| match obj {
            PDFObject::Name(s) => Some(s),
            _ => None,
        })
    }

    fn pop_array(args: &mut Vec<PDFObject>) -> Option<Vec<PDFObject>> {
        args.pop().and_then(|obj| match obj {
            PDFObject::Array(items) => Some(items),
            _ => None,
        })
    }

    fn pop_point(args: &mut Vec<PDFObject>) -> Option<(f64, f64)> {
        if args.len() < 2 {
            return None;
        }
        let y = Self::pop_number(args)?;
        let x = Self::pop_number(args)?;
        Some((x, y))
    }

    pub(crate) fn pop_matrix(args: &mut Vec<PDFObject>) -> Option<Matrix> {
        if args.len() < 6 {
            return None;
        }
        let f = Self::pop_number(args)?;
        let e = Self::pop_number(args)?;
        let d = Self::pop_number(args)?;
        let c = Self::pop_number(args)?;
        let b = Self::pop_number(args)?;
        let a = Self::pop_number(args)?;
        Some((a, b, c, d, e, f))
    }
}
