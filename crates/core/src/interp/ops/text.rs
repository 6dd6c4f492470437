//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', "
//!
//! Positioning operators update the text matrix; showing operators hand
//! their strings to the device. Glyph widths are not known here, so the
//! text matrix does not advance while showing.

use crate::interp::device::{PDFDevice, TextOp};
use crate::interp::interpreter::PDFPageInterpreter;
use crate::model::objects::PDFObject;
use crate::utils::translate_matrix;

#[allow(non_snake_case)]
impl<D: PDFDevice> PDFPageInterpreter<'_, D> {
    /// BT - Begin text object. Resets the text and line matrices.
    pub const fn do_BT(&mut self) {
        self.textstate.reset();
    }

    /// ET - End text object.
    pub const fn do_ET(&mut self) {}

    pub const fn do_Tc(&mut self, charspace: f64) {
        self.textstate.charspace = charspace;
    }

    pub const fn do_Tw(&mut self, wordspace: f64) {
        self.textstate.wordspace = wordspace;
    }

    /// Tz - Horizontal scaling, in percent.
    pub const fn do_Tz(&mut self, scaling: f64) {
        self.textstate.scaling = scaling;
    }

    /// TL - Set text leading. Stored negated so `T*` can add it directly.
    pub fn do_TL(&mut self, leading: f64) {
        self.textstate.leading = -leading;
    }

    /// Tf - Select font resource `fontid` at `fontsize`.
    pub fn do_Tf(&mut self, fontid: &str, fontsize: f64) {
        self.textstate.fontname = Some(fontid.to_string());
        self.textstate.fontsize = fontsize;
    }

    pub const fn do_Tr(&mut self, render: i32) {
        self.textstate.render = render;
    }

    pub const fn do_Ts(&mut self, rise: f64) {
        self.textstate.rise = rise;
    }

    /// Td - Move to the start of the next line, offset by (tx, ty).
    pub fn do_Td(&mut self, tx: f64, ty: f64) {
        self.textstate.matrix = translate_matrix(self.textstate.matrix, (tx, ty));
        self.textstate.linematrix = (0.0, 0.0);
    }

    /// TD - Like Td, and sets the leading to `ty`.
    pub fn do_TD(&mut self, tx: f64, ty: f64) {
        self.do_Td(tx, ty);
        self.textstate.leading = ty;
    }

    pub const fn do_Tm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.textstate.matrix = (a, b, c, d, e, f);
        self.textstate.linematrix = (0.0, 0.0);
    }

    fn next_line(&mut self) {
        self.textstate.matrix = translate_matrix(self.textstate.matrix, (0.0, self.textstate.leading));
        self.textstate.linematrix = (0.0, 0.0);
    }

    /// T* - Move to the start of the next line using the leading.
    pub fn do_T_star(&mut self) {
        self.next_line();
        self.device
            .render_text(TextOp::NextLine, &self.textstate, self.ctm);
    }

    /// Tj - Show a string.
    pub fn do_Tj(&mut self, s: &[u8]) {
        self.device.render_text(TextOp::Show(s), &self.textstate, self.ctm);
    }

    /// TJ - Show strings with individual positioning adjustments.
    pub fn do_TJ(&mut self, seq: &[PDFObject]) {
        self.device
            .render_text(TextOp::ShowArray(seq), &self.textstate, self.ctm);
    }

    /// ' - Move to the next line and show a string.
    pub fn do_quote(&mut self, s: Option<&[u8]>) {
        self.next_line();
        self.device
            .render_text(TextOp::NextLineShow(s), &self.textstate, self.ctm);
    }

    /// " - Set word and character spacing, move to the next line and show
    /// a string.
    pub fn do_doublequote(&mut self, aw: f64, ac: f64, s: Option<&[u8]>) {
        self.do_Tw(aw);
        self.do_Tc(ac);
        self.next_line();
        self.device
            .render_text(TextOp::SpacedShow(s), &self.textstate, self.ctm);
    }
}
