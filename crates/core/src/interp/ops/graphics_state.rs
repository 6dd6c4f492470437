//! Graphics state operators.
//!
//! Handles: q, Q, cm

use crate::interp::device::PDFDevice;
use crate::interp::interpreter::PDFPageInterpreter;
use crate::utils::mult_matrix;

#[allow(non_snake_case)]
impl<D: PDFDevice> PDFPageInterpreter<'_, D> {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.gstack.push(self.get_current_state());
    }

    /// Restores the graphics state from the stack. An unbalanced `Q` is
    /// ignored.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        if let Some(state) = self.gstack.pop() {
            self.set_current_state(state);
        }
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.ctm = mult_matrix((a, b, c, d, e, f), self.ctm);
    }
}
