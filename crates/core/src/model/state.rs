//! Text and graphics state tracked while interpreting content streams.

use crate::utils::{MATRIX_IDENTITY, Matrix, Point};

/// PDF Text State - text positioning and rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFTextState {
    /// Current font resource name (e.g., "F1")
    pub fontname: Option<String>,
    pub fontsize: f64,
    pub charspace: f64,
    pub wordspace: f64,
    /// Horizontal scaling percentage (100 = normal)
    pub scaling: f64,
    pub leading: f64,
    /// Text rendering mode (0-7)
    pub render: i32,
    pub rise: f64,
    /// Text matrix (Tm)
    pub matrix: Matrix,
    /// Start of the current line, in text space
    pub linematrix: Point,
}

impl PDFTextState {
    pub const fn new() -> Self {
        Self {
            fontname: None,
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            render: 0,
            rise: 0.0,
            matrix: MATRIX_IDENTITY,
            linematrix: (0.0, 0.0),
        }
    }

    /// Reset text matrix and line matrix. Called on `BT`.
    pub const fn reset(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.linematrix = (0.0, 0.0);
    }
}

impl Default for PDFTextState {
    fn default() -> Self {
        Self::new()
    }
}

/// Graphics state saved by `q` and restored by `Q`.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFGraphicState {
    /// Current transformation matrix
    pub ctm: Matrix,
    pub textstate: PDFTextState,
}

impl PDFGraphicState {
    pub const fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            textstate: PDFTextState::new(),
        }
    }
}

impl Default for PDFGraphicState {
    fn default() -> Self {
        Self::new(MATRIX_IDENTITY)
    }
}
