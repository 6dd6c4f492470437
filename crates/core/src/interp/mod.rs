//! Content stream interpretation and device output.
//!
//! - `interpreter`: page interpreter
//! - `device`: device trait and the text and image devices
//! - `ops`: operator implementations by category

pub mod device;
pub mod interpreter;
mod ops;

pub use device::{
    ImageCollector, PDFDevice, PageImage, TextExtractor, TextOp, TextRun, TextRunCollector,
};
pub use interpreter::PDFPageInterpreter;
