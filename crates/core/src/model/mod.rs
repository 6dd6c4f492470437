//! PDF model types.
//!
//! - `objects` - PDF object types (PDFObject, PDFStream, PDFObjRef)
//! - `state` - text and graphics state (PDFTextState, PDFGraphicState)

pub mod objects;
pub mod state;

pub use objects::{PDFObjRef, PDFObject, PDFStream};
pub use state::{PDFGraphicState, PDFTextState};
