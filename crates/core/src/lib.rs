//! quire - parse, decrypt and extract content from PDF documents.
//!
//! ```no_run
//! use quire_core::{OpenOptions, PDFDocument};
//!
//! let data = std::fs::read("secret.pdf").unwrap();
//! let doc = PDFDocument::open_with(data, &OpenOptions::new().password("foo")).unwrap();
//! for index in 0..doc.page_count() {
//!     let page = doc.get_page(index).unwrap();
//!     print!("{}", page.extract_text(&doc, "", "").unwrap());
//! }
//! ```

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod interp;
pub mod model;
pub mod parser;
pub mod utils;

pub use config::{OpenOptions, RecoveryPolicy};
pub use document::{PDFDocument, PDFPage, Permissions};
pub use error::{PdfError, Result};
pub use interp::{PageImage, TextRun};
pub use model::{PDFObjRef, PDFObject, PDFStream};
