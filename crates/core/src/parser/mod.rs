//! PDF parsing modules.
//!
//! - `lexer`: tokenizer
//! - `pdf_parser`: object parser and indirect object reader
//! - `content`: content stream operations

pub mod content;
pub mod lexer;
pub mod pdf_parser;

pub use content::{Operation, PDFContentParser};
pub use lexer::{Keyword, PSBaseParser, PSToken};
pub use pdf_parser::PDFParser;
