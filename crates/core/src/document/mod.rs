//! Document structure: cross-references, objects, pages and security.
//!
//! - `xref` - cross-reference tables and streams
//! - `repair` - rebuilding the table by scanning the file
//! - `catalog` - `PDFDocument`, object resolution and decryption state
//! - `page` - page tree and `PDFPage`
//! - `security` - standard security handler
//! - `saslprep` - RFC 4013 password preparation

pub mod catalog;
pub mod page;
pub mod repair;
pub mod saslprep;
pub mod security;
pub mod xref;

pub use catalog::{EncryptionState, PDFDocument};
pub use page::PDFPage;
pub use security::{Permissions, PDFSecurityHandler, create_security_handler};
