//! Codec modules for PDF stream decoding and encryption.
//!
//! - `aes`, `arcfour`: ciphers used by the security handler
//! - `ascii85`, `flate`, `lzw`, `runlength`: stream decoders
//! - `predictor`: PNG / TIFF predictors
//! - `filters`: the `/Filter` pipeline

pub mod aes;
pub mod arcfour;
pub mod ascii85;
pub mod filters;
pub mod flate;
pub mod lzw;
pub mod predictor;
pub mod runlength;

pub use aes::{aes_cbc_decrypt, aes_cbc_encrypt, unpad_aes};
pub use arcfour::Arcfour;
pub use ascii85::{ascii85decode, asciihexdecode};
pub use filters::{StreamFilter, decode_stream_data};
pub use flate::flatedecode;
pub use lzw::{lzwdecode, lzwdecode_with_earlychange};
pub use runlength::rldecode;
