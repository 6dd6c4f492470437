//! FlateDecode (zlib / deflate) decoder.

use crate::error::{PdfError, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Inflate a zlib stream.
///
/// A corrupt or truncated tail keeps whatever was inflated before it. Data
/// without a zlib header is retried as raw deflate.
pub fn flatedecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let zlib_err = match ZlibDecoder::new(data).read_to_end(&mut result) {
        Ok(_) => return Ok(result),
        Err(e) => e,
    };
    if !result.is_empty() {
        tracing::debug!(inflated = result.len(), "flate stream truncated: {zlib_err}");
        return Ok(result);
    }

    result.clear();
    match DeflateDecoder::new(data).read_to_end(&mut result) {
        Ok(_) => Ok(result),
        Err(_) if !result.is_empty() => Ok(result),
        Err(_) => Err(PdfError::DecodeError(format!("Flate: {zlib_err}"))),
    }
}
