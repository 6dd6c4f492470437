//! LZW stream decoder using the weezl crate.

use crate::error::{PdfError, Result};
use weezl::{BitOrder, decode::Decoder};

/// Decode LZW-encoded data (PDF variant: MSB first, 8-bit, EarlyChange 1).
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_earlychange(data, 1)
}

/// Decode LZW-encoded data with an explicit `/EarlyChange`.
///
/// EarlyChange=1 is the PDF default; EarlyChange=0 switches code size late,
/// like TIFF. A corrupt tail yields the bytes decoded before it.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i64) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    let result = decoder.into_vec(&mut output).decode(data);
    if let Err(e) = result.status {
        if output.is_empty() {
            return Err(PdfError::DecodeError(format!("LZW: {e}")));
        }
        tracing::debug!(decoded = output.len(), "LZW stream truncated: {e}");
    }
    Ok(output)
}
