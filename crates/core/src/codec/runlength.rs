//! RunLength stream decoder.

use crate::error::Result;

/// Decode RunLength-encoded data.
///
/// - length 0-127: copy the next (length + 1) bytes literally
/// - length 128: end of data
/// - length 129-255: repeat the next byte (257 - length) times
///
/// Truncated input stops decoding without an error.
pub fn rldecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while let Some(&length) = data.get(i) {
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let end = (i + length as usize + 1).min(data.len());
                result.extend_from_slice(&data[i..end]);
                i = end;
            }
            129..=255 => {
                let Some(&byte) = data.get(i) else { break };
                i += 1;
                result.extend(std::iter::repeat_n(byte, 257 - length as usize));
            }
        }
    }

    Ok(result)
}
