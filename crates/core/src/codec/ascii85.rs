//! ASCII85 and ASCIIHex stream decoders.

use crate::error::{PdfError, Result};

const fn is_ascii_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\x00')
}

/// Decode ASCII85-encoded data (PDF variant).
///
/// Handles `z` groups, the optional `<~` prefix, whitespace and a missing
/// `~>` end marker.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let data = match data.iter().position(|&b| b == b'~') {
        Some(pos) => &data[..pos],
        None => data,
    };

    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut n = 0;

    for (pos, &byte) in data.iter().enumerate() {
        match byte {
            b if is_ascii_ws(b) => continue,
            b'z' if n == 0 => {
                result.extend_from_slice(&[0; 4]);
                continue;
            }
            b'!'..=b'u' => {
                group[n] = byte - b'!';
                n += 1;
            }
            other => {
                return Err(PdfError::DecodeError(format!(
                    "ASCII85: invalid character {:?} at {pos}",
                    other as char
                )));
            }
        }
        if n == 5 {
            result.extend_from_slice(&group_value(&group)?.to_be_bytes());
            n = 0;
        }
    }

    match n {
        0 => {}
        1 => return Err(PdfError::DecodeError("ASCII85: dangling final byte".into())),
        _ => {
            group[n..].fill(b'u' - b'!');
            let bytes = group_value(&group)?.to_be_bytes();
            result.extend_from_slice(&bytes[..n - 1]);
        }
    }

    Ok(result)
}

fn group_value(group: &[u8; 5]) -> Result<u32> {
    let value = group.iter().fold(0u64, |acc, &d| acc * 85 + d as u64);
    u32::try_from(value).map_err(|_| PdfError::DecodeError("ASCII85: group overflow".into()))
}

/// Decode ASCIIHex-encoded data. Stops at `>`; an odd final digit is
/// padded with 0.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;

    for (pos, &byte) in data.iter().enumerate() {
        let nibble = match byte {
            b'>' => break,
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b if is_ascii_ws(b) => continue,
            other => {
                return Err(PdfError::DecodeError(format!(
                    "ASCIIHex: invalid character {:?} at {pos}",
                    other as char
                )));
            }
        };
        match pending.take() {
            Some(high) => result.push((high << 4) | nibble),
            None => pending = Some(nibble),
        }
    }

    if let Some(high) = pending {
        result.push(high << 4);
    }

    Ok(result)
}
