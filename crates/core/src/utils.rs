//! Miscellaneous routines: matrix arithmetic and PDF text-string decoding.

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1).
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: result = m1 * m0.
/// This applies m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Moves the origin of `m` to `v`, expressed in `m`'s own coordinates.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Unpacks a big-endian unsigned integer of arbitrary width.
pub fn nunpack(s: &[u8], default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// PDFDocEncoding 0x18..=0x1F (spacing diacritics).
const PDF_DOC_DIACRITICS: [u16; 8] = [
    0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC,
];

/// PDFDocEncoding 0x80..=0x9E.
const PDF_DOC_HIGH: [u16; 31] = [
    0x2022, 0x2020, 0x2021, 0x2026, 0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203A, 0x2212,
    0x2030, 0x201E, 0x201C, 0x201D, 0x2018, 0x2019, 0x201A, 0x2122, 0xFB01, 0xFB02, 0x0141,
    0x0152, 0x0160, 0x0178, 0x017D, 0x0131, 0x0142, 0x0153, 0x0161, 0x017E,
];

/// Maps one PDFDocEncoding byte to a char. `None` for undefined code points.
fn pdf_doc_char(b: u8) -> Option<char> {
    let code = match b {
        0x18..=0x1F => PDF_DOC_DIACRITICS[(b - 0x18) as usize] as u32,
        0x7F | 0x9F | 0xAD => return None,
        0x80..=0x9E => PDF_DOC_HIGH[(b - 0x80) as usize] as u32,
        0xA0 => 0x20AC,
        _ => b as u32,
    };
    char::from_u32(code)
}

fn utf16be_units(s: &[u8]) -> Vec<u16> {
    s.chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// Decodes a PDF text string to Unicode, never failing.
///
/// UTF-16BE (with BOM) and UTF-8 (with BOM) are honoured; everything else is
/// PDFDocEncoding, where undefined bytes fall back to their Latin-1 value.
pub fn decode_text(s: &[u8]) -> String {
    if let Some(rest) = s.strip_prefix(&[0xFE, 0xFF]) {
        return String::from_utf16_lossy(&utf16be_units(rest));
    }
    if let Some(rest) = s.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    s.iter()
        .map(|&b| pdf_doc_char(b).unwrap_or(b as char))
        .collect()
}

/// Decodes a string only if it is a genuine text string.
///
/// Returns `None` for byte strings: invalid UTF-16, or PDFDocEncoding bytes
/// that are undefined or control characters other than TAB, LF, FF and CR.
pub fn decode_text_strict(s: &[u8]) -> Option<String> {
    if let Some(rest) = s.strip_prefix(&[0xFE, 0xFF]) {
        if rest.len() % 2 != 0 {
            return None;
        }
        return String::from_utf16(&utf16be_units(rest)).ok();
    }
    if let Some(rest) = s.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).ok();
    }
    s.iter()
        .map(|&b| match b {
            b'\t' | b'\n' | 0x0C | b'\r' => Some(b as char),
            0x00..=0x17 => None,
            _ => pdf_doc_char(b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mult_matrix_applies_first_then_second() {
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = (1.0, 0.0, 0.0, 1.0, 10.0, 5.0);
        assert_eq!(mult_matrix(scale, shift), (2.0, 0.0, 0.0, 2.0, 10.0, 5.0));
        assert_eq!(mult_matrix(shift, scale), (2.0, 0.0, 0.0, 2.0, 20.0, 10.0));
    }

    #[test]
    fn translate_and_apply() {
        let m = translate_matrix(MATRIX_IDENTITY, (3.0, 4.0));
        assert_eq!(apply_matrix_pt(m, (1.0, 1.0)), (4.0, 5.0));
    }

    #[test]
    fn nunpack_big_endian() {
        assert_eq!(nunpack(&[], 7), 7);
        assert_eq!(nunpack(&[0x01, 0x02], 0), 0x0102);
        assert_eq!(nunpack(&[0x00, 0x00, 0x10, 0x00], 0), 4096);
    }

    #[test]
    fn decode_text_pdfdoc_and_utf16() {
        assert_eq!(decode_text(b"Hello"), "Hello");
        assert_eq!(decode_text(&[0x80, 0x92]), "\u{2022}\u{2122}");
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x41, 0x04, 0x14]), "A\u{0414}");
    }

    #[test]
    fn strict_decoding_rejects_byte_strings() {
        assert_eq!(decode_text_strict(b"line\n").as_deref(), Some("line\n"));
        assert_eq!(decode_text_strict(&[0x01, 0x41]), None);
        assert_eq!(decode_text_strict(&[0x41, 0x7F]), None);
        assert_eq!(decode_text_strict(&[0xFE, 0xFF, 0x00]), None);
        assert_eq!(decode_text_strict(&[0xA0]).as_deref(), Some("\u{20AC}"));
    }
}
