//! SASLprep (RFC 4013) for revision 6 passwords.
//!
//! Implements the "query" profile: unassigned code points are let through,
//! everything RFC 4013 section 2.3 prohibits is rejected.

use unicode_normalization::UnicodeNormalization;

use crate::error::{PdfError, Result};

type Ranges = &'static [(u32, u32)];

/// B.1: mapped to nothing.
const MAPPED_TO_NOTHING: Ranges = &[
    (0x00AD, 0x00AD),
    (0x034F, 0x034F),
    (0x1806, 0x1806),
    (0x180B, 0x180D),
    (0x200B, 0x200D),
    (0x2060, 0x2060),
    (0xFE00, 0xFE0F),
    (0xFEFF, 0xFEFF),
];

/// C.1.2: non-ASCII spaces, mapped to U+0020.
const NON_ASCII_SPACE: Ranges = &[
    (0x00A0, 0x00A0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
];

/// C.2.1 through C.9.
const PROHIBITED: Ranges = &[
    (0x0000, 0x001F),
    (0x007F, 0x009F),
    (0x0340, 0x0341),
    (0x06DD, 0x06DD),
    (0x070F, 0x070F),
    (0x180E, 0x180E),
    (0x200C, 0x200F),
    (0x2028, 0x202E),
    (0x2060, 0x2063),
    (0x206A, 0x206F),
    (0x2FF0, 0x2FFB),
    (0xD800, 0xDFFF),
    (0xE000, 0xF8FF),
    (0xFDD0, 0xFDEF),
    (0xFEFF, 0xFEFF),
    (0xFFF9, 0xFFFF),
    (0x1D173, 0x1D17A),
    (0xE0001, 0xE0001),
    (0xE0020, 0xE007F),
    (0xF0000, 0xFFFFD),
    (0x100000, 0x10FFFD),
];

/// D.1: bidi classes R and AL (main right-to-left blocks).
const RAND_AL_CAT: Ranges = &[
    (0x05BE, 0x05BE),
    (0x05C0, 0x05C0),
    (0x05C3, 0x05C3),
    (0x05D0, 0x05EA),
    (0x05F0, 0x05F4),
    (0x061B, 0x061B),
    (0x061F, 0x061F),
    (0x0621, 0x063A),
    (0x0640, 0x064A),
    (0x066D, 0x066F),
    (0x0671, 0x06D5),
    (0x06DD, 0x06DD),
    (0x06E5, 0x06E6),
    (0x06FA, 0x06FE),
    (0x0700, 0x070D),
    (0x0710, 0x0710),
    (0x0712, 0x072C),
    (0x0780, 0x07A5),
    (0x07B1, 0x07B1),
    (0x200F, 0x200F),
    (0xFB1D, 0xFB1D),
    (0xFB1F, 0xFB28),
    (0xFB2A, 0xFBB1),
    (0xFBD3, 0xFD3D),
    (0xFD50, 0xFDFC),
    (0xFE70, 0xFEFC),
];

/// D.2: bidi class L (Latin, Greek, Cyrillic, Armenian, Devanagari letters).
const L_CAT: Ranges = &[
    (0x0041, 0x005A),
    (0x0061, 0x007A),
    (0x00AA, 0x00AA),
    (0x00B5, 0x00B5),
    (0x00BA, 0x00BA),
    (0x00C0, 0x00D6),
    (0x00D8, 0x00F6),
    (0x00F8, 0x0220),
    (0x0222, 0x0233),
    (0x0250, 0x02B8),
    (0x02BB, 0x02C1),
    (0x0386, 0x0386),
    (0x0388, 0x03CE),
    (0x03D0, 0x03F5),
    (0x0400, 0x0482),
    (0x048A, 0x04F9),
    (0x0500, 0x050F),
    (0x0531, 0x0556),
    (0x0561, 0x0587),
    (0x0903, 0x0939),
    (0x093D, 0x0940),
    (0x0950, 0x0950),
];

fn in_ranges(c: char, ranges: Ranges) -> bool {
    let cp = c as u32;
    ranges
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                std::cmp::Ordering::Less
            } else if lo > cp {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Prepare `data` with the SASLprep profile of stringprep.
///
/// Fails with [`PdfError::SaslPrepError`] on prohibited output or a failed
/// bidirectional check.
pub fn saslprep(data: &str) -> Result<String> {
    let mapped: String = data
        .chars()
        .filter(|&c| !in_ranges(c, MAPPED_TO_NOTHING))
        .map(|c| if in_ranges(c, NON_ASCII_SPACE) { ' ' } else { c })
        .collect();
    let prepared: String = mapped.nfkc().collect();

    if let Some(c) = prepared.chars().find(|&c| in_ranges(c, PROHIBITED)) {
        return Err(PdfError::SaslPrepError(format!(
            "prohibited character U+{:04X}",
            c as u32
        )));
    }

    let has_rtl = prepared.chars().any(|c| in_ranges(c, RAND_AL_CAT));
    if has_rtl {
        let starts = prepared.chars().next().is_some_and(|c| in_ranges(c, RAND_AL_CAT));
        let ends = prepared.chars().last().is_some_and(|c| in_ranges(c, RAND_AL_CAT));
        if !starts || !ends || prepared.chars().any(|c| in_ranges(c, L_CAT)) {
            return Err(PdfError::SaslPrepError("failed bidirectional check".into()));
        }
    }

    Ok(prepared)
}
