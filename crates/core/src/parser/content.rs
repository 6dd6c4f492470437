//! Content stream parser.
//!
//! Parses page and form content into a sequence of operations. Inline
//! images (`BI ... ID <data> EI`) become a single `EI` operation whose
//! operand is a stream holding the image dictionary and raw bytes.

use super::lexer::{Keyword, PSBaseParser, PSToken};
use super::pdf_parser::{PDFParser, find_bytes};
use crate::error::Result;
use crate::model::objects::{PDFObject, PDFStream};
use std::collections::HashMap;

/// Content stream operation
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The operator (e.g., BT, Tf, Tj)
    pub operator: Keyword,
    pub operands: Vec<PDFObject>,
}

/// Expand the abbreviated keys allowed in inline image dictionaries.
fn expand_inline_key(key: &str) -> &str {
    match key {
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "D" => "Decode",
        "DP" => "DecodeParms",
        "F" => "Filter",
        "H" => "Height",
        "IM" => "ImageMask",
        "I" => "Interpolate",
        "W" => "Width",
        "L" => "Length",
        other => other,
    }
}

/// PDF Content Stream Parser
pub struct PDFContentParser;

impl PDFContentParser {
    /// Parse a content stream into operations.
    ///
    /// A malformed token discards the operands collected so far and parsing
    /// resumes after it, so one damaged operator does not hide the rest of
    /// the stream.
    pub fn parse(data: &[u8]) -> Vec<Operation> {
        let mut parser = PDFParser::new(data);
        let mut ops = Vec::new();
        loop {
            let start = parser.tell();
            match Self::parse_into(&mut parser, &mut ops) {
                Ok(()) => break,
                Err(e) if e.is_recoverable() => {
                    let pos = parser.tell();
                    tracing::debug!(pos, "skipping malformed content: {e}");
                    parser.set_pos(pos.max(start + 1));
                }
                Err(e) => {
                    tracing::debug!(pos = parser.tell(), "content stream truncated: {e}");
                    break;
                }
            }
        }
        ops
    }

    fn parse_into(parser: &mut PDFParser<'_>, ops: &mut Vec<Operation>) -> Result<()> {
        let mut operands: Vec<PDFObject> = Vec::new();

        while let Some((pos, token)) = parser.next_token()? {
            match token {
                PSToken::Keyword(Keyword::BI) => {
                    operands.clear();
                    ops.push(Self::parse_inline_image(parser)?);
                }
                PSToken::Keyword(Keyword::ArrayStart | Keyword::DictStart | Keyword::Null) => {
                    parser.push_back((pos, token));
                    operands.push(parser.parse_object()?);
                }
                PSToken::Keyword(kw) => ops.push(Operation {
                    operator: kw,
                    operands: std::mem::take(&mut operands),
                }),
                other => {
                    parser.push_back((pos, other));
                    operands.push(parser.parse_object()?);
                }
            }
        }
        Ok(())
    }

    fn parse_inline_image(parser: &mut PDFParser<'_>) -> Result<Operation> {
        let mut dict = HashMap::new();
        loop {
            let Some((pos, token)) = parser.next_token()? else {
                return Err(crate::PdfError::MalformedSyntax(
                    "inline image without ID".into(),
                ));
            };
            match token {
                PSToken::Keyword(Keyword::ID) => break,
                PSToken::Literal(key) => {
                    let value = parser.parse_object()?;
                    dict.insert(expand_inline_key(&key).to_string(), value);
                }
                other => {
                    tracing::debug!(pos, "ignoring {other:?} in inline image dictionary");
                }
            }
        }

        let data = parser.data();
        // a single whitespace byte separates ID from the data
        let mut start = parser.tell();
        if data.get(start).is_some_and(|&b| PSBaseParser::is_whitespace(b)) {
            start += 1;
        }

        let declared = dict
            .get("Length")
            .and_then(|l| l.as_int().ok())
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| start + n <= data.len());
        let (end, resume) = match declared {
            Some(n) => {
                let end = start + n;
                let after = find_bytes(&data[end..], b"EI").map_or(data.len(), |i| end + i + 2);
                (end, after)
            }
            None => find_inline_end(data, start),
        };

        parser.set_pos(resume);
        let stream = PDFStream::new(dict, data[start..end].to_vec());
        Ok(Operation {
            operator: Keyword::EI,
            operands: vec![PDFObject::Stream(Box::new(stream))],
        })
    }
}

/// Locate `<ws>EI<ws|eof>` after inline image data.
/// Returns (end of data, position after EI).
fn find_inline_end(data: &[u8], start: usize) -> (usize, usize) {
    let mut search = start;
    while let Some(i) = find_bytes(&data[search..], b"EI") {
        let at = search + i;
        let before_ok = at > start && PSBaseParser::is_whitespace(data[at - 1]);
        let after_ok = data
            .get(at + 2)
            .is_none_or(|&b| PSBaseParser::is_whitespace(b));
        if before_ok && after_ok {
            return (at - 1, at + 2);
        }
        search = at + 2;
    }
    (data.len(), data.len())
}
