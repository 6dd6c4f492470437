//! PDF object parser - converts tokens to PDF objects and reads indirect
//! objects (including stream bodies) out of the file buffer.

use super::lexer::{Keyword, PSBaseParser, PSToken};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject, PDFStream};
use bytes::Bytes;
use std::collections::HashMap;

/// PDF Parser - parses PDF object syntax.
///
/// Uses PSBaseParser for tokenization and builds PDF objects, handling
/// indirect references (`num num R`) with a two-token lookahead.
pub struct PDFParser<'a> {
    base: PSBaseParser<'a>,
    /// Pushed-back tokens, last one is read first
    lookahead: Vec<(usize, PSToken)>,
}

impl<'a> PDFParser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            base: PSBaseParser::new(data),
            lookahead: Vec::new(),
        }
    }

    /// Position of the next unread token.
    pub fn tell(&self) -> usize {
        self.lookahead
            .last()
            .map_or_else(|| self.base.tell(), |(pos, _)| *pos)
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.lookahead.clear();
        self.base.set_pos(pos);
    }

    pub fn next_token(&mut self) -> Result<Option<(usize, PSToken)>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        self.base.next_token().transpose()
    }

    pub(crate) fn push_back(&mut self, tok: (usize, PSToken)) {
        self.lookahead.push(tok);
    }

    pub const fn data(&self) -> &'a [u8] {
        self.base.data()
    }

    /// Parse next PDF object
    pub fn parse_object(&mut self) -> Result<PDFObject> {
        let (pos, token) = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
        self.token_to_object(pos, token)
    }

    fn token_to_object(&mut self, pos: usize, token: PSToken) -> Result<PDFObject> {
        match token {
            PSToken::Int(n) => {
                if let Some(obj_ref) = self.try_reference(n)? {
                    return Ok(PDFObject::Ref(obj_ref));
                }
                Ok(PDFObject::Int(n))
            }
            PSToken::Real(n) => Ok(PDFObject::Real(n)),
            PSToken::Bool(b) => Ok(PDFObject::Bool(b)),
            PSToken::Literal(s) => Ok(PDFObject::Name(s)),
            PSToken::String(s) => Ok(PDFObject::String(s)),
            PSToken::Keyword(Keyword::Null) => Ok(PDFObject::Null),
            PSToken::Keyword(Keyword::ArrayStart) => self.parse_array(pos),
            PSToken::Keyword(Keyword::DictStart) => self.parse_dict(pos),
            PSToken::Keyword(kw) => Err(PdfError::MalformedSyntax(format!(
                "unexpected keyword {:?} at {pos}",
                String::from_utf8_lossy(kw.as_bytes())
            ))),
        }
    }

    /// Having read integer `objid`, check whether `genno R` follows.
    fn try_reference(&mut self, objid: i64) -> Result<Option<PDFObjRef>> {
        let Some(second) = self.next_token()? else {
            return Ok(None);
        };
        let PSToken::Int(genno) = second.1 else {
            self.push_back(second);
            return Ok(None);
        };
        match self.next_token()? {
            Some((_, PSToken::Keyword(Keyword::R))) => {
                if objid < 0 || genno < 0 || objid > u32::MAX as i64 || genno > u32::MAX as i64 {
                    return Err(PdfError::MalformedSyntax(format!(
                        "invalid reference {objid} {genno} R"
                    )));
                }
                Ok(Some(PDFObjRef::new(objid as u32, genno as u32)))
            }
            Some(third) => {
                self.push_back(third);
                self.push_back(second);
                Ok(None)
            }
            None => {
                self.push_back(second);
                Ok(None)
            }
        }
    }

    fn parse_array(&mut self, start: usize) -> Result<PDFObject> {
        let mut arr = Vec::new();
        loop {
            let (pos, token) = self.next_token()?.ok_or_else(|| {
                PdfError::MalformedSyntax(format!("unterminated array at {start}"))
            })?;
            if token == PSToken::Keyword(Keyword::ArrayEnd) {
                break;
            }
            arr.push(self.token_to_object(pos, token)?);
        }
        Ok(PDFObject::Array(arr))
    }

    fn parse_dict(&mut self, start: usize) -> Result<PDFObject> {
        let mut dict = HashMap::new();
        loop {
            let (pos, token) = self.next_token()?.ok_or_else(|| {
                PdfError::MalformedSyntax(format!("unterminated dictionary at {start}"))
            })?;
            let key = match token {
                PSToken::Keyword(Keyword::DictEnd) => break,
                PSToken::Literal(name) => name,
                other => {
                    return Err(PdfError::MalformedSyntax(format!(
                        "expected name as dict key at {pos}, got {other:?}"
                    )));
                }
            };
            let value = self.parse_object()?;
            // A null value is equivalent to an absent key.
            if !value.is_null() {
                dict.insert(key, value);
            }
        }
        Ok(PDFObject::Dict(dict))
    }
}

/// Read an `objid genno obj` header at `offset`.
pub fn read_object_header(data: &[u8], offset: usize) -> Option<(u32, u32, usize)> {
    let mut parser = PSBaseParser::new(data);
    parser.set_pos(offset);
    let Some(Ok((_, PSToken::Int(objid)))) = parser.next_token() else {
        return None;
    };
    let Some(Ok((_, PSToken::Int(genno)))) = parser.next_token() else {
        return None;
    };
    let Some(Ok((_, PSToken::Keyword(Keyword::Obj)))) = parser.next_token() else {
        return None;
    };
    let objid = u32::try_from(objid).ok()?;
    let genno = u32::try_from(genno).ok()?;
    Some((objid, genno, parser.tell()))
}

/// Read the indirect object stored at `offset`.
///
/// `resolve_length` maps an indirect `/Length` to its integer value. When
/// the declared length does not land on `endstream` the stream body is
/// delimited by scanning for the keyword instead.
pub fn read_indirect_object<F>(
    data: &Bytes,
    offset: usize,
    resolve_length: F,
) -> Result<(u32, u32, PDFObject)>
where
    F: Fn(&PDFObjRef) -> Option<i64>,
{
    let (objid, genno, body) = read_object_header(data, offset).ok_or_else(|| {
        PdfError::MalformedSyntax(format!("no object header at offset {offset}"))
    })?;

    let mut parser = PDFParser::new(data);
    parser.set_pos(body);
    let obj = parser.parse_object()?;

    let PDFObject::Dict(attrs) = obj else {
        return Ok((objid, genno, obj));
    };
    match parser.next_token()? {
        Some((pos, PSToken::Keyword(Keyword::Stream))) => {
            let start = skip_stream_eol(data, pos + b"stream".len());
            let declared = match attrs.get("Length") {
                Some(PDFObject::Int(n)) => Some(*n),
                Some(PDFObject::Ref(r)) => resolve_length(r),
                _ => None,
            };
            let end = stream_end(data, start, declared).ok_or_else(|| {
                PdfError::MalformedSyntax(format!("object {objid} {genno}: missing endstream"))
            })?;
            let mut stream = PDFStream::new(attrs, data.slice(start..end));
            stream.set_objid(objid, genno);
            Ok((objid, genno, PDFObject::Stream(Box::new(stream))))
        }
        _ => Ok((objid, genno, PDFObject::Dict(attrs))),
    }
}

/// The `stream` keyword is followed by CRLF or LF (a lone CR is tolerated).
fn skip_stream_eol(data: &[u8], mut pos: usize) -> usize {
    while data.get(pos) == Some(&b' ') {
        pos += 1;
    }
    match data.get(pos) {
        Some(b'\r') if data.get(pos + 1) == Some(&b'\n') => pos + 2,
        Some(b'\r') | Some(b'\n') => pos + 1,
        _ => pos,
    }
}

fn stream_end(data: &[u8], start: usize, declared: Option<i64>) -> Option<usize> {
    if let Some(len) = declared.and_then(|n| usize::try_from(n).ok()) {
        let end = start.checked_add(len)?;
        if end <= data.len() {
            let mut cursor = end;
            while cursor < data.len() && PSBaseParser::is_whitespace(data[cursor]) {
                cursor += 1;
            }
            if data[cursor..].starts_with(b"endstream") {
                return Some(end);
            }
        }
        tracing::debug!(start, len, "stream /Length does not reach endstream, scanning");
    }
    let found = find_bytes(&data[start..], b"endstream")?;
    let mut end = start + found;
    // the EOL before endstream is not part of the data
    if end > start && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > start && data[end - 1] == b'\r' {
        end -= 1;
    }
    Some(end)
}

pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub(crate) fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> PDFObject {
        PDFParser::new(data).parse_object().unwrap()
    }

    #[test]
    fn parses_references_with_lookahead() {
        let obj = parse(b"[1 0 R 2 5 /X 3]");
        assert_eq!(
            obj,
            PDFObject::Array(vec![
                PDFObject::Ref(PDFObjRef::new(1, 0)),
                PDFObject::Int(2),
                PDFObject::Int(5),
                PDFObject::Name("X".into()),
                PDFObject::Int(3),
            ])
        );
    }

    #[test]
    fn parses_nested_dict() {
        let obj = parse(b"<< /Type /Page /Kids [ 3 0 R ] /Inner << /A (x) >> /Gone null >>");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict["Type"].as_name().unwrap(), "Page");
        assert_eq!(dict["Inner"].as_dict().unwrap()["A"].as_string().unwrap(), b"x");
        assert!(!dict.contains_key("Gone"));
    }

    #[test]
    fn unterminated_dict_is_malformed() {
        let err = PDFParser::new(b"<< /A 1").parse_object().unwrap_err();
        assert!(matches!(err, PdfError::MalformedSyntax(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn reads_stream_with_direct_length() {
        let data = Bytes::from_static(b"4 0 obj\n<< /Length 5 >>\nstream\r\nhello\nendstream\nendobj\n");
        let (objid, genno, obj) = read_indirect_object(&data, 0, |_| None).unwrap();
        assert_eq!((objid, genno), (4, 0));
        assert_eq!(obj.as_stream().unwrap().get_rawdata(), b"hello");
    }

    #[test]
    fn wrong_length_falls_back_to_endstream_scan() {
        let data = Bytes::from_static(b"1 0 obj << /Length 99 >> stream\nabc\nendstream endobj");
        let (_, _, obj) = read_indirect_object(&data, 0, |_| None).unwrap();
        assert_eq!(obj.as_stream().unwrap().get_rawdata(), b"abc");
    }

    #[test]
    fn indirect_length_uses_resolver() {
        let data = Bytes::from_static(b"1 0 obj << /Length 2 0 R >> stream\nabcd\nendstream endobj");
        let (_, _, obj) = read_indirect_object(&data, 0, |r| (r.objid == 2).then_some(4)).unwrap();
        assert_eq!(obj.as_stream().unwrap().get_rawdata(), b"abcd");
    }
}
