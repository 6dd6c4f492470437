//! PDF tokenizer.

use crate::error::{PdfError, Result};

/// PDF keyword / content operator. Known operators are zero-allocation variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Structural
    ArrayStart, // [
    ArrayEnd,   // ]
    DictStart,  // <<
    DictEnd,    // >>
    BraceOpen,  // {
    BraceClose, // }

    Null,

    // Object structure
    Obj,
    EndObj,
    R,
    Stream,
    EndStream,
    Xref,
    Trailer,
    StartXref,

    // Graphics state
    Q,  // restore (uppercase Q)
    Qq, // save (lowercase q)
    Cm,
    Gs,

    // Text object
    BT,
    ET,

    // Text state
    Tc,
    Tw,
    Tz,
    TL,
    Tf,
    Tr,
    Ts,

    // Text positioning
    Td,
    TD,
    Tm,
    TStar, // T*

    // Text showing
    Tj,
    TJ,
    Quote,       // '
    DoubleQuote, // "

    // XObject
    Do,

    // Inline image
    BI,
    ID,
    EI,

    // Marked content
    BMC,
    BDC,
    EMC,
    BX,
    EX,

    /// Any other operator, original bytes preserved
    Unknown(Vec<u8>),
}

impl Keyword {
    pub fn from_bytes(b: &[u8]) -> Self {
        match b {
            b"[" => Self::ArrayStart,
            b"]" => Self::ArrayEnd,
            b"<<" => Self::DictStart,
            b">>" => Self::DictEnd,
            b"{" => Self::BraceOpen,
            b"}" => Self::BraceClose,
            b"null" => Self::Null,
            b"obj" => Self::Obj,
            b"endobj" => Self::EndObj,
            b"R" => Self::R,
            b"stream" => Self::Stream,
            b"endstream" => Self::EndStream,
            b"xref" => Self::Xref,
            b"trailer" => Self::Trailer,
            b"startxref" => Self::StartXref,
            b"Q" => Self::Q,
            b"q" => Self::Qq,
            b"cm" => Self::Cm,
            b"gs" => Self::Gs,
            b"BT" => Self::BT,
            b"ET" => Self::ET,
            b"Tc" => Self::Tc,
            b"Tw" => Self::Tw,
            b"Tz" => Self::Tz,
            b"TL" => Self::TL,
            b"Tf" => Self::Tf,
            b"Tr" => Self::Tr,
            b"Ts" => Self::Ts,
            b"Td" => Self::Td,
            b"TD" => Self::TD,
            b"Tm" => Self::Tm,
            b"T*" => Self::TStar,
            b"Tj" => Self::Tj,
            b"TJ" => Self::TJ,
            b"'" => Self::Quote,
            b"\"" => Self::DoubleQuote,
            b"Do" => Self::Do,
            b"BI" => Self::BI,
            b"ID" => Self::ID,
            b"EI" => Self::EI,
            b"BMC" => Self::BMC,
            b"BDC" => Self::BDC,
            b"EMC" => Self::EMC,
            b"BX" => Self::BX,
            b"EX" => Self::EX,
            other => Self::Unknown(other.to_vec()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::ArrayStart => b"[",
            Self::ArrayEnd => b"]",
            Self::DictStart => b"<<",
            Self::DictEnd => b">>",
            Self::BraceOpen => b"{",
            Self::BraceClose => b"}",
            Self::Null => b"null",
            Self::Obj => b"obj",
            Self::EndObj => b"endobj",
            Self::R => b"R",
            Self::Stream => b"stream",
            Self::EndStream => b"endstream",
            Self::Xref => b"xref",
            Self::Trailer => b"trailer",
            Self::StartXref => b"startxref",
            Self::Q => b"Q",
            Self::Qq => b"q",
            Self::Cm => b"cm",
            Self::Gs => b"gs",
            Self::BT => b"BT",
            Self::ET => b"ET",
            Self::Tc => b"Tc",
            Self::Tw => b"Tw",
            Self::Tz => b"Tz",
            Self::TL => b"TL",
            Self::Tf => b"Tf",
            Self::Tr => b"Tr",
            Self::Ts => b"Ts",
            Self::Td => b"Td",
            Self::TD => b"TD",
            Self::Tm => b"Tm",
            Self::TStar => b"T*",
            Self::Tj => b"Tj",
            Self::TJ => b"TJ",
            Self::Quote => b"'",
            Self::DoubleQuote => b"\"",
            Self::Do => b"Do",
            Self::BI => b"BI",
            Self::ID => b"ID",
            Self::EI => b"EI",
            Self::BMC => b"BMC",
            Self::BDC => b"BDC",
            Self::EMC => b"EMC",
            Self::BX => b"BX",
            Self::EX => b"EX",
            Self::Unknown(bytes) => bytes.as_slice(),
        }
    }
}

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum PSToken {
    Int(i64),
    Real(f64),
    Bool(bool),
    /// Literal name (e.g., /Name), without the slash
    Literal(String),
    /// Keyword/operator (e.g., obj, BT, Tj)
    Keyword(Keyword),
    /// String (literal or hex)
    String(Vec<u8>),
}

/// PDF base parser - performs tokenization over a borrowed buffer.
pub struct PSBaseParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PSBaseParser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position in stream
    pub const fn tell(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub const fn is_whitespace(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
    }

    pub const fn is_delimiter(b: u8) -> bool {
        matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    const fn is_keyword_end(b: u8) -> bool {
        Self::is_whitespace(b) || Self::is_delimiter(b)
    }

    /// Skip whitespace and comments
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                match self.data[self.pos..]
                    .iter()
                    .position(|&c| c == b'\n' || c == b'\r')
                {
                    Some(offset) => self.pos += offset + 1,
                    None => self.pos = self.data.len(),
                }
                continue;
            }
            if !Self::is_whitespace(b) {
                return;
            }
            self.pos += 1;
        }
    }

    /// Parse a literal name (/Name), decoding `#xx` escapes.
    fn parse_literal(&mut self) -> PSToken {
        self.advance();
        let mut name = Vec::new();

        while let Some(b) = self.peek() {
            if Self::is_keyword_end(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                let hex = (self.peek().and_then(hex_value), self.peek_at(1).and_then(hex_value));
                if let (Some(hi), Some(lo)) = hex {
                    self.pos += 2;
                    name.push((hi << 4) | lo);
                    continue;
                }
            }
            name.push(b);
        }

        PSToken::Literal(name_from_bytes(&name))
    }

    /// Parse a number, falling back to the longest valid numeric prefix
    /// (or 0) for malformed input such as `--5`, `1.2.3` or `+.`.
    fn parse_number(&mut self) -> PSToken {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.data[start..self.pos];
        if let Some(token) = number_from_bytes(text) {
            return token;
        }
        let fallback = (1..text.len())
            .rev()
            .find_map(|end| number_from_bytes(&text[..end]))
            .unwrap_or(PSToken::Int(0));
        tracing::debug!(pos = start, "malformed number {:?}", String::from_utf8_lossy(text));
        fallback
    }

    /// Parse a literal string (...)
    fn parse_string(&mut self) -> Result<PSToken> {
        self.advance();
        let mut result = Vec::new();
        let mut depth = 1;

        while depth > 0 {
            match self.advance() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        // line continuation
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = (c - b'0') as u32;
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.pos += 1;
                                    octal = octal * 8 + (d - b'0') as u32;
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    // `\(`, `\)`, `\\` and unknown escapes keep the character
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(PSToken::String(result))
    }

    /// Parse a hex string <...>
    fn parse_hex_string(&mut self) -> Result<PSToken> {
        self.advance();
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) if Self::is_whitespace(c) => {}
                Some(c) => {
                    let nibble = hex_value(c).ok_or_else(|| PdfError::TokenError {
                        pos: self.pos - 1,
                        msg: format!("invalid hex digit {:?}", c as char),
                    })?;
                    match pending.take() {
                        Some(high) => result.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(PSToken::String(result))
    }

    fn parse_keyword(&mut self) -> PSToken {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            if Self::is_keyword_end(b) {
                break;
            }
            self.pos += 1;
        }

        match &self.data[start..self.pos] {
            b"true" => PSToken::Bool(true),
            b"false" => PSToken::Bool(false),
            bytes => PSToken::Keyword(Keyword::from_bytes(bytes)),
        }
    }

    /// Get next token with its starting offset.
    pub fn next_token(&mut self) -> Option<Result<(usize, PSToken)>> {
        self.skip_whitespace();

        if self.at_end() {
            return None;
        }

        let token_pos = self.pos;
        let b = self.peek()?;

        let result = match b {
            b'/' => Ok(self.parse_literal()),
            b'(' => self.parse_string(),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Ok(PSToken::Keyword(Keyword::DictStart))
            }
            b'<' => self.parse_hex_string(),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(PSToken::Keyword(Keyword::DictEnd))
            }
            b'[' | b']' | b'{' | b'}' | b'>' | b')' => {
                self.pos += 1;
                Ok(PSToken::Keyword(Keyword::from_bytes(&[b])))
            }
            b'+' | b'-' | b'.' => Ok(self.parse_number()),
            c if c.is_ascii_digit() => Ok(self.parse_number()),
            _ => Ok(self.parse_keyword()),
        };

        Some(result.map(|token| (token_pos, token)))
    }
}

fn number_from_bytes(text: &[u8]) -> Option<PSToken> {
    let s = std::str::from_utf8(text).ok()?;
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.contains('.') {
        s.parse::<f64>().ok().map(PSToken::Real)
    } else {
        s.parse::<i64>().ok().map(PSToken::Int)
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Names are byte sequences; non-UTF-8 names are kept as Latin-1.
pub(crate) fn name_from_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<PSToken> {
        let mut parser = PSBaseParser::new(data);
        let mut out = Vec::new();
        while let Some(tok) = parser.next_token() {
            out.push(tok.unwrap().1);
        }
        out
    }

    #[test]
    fn test_keyword_from_bytes_known() {
        assert_eq!(Keyword::from_bytes(b"obj"), Keyword::Obj);
        assert_eq!(Keyword::from_bytes(b"T*"), Keyword::TStar);
        assert_eq!(Keyword::from_bytes(b"q"), Keyword::Qq);
    }

    #[test]
    fn test_keyword_from_bytes_unknown() {
        let kw = Keyword::from_bytes(b"re");
        assert_eq!(kw, Keyword::Unknown(b"re".to_vec()));
        assert_eq!(kw.as_bytes(), b"re");
    }

    #[test]
    fn test_basic_tokens() {
        let toks = tokens(b"1 -2 .5 /Name#20X true (str) <48 65 6>");
        assert_eq!(
            toks,
            vec![
                PSToken::Int(1),
                PSToken::Int(-2),
                PSToken::Real(0.5),
                PSToken::Literal("Name X".into()),
                PSToken::Bool(true),
                PSToken::String(b"str".to_vec()),
                PSToken::String(vec![0x48, 0x65, 0x60]),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let toks = tokens(b"% comment\n42 % trailing\r7");
        assert_eq!(toks, vec![PSToken::Int(42), PSToken::Int(7)]);
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(b"(a\\(b\\)\\n\\101\\\nc (nested))");
        assert_eq!(toks, vec![PSToken::String(b"a(b)\nAc (nested)".to_vec())]);
    }

    #[test]
    fn test_malformed_numbers_are_best_effort() {
        assert_eq!(tokens(b"-"), vec![PSToken::Int(0)]);
        assert_eq!(tokens(b"+."), vec![PSToken::Int(0)]);
        assert_eq!(tokens(b"1.2.3"), vec![PSToken::Real(1.2)]);
        assert_eq!(tokens(b"--5"), vec![PSToken::Int(0)]);
        assert_eq!(tokens(b"5."), vec![PSToken::Real(5.0)]);
    }

    #[test]
    fn test_unterminated_string_is_eof() {
        let mut parser = PSBaseParser::new(b"(abc");
        assert!(matches!(parser.next_token(), Some(Err(PdfError::UnexpectedEof))));
    }
}
