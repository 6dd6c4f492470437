//! Cross-reference tables and streams.
//!
//! A file may carry several xref sections chained through `/Prev`. They are
//! merged newest-first into one [`XRefTable`]: an object number keeps the
//! entry from the newest section that mentions it, free entries included.

use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use crate::parser::lexer::PSToken;
use crate::parser::pdf_parser::{PDFParser, read_indirect_object, rfind_bytes};
use crate::utils::nunpack;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};

/// Location of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Stored at a byte offset in the file
    InFile { offset: usize, genno: u32 },
    /// Stored as member `index` of object stream `stream_objid`
    InStream { stream_objid: u32, index: usize },
    Free,
}

/// One cross-reference section with its trailer.
#[derive(Debug, Default, Clone)]
pub struct XRefSection {
    pub entries: HashMap<u32, XRefEntry>,
    pub trailer: HashMap<String, PDFObject>,
}

impl XRefSection {
    fn int_key(&self, key: &str) -> Option<usize> {
        self.trailer
            .get(key)
            .and_then(|v| v.as_int().ok())
            .and_then(|n| usize::try_from(n).ok())
    }
}

/// Merged view over every section of the file.
#[derive(Debug, Default, Clone)]
pub struct XRefTable {
    entries: HashMap<u32, XRefEntry>,
    trailer: HashMap<String, PDFObject>,
}

impl XRefTable {
    /// Merge a section that is older than everything merged so far.
    pub fn merge_older(&mut self, section: XRefSection) {
        for (objid, entry) in section.entries {
            self.entries.entry(objid).or_insert(entry);
        }
        for (key, value) in section.trailer {
            self.trailer.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, objid: u32) -> Option<XRefEntry> {
        self.entries.get(&objid).copied()
    }

    pub const fn trailer(&self) -> &HashMap<String, PDFObject> {
        &self.trailer
    }

    /// Object numbers with an in-use entry, ascending.
    pub fn objids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, e)| !matches!(e, XRefEntry::Free))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<XRefSection> for XRefTable {
    fn from(section: XRefSection) -> Self {
        Self {
            entries: section.entries,
            trailer: section.trailer,
        }
    }
}

/// Locate the offset named by the last `startxref` in the final 1024 bytes.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(1024);
    let tail = &data[tail_start..];
    let i = rfind_bytes(tail, b"startxref")
        .ok_or_else(|| PdfError::BrokenXRef("startxref not found".into()))?;
    let rest = &tail[i + b"startxref".len()..];
    let digits: Vec<u8> = rest
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .copied()
        .collect();
    let pos = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| PdfError::BrokenXRef("startxref has no offset".into()))?;
    if pos >= data.len() {
        return Err(PdfError::BrokenXRef(format!(
            "startxref {pos} beyond end of file"
        )));
    }
    Ok(pos)
}

/// Follow the `/Prev` chain from `start`, merging newest-first.
pub fn load_chain(data: &Bytes, start: usize) -> Result<XRefTable> {
    let mut table = XRefTable::default();
    let mut visited = HashSet::new();
    let mut next = Some(start);

    while let Some(pos) = next {
        if !visited.insert(pos) {
            tracing::debug!(pos, "xref /Prev cycle");
            break;
        }
        let mut section = parse_section_at(data, pos)?;
        next = section.int_key("Prev");

        // hybrid file: the /XRefStm section fills what the table leaves free
        if let Some(stm_pos) = section.int_key("XRefStm")
            && visited.insert(stm_pos)
        {
            match parse_xref_stream(data, stm_pos) {
                Ok(stm) => {
                    for (objid, entry) in stm.entries {
                        let slot = section.entries.entry(objid).or_insert(XRefEntry::Free);
                        if matches!(slot, XRefEntry::Free) {
                            *slot = entry;
                        }
                    }
                }
                Err(e) => tracing::warn!(pos = stm_pos, "skipping /XRefStm section: {e}"),
            }
        }

        table.merge_older(section);
    }

    Ok(table)
}

/// Parse the classic table or xref stream starting at `pos`.
pub fn parse_section_at(data: &Bytes, pos: usize) -> Result<XRefSection> {
    let rest = data
        .get(pos..)
        .ok_or_else(|| PdfError::BrokenXRef(format!("xref offset {pos} out of range")))?;
    let skipped = rest.iter().take_while(|b| b.is_ascii_whitespace()).count();
    if rest[skipped..].starts_with(b"xref") {
        parse_xref_table(data, pos + skipped + b"xref".len())
    } else {
        parse_xref_stream(data, pos)
    }
}

/// Cursor over whitespace-separated ASCII fields of a classic table.
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek_keyword(&mut self, kw: &[u8]) -> bool {
        self.skip_ws();
        self.data[self.pos..].starts_with(kw)
    }

    fn field(&mut self) -> Option<&'a [u8]> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let data: &'a [u8] = self.data;
        if self.pos > start {
            Some(&data[start..self.pos])
        } else {
            None
        }
    }

    fn number(&mut self) -> Option<u64> {
        std::str::from_utf8(self.field()?).ok()?.parse().ok()
    }
}

fn parse_xref_table(data: &Bytes, body: usize) -> Result<XRefSection> {
    let mut section = XRefSection::default();
    let mut reader = FieldReader {
        data: &data[..],
        pos: body,
    };
    let broken = |msg: &str| PdfError::BrokenXRef(format!("xref table at {body}: {msg}"));

    while !reader.peek_keyword(b"trailer") {
        let start = reader.number().ok_or_else(|| broken("bad subsection header"))?;
        let count = reader.number().ok_or_else(|| broken("bad subsection count"))?;
        let mut base = start;
        for i in 0..count {
            let offset = reader.number().ok_or_else(|| broken("bad entry offset"))?;
            let genno = reader.number().ok_or_else(|| broken("bad entry generation"))?;
            let marker = reader.field().ok_or_else(|| broken("missing entry type"))?;
            // Subsection wrongly numbered from 1 while holding the object 0 entry.
            if i == 0 && base == 1 && marker == b"f" && offset == 0 && genno == 65535 {
                base = 0;
            }
            let Ok(objid) = u32::try_from(base + i) else {
                return Err(broken("object number overflow"));
            };
            let entry = match marker {
                b"n" => XRefEntry::InFile {
                    offset: offset as usize,
                    genno: genno as u32,
                },
                b"f" => XRefEntry::Free,
                _ => return Err(broken("unknown entry type")),
            };
            section.entries.insert(objid, entry);
        }
    }

    let mut parser = PDFParser::new(data);
    parser.set_pos(reader.pos + b"trailer".len());
    match parser.parse_object()? {
        PDFObject::Dict(dict) => section.trailer = dict,
        other => {
            return Err(PdfError::BrokenXRef(format!(
                "trailer is a {}",
                other.type_name()
            )));
        }
    }
    Ok(section)
}

/// Parse a `/Type /XRef` stream object (PDF 1.5+).
pub fn parse_xref_stream(data: &Bytes, pos: usize) -> Result<XRefSection> {
    let (_, _, obj) = read_indirect_object(data, pos, |_| None)
        .map_err(|e| PdfError::BrokenXRef(format!("xref stream at {pos}: {e}")))?;
    let stream = obj.as_stream()?;
    if stream.type_name() != Some("XRef") {
        return Err(PdfError::BrokenXRef(format!("object at {pos} is not an xref stream")));
    }

    let widths: Vec<usize> = stream
        .get("W")
        .ok_or_else(|| PdfError::BrokenXRef("xref stream without /W".into()))?
        .as_array()?
        .iter()
        .map(|w| {
            let n = w.as_int()?;
            usize::try_from(n)
                .ok()
                .filter(|&n| n <= 8)
                .ok_or_else(|| PdfError::BrokenXRef(format!("/W field width {n} out of range")))
        })
        .collect::<Result<_>>()?;
    let &[w0, w1, w2] = widths.as_slice() else {
        return Err(PdfError::BrokenXRef("/W must have 3 elements".into()));
    };
    let entry_size = w0 + w1 + w2;
    if entry_size == 0 {
        return Err(PdfError::BrokenXRef("/W describes empty entries".into()));
    }

    let size = stream.get("Size").and_then(|s| s.as_int().ok()).unwrap_or(0);
    let subsections: Vec<(i64, i64)> = match stream.get("Index") {
        Some(index) => index
            .as_array()?
            .chunks_exact(2)
            .map(|pair| Ok((pair[0].as_int()?, pair[1].as_int()?)))
            .collect::<Result<_>>()?,
        None => vec![(0, size)],
    };

    let body = stream.get_data()?;
    let mut rows = body.chunks_exact(entry_size);
    let mut section = XRefSection::default();

    'outer: for (start, count) in subsections {
        for i in 0..count.max(0) {
            let Some(row) = rows.next() else {
                break 'outer;
            };
            let Some(objid) = start.checked_add(i).and_then(|id| u32::try_from(id).ok()) else {
                continue;
            };
            // an absent type field defaults to 1
            let kind = if w0 == 0 { 1 } else { nunpack(&row[..w0], 1) };
            let f1 = nunpack(&row[w0..w0 + w1], 0);
            let f2 = nunpack(&row[w0 + w1..], 0);
            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::InFile {
                    offset: f1 as usize,
                    genno: f2 as u32,
                },
                2 => XRefEntry::InStream {
                    stream_objid: f1 as u32,
                    index: f2 as usize,
                },
                _ => continue,
            };
            section.entries.insert(objid, entry);
        }
    }

    section.trailer = stream
        .attrs
        .iter()
        .filter(|(k, _)| {
            !matches!(
                k.as_str(),
                "Length" | "Filter" | "DecodeParms" | "W" | "Index" | "Type"
            )
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(section)
}

/// Read the `objid offset` pairs heading a decoded object stream. Offsets
/// are relative to `/First`.
pub fn object_stream_index(data: &[u8], count: usize) -> Vec<(u32, usize)> {
    let mut parser = PDFParser::new(data);
    let mut numbers = Vec::with_capacity(count * 2);
    while numbers.len() < count * 2 {
        match parser.next_token() {
            Ok(Some((_, PSToken::Int(n)))) => numbers.push(n),
            _ => break,
        }
    }
    numbers
        .chunks_exact(2)
        .filter_map(|pair| Some((u32::try_from(pair[0]).ok()?, usize::try_from(pair[1]).ok()?)))
        .collect()
}
