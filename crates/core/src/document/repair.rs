//! Cross-reference recovery for files whose xref chain is unusable.
//!
//! The whole file is scanned for `N G obj` headers. Later occurrences of an
//! object number win, matching incremental-update order.

use super::xref::{XRefEntry, XRefSection, object_stream_index};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject};
use crate::parser::pdf_parser::{PDFParser, read_indirect_object, rfind_bytes};
use bytes::Bytes;
use regex::bytes::Regex;
use std::collections::HashMap;

const TRAILER_KEYS: [&str; 4] = ["Root", "Info", "Encrypt", "ID"];

/// Rebuild a single xref section from object headers found in `data`.
pub fn rebuild_xref(data: &Bytes) -> Result<XRefSection> {
    let header = Regex::new(r"(\d+)\s+(\d+)\s+obj\b")
        .map_err(|e| PdfError::BrokenXRef(format!("recovery pattern: {e}")))?;

    let mut section = XRefSection::default();
    let mut object_streams = Vec::new();
    let mut xref_streams = Vec::new();
    let mut catalog = None;

    for cap in header.captures_iter(data) {
        let (Some(objid), Some(genno)) = (parse_u32(&cap[1]), parse_u32(&cap[2])) else {
            continue;
        };
        let Some(whole) = cap.get(0) else {
            continue;
        };
        let offset = whole.start();
        section
            .entries
            .insert(objid, XRefEntry::InFile { offset, genno });

        let Some(kind) = peek_type(data, whole.end()) else {
            continue;
        };
        match kind.as_str() {
            "ObjStm" => object_streams.push((objid, offset)),
            "XRef" => xref_streams.push(offset),
            "Catalog" => catalog = Some((objid, genno)),
            _ => {}
        }
    }

    if section.entries.is_empty() {
        return Err(PdfError::BrokenXRef("no objects found while rebuilding".into()));
    }

    for (stream_objid, offset) in object_streams {
        index_object_stream(data, stream_objid, offset, &mut section.entries);
    }

    section.trailer = find_trailer(data).unwrap_or_default();
    if !section.trailer.contains_key("Root") {
        for offset in xref_streams.iter().rev() {
            borrow_trailer_keys(data, *offset, &mut section.trailer);
        }
    }
    if !section.trailer.contains_key("Root")
        && let Some((objid, genno)) = catalog
    {
        tracing::warn!(objid, "no trailer /Root, using last /Type /Catalog object");
        section.trailer.insert(
            "Root".into(),
            PDFObject::Ref(PDFObjRef::new(objid, genno)),
        );
    }

    tracing::warn!(
        objects = section.entries.len(),
        "rebuilt cross-reference table by scanning"
    );
    Ok(section)
}

fn parse_u32(digits: &[u8]) -> Option<u32> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// `/Type` of the dictionary right after an object header, if any.
fn peek_type(data: &[u8], body: usize) -> Option<String> {
    let mut parser = PDFParser::new(data);
    parser.set_pos(body);
    let obj = parser.parse_object().ok()?;
    let dict = obj.as_dict().ok()?;
    dict.get("Type")?.as_name().ok().map(str::to_string)
}

/// The dictionary after the last `trailer` keyword.
fn find_trailer(data: &[u8]) -> Option<HashMap<String, PDFObject>> {
    let pos = rfind_bytes(data, b"trailer")?;
    let mut parser = PDFParser::new(data);
    parser.set_pos(pos + b"trailer".len());
    match parser.parse_object() {
        Ok(PDFObject::Dict(dict)) => Some(dict),
        _ => None,
    }
}

fn borrow_trailer_keys(data: &Bytes, offset: usize, trailer: &mut HashMap<String, PDFObject>) {
    let Ok((_, _, PDFObject::Stream(stream))) = read_indirect_object(data, offset, |_| None) else {
        return;
    };
    for key in TRAILER_KEYS {
        if let Some(value) = stream.get(key) {
            trailer.entry(key.to_string()).or_insert_with(|| value.clone());
        }
    }
}

/// Register members of an object stream that no header in the file defines.
fn index_object_stream(
    data: &Bytes,
    stream_objid: u32,
    offset: usize,
    entries: &mut HashMap<u32, XRefEntry>,
) {
    let Ok((_, _, PDFObject::Stream(stream))) = read_indirect_object(data, offset, |_| None) else {
        return;
    };
    let count = stream
        .get("N")
        .and_then(|n| n.as_int().ok())
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    let body = match stream.get_data() {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!(stream_objid, %err, "skipping undecodable object stream");
            return;
        }
    };
    for (index, (objid, _)) in object_stream_index(&body, count).into_iter().enumerate() {
        entries.entry(objid).or_insert(XRefEntry::InStream {
            stream_objid,
            index,
        });
    }
}
