//! PDF object types.

use crate::codec::filters;
use crate::error::{PdfError, Result};
use bytes::Bytes;
use std::collections::HashMap;

/// A parsed PDF value.
///
/// Dictionary keys and names are held without their leading slash.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Name(String),
    /// Raw string bytes; text decoding is left to the caller
    String(Vec<u8>),
    Array(Vec<Self>),
    Dict(HashMap<String, Self>),
    Stream(Box<PDFStream>),
    /// `objid genno R`
    Ref(PDFObjRef),
}

impl PDFObject {
    fn mismatch(&self, expected: &'static str) -> PdfError {
        PdfError::TypeError {
            expected,
            got: self.type_name(),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match *self {
            Self::Bool(b) => Ok(b),
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match *self {
            Self::Int(n) => Ok(n),
            _ => Err(self.mismatch("int")),
        }
    }

    /// Integers widen to `f64`.
    pub fn as_num(&self) -> Result<f64> {
        match *self {
            Self::Int(n) => Ok(n as f64),
            Self::Real(x) => Ok(x),
            _ => Err(self.mismatch("number")),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(name) => Ok(name),
            _ => Err(self.mismatch("name")),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(bytes) => Ok(bytes),
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(items) => Ok(items),
            _ => Err(self.mismatch("array")),
        }
    }

    /// A stream answers with its attribute dictionary.
    pub fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(dict) => Ok(dict),
            Self::Stream(stream) => Ok(&stream.attrs),
            _ => Err(self.mismatch("dict")),
        }
    }

    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(stream) => Ok(stream),
            _ => Err(self.mismatch("stream")),
        }
    }

    pub fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(self.mismatch("ref")),
        }
    }

    /// Kind of value, as reported in [`PdfError::TypeError`].
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// Target of an indirect reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    pub objid: u32,
    pub genno: u32,
}

impl PDFObjRef {
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// A stream object: its dictionary and the bytes it wraps.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    pub attrs: HashMap<String, PDFObject>,
    /// Still filter-encoded; encrypted until `rawdata_decrypted` is set
    rawdata: Bytes,
    rawdata_decrypted: bool,
    /// Known once the stream was read from a document
    pub objid: Option<u32>,
    pub genno: Option<u32>,
}

impl PDFStream {
    pub fn new(attrs: HashMap<String, PDFObject>, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            rawdata_decrypted: false,
            objid: None,
            genno: None,
        }
    }

    pub const fn set_objid(&mut self, objid: u32, genno: u32) {
        self.objid = Some(objid);
        self.genno = Some(genno);
    }

    /// Raw bytes between `stream` and `endstream`, after decryption if any.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    pub const fn rawdata_is_decrypted(&self) -> bool {
        self.rawdata_decrypted
    }

    /// Store the plaintext of the raw bytes.
    pub fn set_rawdata_decrypted(&mut self, data: Vec<u8>) {
        self.rawdata = Bytes::from(data);
        self.rawdata_decrypted = true;
    }

    /// Decode the stream through its `/Filter` chain.
    ///
    /// Pure: repeated calls decode the same raw bytes again and return
    /// identical results. Image codecs are passed through undecoded.
    pub fn get_data(&self) -> Result<Vec<u8>> {
        filters::decode_stream_data(&self.rawdata, &self.attrs)
    }

    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    /// Name of the stream's `/Type`, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(|t| t.as_name().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_report_type_mismatch() {
        let obj = PDFObject::Int(3);
        assert_eq!(obj.as_num().unwrap(), 3.0);
        match obj.as_name() {
            Err(PdfError::TypeError { expected, got }) => {
                assert_eq!(expected, "name");
                assert_eq!(got, "int");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stream_exposes_attrs_as_dict() {
        let mut attrs = HashMap::new();
        attrs.insert("Type".to_string(), PDFObject::Name("XObject".into()));
        let obj = PDFObject::Stream(Box::new(PDFStream::new(attrs, b"abc".to_vec())));
        let dict = obj.as_dict().unwrap();
        assert!(dict.contains_key("Type"));
        assert_eq!(obj.as_stream().unwrap().type_name(), Some("XObject"));
    }

    #[test]
    fn unfiltered_stream_data_is_raw() {
        let stream = PDFStream::new(HashMap::new(), b"plain".to_vec());
        assert_eq!(stream.get_data().unwrap(), b"plain");
        assert_eq!(stream.get_data().unwrap(), b"plain");
    }
}
