//! Stream filter pipeline.
//!
//! Applies a stream's `/Filter` chain with the matching `/DecodeParms`.

use super::predictor::{PredictorParams, apply_predictor};
use super::{ascii85, flate, lzw, runlength};
use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use std::collections::HashMap;

/// A decoding step named by `/Filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFilter {
    FlateDecode,
    LZWDecode,
    ASCII85Decode,
    ASCIIHexDecode,
    RunLengthDecode,
    /// Crypt filter; only `/Identity` is meaningful once the document is
    /// decrypted.
    Crypt,
    DCTDecode,
    JPXDecode,
    JBIG2Decode,
    CCITTFaxDecode,
}

impl StreamFilter {
    /// Resolve a filter name, including the inline-image abbreviations.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "FlateDecode" | "Fl" => Self::FlateDecode,
            "LZWDecode" | "LZW" => Self::LZWDecode,
            "ASCII85Decode" | "A85" => Self::ASCII85Decode,
            "ASCIIHexDecode" | "AHx" => Self::ASCIIHexDecode,
            "RunLengthDecode" | "RL" => Self::RunLengthDecode,
            "Crypt" => Self::Crypt,
            "DCTDecode" | "DCT" => Self::DCTDecode,
            "JPXDecode" => Self::JPXDecode,
            "JBIG2Decode" => Self::JBIG2Decode,
            "CCITTFaxDecode" | "CCF" => Self::CCITTFaxDecode,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::FlateDecode => "FlateDecode",
            Self::LZWDecode => "LZWDecode",
            Self::ASCII85Decode => "ASCII85Decode",
            Self::ASCIIHexDecode => "ASCIIHexDecode",
            Self::RunLengthDecode => "RunLengthDecode",
            Self::Crypt => "Crypt",
            Self::DCTDecode => "DCTDecode",
            Self::JPXDecode => "JPXDecode",
            Self::JBIG2Decode => "JBIG2Decode",
            Self::CCITTFaxDecode => "CCITTFaxDecode",
        }
    }

    /// Image codecs end the chain; their payload is returned still encoded.
    pub const fn is_image_codec(self) -> bool {
        matches!(
            self,
            Self::DCTDecode | Self::JPXDecode | Self::JBIG2Decode | Self::CCITTFaxDecode
        )
    }
}

/// The `/Filter` entries of a stream paired with their `/DecodeParms`.
pub fn filter_chain(
    attrs: &HashMap<String, PDFObject>,
) -> Result<Vec<(StreamFilter, Option<HashMap<String, PDFObject>>)>> {
    let names: Vec<&PDFObject> = match attrs.get("Filter") {
        None => return Ok(Vec::new()),
        Some(PDFObject::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    };
    let params: Vec<Option<&PDFObject>> = match attrs.get("DecodeParms") {
        Some(PDFObject::Array(items)) => items.iter().map(Some).collect(),
        Some(single) => vec![Some(single)],
        None => Vec::new(),
    };

    names
        .iter()
        .enumerate()
        .map(|(i, obj)| {
            let name = obj.as_name()?;
            let filter = StreamFilter::from_name(name)
                .ok_or_else(|| PdfError::UnsupportedFilter(name.to_string()))?;
            let parms = params
                .get(i)
                .copied()
                .flatten()
                .and_then(|p| p.as_dict().ok())
                .cloned();
            Ok((filter, parms))
        })
        .collect()
}

/// Decode `rawdata` through the filter chain described by `attrs`.
pub fn decode_stream_data(rawdata: &[u8], attrs: &HashMap<String, PDFObject>) -> Result<Vec<u8>> {
    let chain = filter_chain(attrs)?;
    let mut data = rawdata.to_vec();
    for (filter, parms) in chain {
        if filter.is_image_codec() {
            break;
        }
        data = apply_filter(filter, data, parms.as_ref())?;
    }
    Ok(data)
}

fn apply_filter(
    filter: StreamFilter,
    data: Vec<u8>,
    parms: Option<&HashMap<String, PDFObject>>,
) -> Result<Vec<u8>> {
    let int_param = |key: &str, default: i64| {
        parms
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_int().ok())
            .unwrap_or(default)
    };
    match filter {
        StreamFilter::FlateDecode => {
            let decoded = flate::flatedecode(&data)?;
            apply_predictor(decoded, &predictor_params(parms))
        }
        StreamFilter::LZWDecode => {
            let decoded = lzw::lzwdecode_with_earlychange(&data, int_param("EarlyChange", 1))?;
            apply_predictor(decoded, &predictor_params(parms))
        }
        StreamFilter::ASCII85Decode => ascii85::ascii85decode(&data),
        StreamFilter::ASCIIHexDecode => ascii85::asciihexdecode(&data),
        StreamFilter::RunLengthDecode => runlength::rldecode(&data),
        StreamFilter::Crypt => {
            let name = parms
                .and_then(|p| p.get("Name"))
                .and_then(|n| n.as_name().ok())
                .unwrap_or("Identity");
            if name == "Identity" {
                Ok(data)
            } else {
                Err(PdfError::UnsupportedFilter(format!("Crypt/{name}")))
            }
        }
        // image codecs never reach here
        other => Err(PdfError::UnsupportedFilter(other.name().to_string())),
    }
}

fn predictor_params(parms: Option<&HashMap<String, PDFObject>>) -> PredictorParams {
    let defaults = PredictorParams::default();
    let Some(parms) = parms else {
        return defaults;
    };
    let get = |key: &str, default: usize| {
        parms
            .get(key)
            .and_then(|v| v.as_int().ok())
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(default)
    };
    PredictorParams {
        predictor: parms
            .get("Predictor")
            .and_then(|v| v.as_int().ok())
            .unwrap_or(defaults.predictor),
        colors: get("Colors", defaults.colors),
        bits_per_component: get("BitsPerComponent", defaults.bits_per_component),
        columns: get("Columns", defaults.columns),
    }
}
