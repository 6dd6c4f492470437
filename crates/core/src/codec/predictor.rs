//! PNG and TIFF predictors applied after Flate / LZW decoding.

use crate::error::{PdfError, Result};

/// Parameters taken from a `/DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    pub predictor: i64,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    fn bits_per_pixel(&self) -> Result<usize> {
        self.colors
            .checked_mul(self.bits_per_component)
            .ok_or_else(|| PdfError::DecodeError("predictor pixel size overflows".into()))
    }

    fn bytes_per_pixel(&self) -> Result<usize> {
        Ok(self.bits_per_pixel()?.div_ceil(8).max(1))
    }

    fn bytes_per_row(&self) -> Result<usize> {
        self.bits_per_pixel()?
            .checked_mul(self.columns)
            .map(|bits| bits.div_ceil(8))
            .ok_or_else(|| PdfError::DecodeError("predictor row size overflows".into()))
    }
}

/// Undo the predictor described by `params`.
pub fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data),
        2 => decode_tiff(&data, params),
        10..=15 => decode_png(&data, params),
        other => Err(PdfError::DecodeError(format!("unsupported predictor {other}"))),
    }
}

fn decode_tiff(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(PdfError::DecodeError(format!(
            "TIFF predictor with {} bits per component",
            params.bits_per_component
        )));
    }
    let bpp = params.bytes_per_pixel()?;
    let row_len = params.bytes_per_row()?.clamp(1, data.len().max(1));
    let mut result = data.to_vec();
    for row in result.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    Ok(result)
}

/// PNG rows carry a leading filter-type byte. A short final row is decoded
/// as far as it goes.
fn decode_png(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let bpp = params.bytes_per_pixel()?;
    // no row can be longer than the data itself
    let row_len = params.bytes_per_row()?.min(data.len());
    let mut result = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_len];

    for chunk in data.chunks(row_len + 1) {
        let filter = chunk[0];
        let raw = &chunk[1..];
        let mut row = vec![0u8; raw.len()];

        for i in 0..raw.len() {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let pred = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(PdfError::DecodeError(format!(
                        "unknown PNG filter type {other}"
                    )));
                }
            };
            row[i] = raw[i].wrapping_add(pred);
        }

        result.extend_from_slice(&row);
        prev[..row.len()].copy_from_slice(&row);
    }

    Ok(result)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
