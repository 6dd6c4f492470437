//! Devices receive the output of [`PDFPageInterpreter`].
//!
//! The interpreter reports text-showing operators and painted images; each
//! device keeps what it needs. [`TextExtractor`] builds the plain text of a
//! page, [`TextRunCollector`] records positioned runs and [`ImageCollector`]
//! gathers image payloads.
//!
//! [`PDFPageInterpreter`]: super::interpreter::PDFPageInterpreter

use crate::model::objects::{PDFObject, PDFStream};
use crate::model::state::PDFTextState;
use crate::utils::{Matrix, Point, Rect, apply_matrix_pt, decode_text, decode_text_strict, mult_matrix};

/// A text-showing or line-advancing operator, with its string operands.
#[derive(Debug, Clone, Copy)]
pub enum TextOp<'s> {
    /// `T*`
    NextLine,
    /// `Tj`
    Show(&'s [u8]),
    /// `TJ`: strings interleaved with positioning adjustments
    ShowArray(&'s [PDFObject]),
    /// `'`; `None` when the operand is not a string
    NextLineShow(Option<&'s [u8]>),
    /// `"`; the string is the third operand
    SpacedShow(Option<&'s [u8]>),
}

/// Output interface for page interpretation. All methods default to no-ops.
pub trait PDFDevice {
    fn begin_page(&mut self, _pageid: u32, _mediabox: Rect, _ctm: Matrix) {}

    fn end_page(&mut self, _pageid: u32) {}

    /// Entering a form XObject painted with `matrix`.
    fn begin_figure(&mut self, _name: &str, _matrix: Matrix) {}

    fn end_figure(&mut self, _name: &str) {}

    /// `textstate` reflects any line move the operator performed.
    fn render_text(&mut self, _op: TextOp<'_>, _textstate: &PDFTextState, _ctm: Matrix) {}

    /// Paint an image XObject or inline image; `ctm` maps the unit square
    /// onto the page.
    fn render_image(&mut self, _name: &str, _stream: &PDFStream, _ctm: Matrix) {}
}

/// Plain text in operator order.
///
/// Only strings that decode as text strings are kept; byte strings in
/// custom font encodings are skipped. Text shown inside form XObjects is
/// not part of the output.
#[derive(Debug, Default)]
pub struct TextExtractor {
    tj_sep: String,
    tj_array_sep: String,
    text: String,
    /// Nesting depth of the form XObjects being executed
    figure_depth: usize,
}

impl TextExtractor {
    pub fn new(tj_sep: &str, tj_array_sep: &str) -> Self {
        Self {
            tj_sep: tj_sep.to_string(),
            tj_array_sep: tj_array_sep.to_string(),
            text: String::new(),
            figure_depth: 0,
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl PDFDevice for TextExtractor {
    fn begin_figure(&mut self, _name: &str, _matrix: Matrix) {
        self.figure_depth += 1;
    }

    fn end_figure(&mut self, _name: &str) {
        self.figure_depth = self.figure_depth.saturating_sub(1);
    }

    fn render_text(&mut self, op: TextOp<'_>, _textstate: &PDFTextState, _ctm: Matrix) {
        if self.figure_depth > 0 {
            return;
        }
        match op {
            TextOp::NextLine => self.text.push('\n'),
            TextOp::Show(s) => {
                if let Some(t) = decode_text_strict(s) {
                    self.text.push_str(&self.tj_sep);
                    self.text.push_str(&t);
                    self.text.push('\n');
                }
            }
            TextOp::ShowArray(items) => {
                for item in items {
                    if let PDFObject::String(s) = item
                        && let Some(t) = decode_text_strict(s)
                    {
                        self.text.push_str(&self.tj_array_sep);
                        self.text.push_str(&t);
                    }
                }
                self.text.push('\n');
            }
            TextOp::NextLineShow(s) => {
                self.text.push('\n');
                if let Some(t) = s.and_then(decode_text_strict) {
                    self.text.push_str(&t);
                }
            }
            TextOp::SpacedShow(s) => {
                if let Some(t) = s.and_then(decode_text_strict) {
                    self.text.push('\n');
                    self.text.push_str(&t);
                }
            }
        }
    }
}

/// Text shown by one operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Start of the run in user space.
    pub origin: Point,
    /// Font resource name set by `Tf`.
    pub fontname: Option<String>,
    pub fontsize: f64,
    /// Extra space after each glyph (`Tc`), in unscaled text units.
    pub charspace: f64,
    /// Extra space after each ASCII space (`Tw`).
    pub wordspace: f64,
    /// Horizontal scaling in percent (`Tz`).
    pub scaling: f64,
    /// Rendering mode (`Tr`); mode 3 paints nothing.
    pub render: i32,
}

#[derive(Debug, Default)]
pub struct TextRunCollector {
    runs: Vec<TextRun>,
}

impl TextRunCollector {
    pub fn into_runs(self) -> Vec<TextRun> {
        self.runs
    }
}

impl PDFDevice for TextRunCollector {
    fn render_text(&mut self, op: TextOp<'_>, textstate: &PDFTextState, ctm: Matrix) {
        let text = match op {
            TextOp::NextLine => return,
            TextOp::Show(s) => decode_text(s),
            TextOp::ShowArray(items) => items
                .iter()
                .filter_map(|item| item.as_string().ok())
                .map(decode_text)
                .collect(),
            TextOp::NextLineShow(s) | TextOp::SpacedShow(s) => match s {
                Some(s) => decode_text(s),
                None => return,
            },
        };
        if text.is_empty() {
            return;
        }
        let origin = apply_matrix_pt(mult_matrix(textstate.matrix, ctm), (0.0, textstate.rise));
        self.runs.push(TextRun {
            text,
            origin,
            fontname: textstate.fontname.clone(),
            fontsize: textstate.fontsize,
            charspace: textstate.charspace,
            wordspace: textstate.wordspace,
            scaling: textstate.scaling,
            render: textstate.render,
        });
    }
}

/// An image painted on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// XObject resource name, or `inline-N` for the Nth inline image.
    pub name: String,
    pub width: i64,
    pub height: i64,
    pub bits_per_component: Option<i64>,
    /// Color space name; for array color spaces, the family name.
    pub color_space: Option<String>,
    /// Last filter in the chain, which is the image codec for encoded images.
    pub filter: Option<String>,
    /// Stream data with the non-image filters removed.
    pub data: Vec<u8>,
    /// Maps the unit square onto the page.
    pub matrix: Matrix,
}

#[derive(Debug, Default)]
pub struct ImageCollector {
    images: Vec<PageImage>,
}

impl ImageCollector {
    pub fn into_images(self) -> Vec<PageImage> {
        self.images
    }
}

impl PDFDevice for ImageCollector {
    fn render_image(&mut self, name: &str, stream: &PDFStream, ctm: Matrix) {
        let data = match stream.get_data() {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(name, %err, "skipping undecodable image");
                return;
            }
        };
        let int = |key: &str| stream.get(key).and_then(|v| v.as_int().ok());
        let color_space = stream.get("ColorSpace").and_then(|cs| match cs {
            PDFObject::Name(n) => Some(n.clone()),
            PDFObject::Array(items) => items.first()?.as_name().ok().map(str::to_string),
            _ => None,
        });
        let filter = stream.get("Filter").and_then(|f| match f {
            PDFObject::Name(n) => Some(n.clone()),
            PDFObject::Array(items) => items.last()?.as_name().ok().map(str::to_string),
            _ => None,
        });
        self.images.push(PageImage {
            name: name.to_string(),
            width: int("Width").unwrap_or(0),
            height: int("Height").unwrap_or(0),
            bits_per_component: int("BitsPerComponent"),
            color_space,
            filter,
            data,
            matrix: ctm,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;
    use std::collections::HashMap;

    #[test]
    fn text_extractor_output_rules() {
        let state = PDFTextState::new();
        let mut dev = TextExtractor::new("<", "|");
        dev.render_text(TextOp::Show(b"one"), &state, MATRIX_IDENTITY);
        dev.render_text(
            TextOp::ShowArray(&[
                PDFObject::String(b"t".to_vec()),
                PDFObject::Int(-120),
                PDFObject::String(b"wo".to_vec()),
            ]),
            &state,
            MATRIX_IDENTITY,
        );
        dev.render_text(TextOp::NextLine, &state, MATRIX_IDENTITY);
        dev.render_text(TextOp::NextLineShow(Some(&b"three"[..])), &state, MATRIX_IDENTITY);
        dev.render_text(TextOp::SpacedShow(Some(&b"four"[..])), &state, MATRIX_IDENTITY);
        assert_eq!(dev.into_text(), "<one\n|t|wo\n\n\nthree\nfour");
    }

    #[test]
    fn text_inside_figures_is_dropped() {
        let state = PDFTextState::new();
        let mut dev = TextExtractor::new("", "");
        dev.render_text(TextOp::Show(b"page"), &state, MATRIX_IDENTITY);
        dev.begin_figure("Fm1", MATRIX_IDENTITY);
        dev.render_text(TextOp::Show(b"form"), &state, MATRIX_IDENTITY);
        dev.begin_figure("Fm2", MATRIX_IDENTITY);
        dev.render_text(TextOp::NextLine, &state, MATRIX_IDENTITY);
        dev.end_figure("Fm2");
        dev.render_text(TextOp::Show(b"still form"), &state, MATRIX_IDENTITY);
        dev.end_figure("Fm1");
        dev.render_text(TextOp::Show(b"after"), &state, MATRIX_IDENTITY);
        assert_eq!(dev.into_text(), "page\nafter\n");
    }

    #[test]
    fn byte_strings_are_skipped() {
        let state = PDFTextState::new();
        let mut dev = TextExtractor::new("", "");
        dev.render_text(TextOp::Show(b"\x01\x02"), &state, MATRIX_IDENTITY);
        dev.render_text(TextOp::SpacedShow(None), &state, MATRIX_IDENTITY);
        dev.render_text(TextOp::Show(b"\xfe\xff\x00A"), &state, MATRIX_IDENTITY);
        assert_eq!(dev.into_text(), "A\n");
    }

    #[test]
    fn run_origin_uses_text_matrix_and_ctm() {
        let mut state = PDFTextState::new();
        state.matrix = (1.0, 0.0, 0.0, 1.0, 72.0, 700.0);
        state.fontname = Some("F1".into());
        state.fontsize = 12.0;
        let mut dev = TextRunCollector::default();
        dev.render_text(TextOp::Show(b"Hi"), &state, (2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        let runs = dev.into_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hi");
        assert_eq!(runs[0].origin, (144.0, 1400.0));
        assert_eq!(runs[0].fontname.as_deref(), Some("F1"));
        assert_eq!(runs[0].scaling, 100.0);
        assert_eq!(runs[0].render, 0);
    }

    #[test]
    fn image_collector_reads_dictionary() {
        let attrs = HashMap::from([
            ("Width".to_string(), PDFObject::Int(2)),
            ("Height".to_string(), PDFObject::Int(1)),
            ("BitsPerComponent".to_string(), PDFObject::Int(8)),
            ("ColorSpace".to_string(), PDFObject::Name("DeviceGray".into())),
        ]);
        let stream = PDFStream::new(attrs, b"\x00\xff".to_vec());
        let mut dev = ImageCollector::default();
        dev.render_image("Im1", &stream, MATRIX_IDENTITY);
        let images = dev.into_images();
        assert_eq!(images[0].width, 2);
        assert_eq!(images[0].color_space.as_deref(), Some("DeviceGray"));
        assert_eq!(images[0].filter, None);
        assert_eq!(images[0].data, b"\x00\xff");
    }
}
