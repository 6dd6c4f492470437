//! Tests for page text extraction.

mod common;

use common::{PdfBuilder, single_page_pdf};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use quire_core::PDFDocument;
use std::io::Write;

fn extract(pdf: Vec<u8>, tj_sep: &str, tj_array_sep: &str) -> String {
    let doc = PDFDocument::open(pdf).unwrap();
    let page = doc.get_page(0).unwrap();
    page.extract_text(&doc, tj_sep, tj_array_sep).unwrap()
}

#[test]
fn tj_and_tj_array_output() {
    let content = "BT /F1 12 Tf 72 700 Td (Hello) Tj [(Wor) -40 (ld)] TJ ET";
    assert_eq!(extract(single_page_pdf(content), "", ""), "Hello\nWorld\n");
    assert_eq!(extract(single_page_pdf(content), "*", "|"), "*Hello\n|Wor|ld\n");
}

#[test]
fn line_operators() {
    let content = "BT /F1 12 Tf 14 TL (a) Tj T* (b) ' 1 2 (c) \" ET";
    assert_eq!(extract(single_page_pdf(content), "", ""), "a\n\n\nb\nc");
}

#[test]
fn malformed_operand_does_not_end_extraction() {
    let content = "BT (before) Tj <not hex> Tj (after) Tj ET";
    assert_eq!(extract(single_page_pdf(content), "", ""), "before\nafter\n");
}

#[test]
fn extraction_is_repeatable() {
    let doc = PDFDocument::open(single_page_pdf("BT (Same) Tj [(every) ( time)] TJ ET")).unwrap();
    let page = doc.get_page(0).unwrap();
    let first = page.extract_text(&doc, "", "").unwrap();
    let second = page.extract_text(&doc, "", "").unwrap();
    let again = doc.get_page(0).unwrap().extract_text(&doc, "", "").unwrap();
    assert_eq!(first, second);
    assert_eq!(first, again);
}

#[test]
fn byte_strings_are_not_text() {
    let content = "BT (visible) Tj <0102> Tj ET";
    assert_eq!(extract(single_page_pdf(content), "", ""), "visible\n");
}

#[test]
fn utf16_strings_are_decoded() {
    let content = "BT <FEFF0048006900203042> Tj ET";
    assert_eq!(extract(single_page_pdf(content), "", ""), "Hi \u{3042}\n");
}

#[test]
fn contents_array_is_joined() {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents [4 0 R 5 0 R] >>");
    // the operator is split across the two streams
    b.stream("", b"BT (first) Tj (second)");
    b.stream("", b"Tj ET");
    let text = extract(b.build("/Root 1 0 R"), "", "");
    assert_eq!(text, "first\nsecond\n");
}

#[test]
fn compressed_content_stream() {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"BT (Deflated) Tj ET").unwrap();
    let compressed = encoder.finish().unwrap();

    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>");
    b.stream("/Filter /FlateDecode", &compressed);
    assert_eq!(extract(b.build("/Root 1 0 R"), "", ""), "Deflated\n");
}

#[test]
fn filter_chain_with_indirect_filter_name() {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>");
    b.stream("/Filter 5 0 R", b"425420284865782920546a204554>");
    b.object("/ASCIIHexDecode");
    assert_eq!(extract(b.build("/Root 1 0 R"), "", ""), "Hex\n");
}

fn nested_forms_pdf() -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /XObject << /Fm1 5 0 R >> >> /Contents 4 0 R >>",
    );
    b.stream("", b"BT (page) Tj ET q 1 0 0 1 10 10 cm /Fm1 Do Q BT (after) Tj ET");
    b.stream(
        "/Type /XObject /Subtype /Form /BBox [0 0 100 100] \
         /Resources << /XObject << /Fm2 6 0 R >> >>",
        b"BT (form) Tj ET /Fm2 Do",
    );
    // refers back to itself
    b.stream(
        "/Type /XObject /Subtype /Form /BBox [0 0 100 100] \
         /Resources << /XObject << /Fm2 6 0 R >> >>",
        b"BT (nested) Tj ET /Fm2 Do",
    );
    b.build("/Root 1 0 R")
}

#[test]
fn form_xobject_text_is_not_extracted() {
    assert_eq!(extract(nested_forms_pdf(), "", ""), "page\nafter\n");
}

#[test]
fn text_runs_follow_form_xobjects() {
    let doc = PDFDocument::open(nested_forms_pdf()).unwrap();
    let runs = doc.get_page(0).unwrap().text_runs(&doc).unwrap();
    let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
    // Fm2 refers back to itself and runs once
    assert_eq!(texts, ["page", "form", "nested", "after"]);
}

#[test]
fn text_runs_report_position_and_font() {
    let doc = PDFDocument::open(single_page_pdf(
        "BT /F1 12 Tf 72 700 Td (One) Tj 0 -20 Td [(Tw) 10 (o)] TJ ET",
    ))
    .unwrap();
    let runs = doc.get_page(0).unwrap().text_runs(&doc).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text, "One");
    assert_eq!(runs[0].origin, (72.0, 700.0));
    assert_eq!(runs[0].fontname.as_deref(), Some("F1"));
    assert_eq!(runs[0].fontsize, 12.0);
    assert_eq!(runs[1].text, "Two");
    assert_eq!(runs[1].origin, (72.0, 680.0));
}

#[test]
fn next_line_uses_leading() {
    let doc = PDFDocument::open(single_page_pdf("BT 14 TL 72 700 Td (a) Tj T* (b) Tj ET")).unwrap();
    let runs = doc.get_page(0).unwrap().text_runs(&doc).unwrap();
    assert_eq!(runs[1].origin, (72.0, 686.0));
}

#[test]
fn text_runs_carry_spacing_and_render_mode() {
    let doc = PDFDocument::open(single_page_pdf(
        "BT /F1 10 Tf 1.5 Tc 4 Tw 80 Tz 3 Tr (Hidden) Tj 0 Tr 0.5 2 (Shown) \" ET",
    ))
    .unwrap();
    let runs = doc.get_page(0).unwrap().text_runs(&doc).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(
        (runs[0].charspace, runs[0].wordspace, runs[0].scaling, runs[0].render),
        (1.5, 4.0, 80.0, 3)
    );
    assert_eq!(runs[1].text, "Shown");
    assert_eq!((runs[1].wordspace, runs[1].charspace), (0.5, 2.0));
    assert_eq!(runs[1].render, 0);
}

#[test]
fn unreadable_content_stream_is_skipped() {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents [4 0 R 5 0 R] >>");
    b.stream("/Filter /NoSuchFilter", b"garbage");
    b.stream("", b"BT (kept) Tj ET");
    assert_eq!(extract(b.build("/Root 1 0 R"), "", ""), "kept\n");
}

#[test]
fn page_without_contents_is_empty() {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
    assert_eq!(extract(b.build("/Root 1 0 R"), "", ""), "");
}

#[test]
fn predictor_columns_larger_than_the_stream() {
    // one PNG row with filter type 0 in front of the content
    let mut row = vec![0u8];
    row.extend_from_slice(b"BT (Predicted) Tj ET");
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&row).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>");
    b.stream(
        "/Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 4611686018427387904 >>",
        &compressed,
    );
    assert_eq!(extract(b.build("/Root 1 0 R"), "", ""), "Predicted\n");
}

#[test]
fn predictor_size_overflow_skips_the_stream() {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"\x00BT (lost) Tj ET").unwrap();
    let compressed = encoder.finish().unwrap();

    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents [4 0 R 5 0 R] >>");
    b.stream(
        "/Filter /FlateDecode /DecodeParms << /Predictor 12 /Colors 9223372036854775807 /Columns 4 >>",
        &compressed,
    );
    b.stream("", b"BT (kept) Tj ET");
    assert_eq!(extract(b.build("/Root 1 0 R"), "", ""), "kept\n");
}
