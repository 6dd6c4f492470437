//! Tests for page attributes, rotation and images.

mod common;

use common::PdfBuilder;
use quire_core::{PDFDocument, PdfError};

/// A minimal baseline JPEG stream: SOI, APP0 (JFIF) and EOI markers.
const JPEG: [u8; 22] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
    0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

fn image_pdf() -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Rotate 90 \
         /Resources << /XObject << /Im4 5 0 R /Im5 6 0 R >> >> /Contents 4 0 R >>",
    );
    b.stream(
        "",
        b"q 200 0 0 100 50 60 cm /Im4 Do Q q 10 0 0 10 0 0 cm BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xff EI Q",
    );
    b.stream(
        "/Type /XObject /Subtype /Image /Width 1 /Height 1 /BitsPerComponent 8 \
         /ColorSpace /DeviceRGB /Filter /DCTDecode",
        &JPEG,
    );
    b.stream(
        "/Type /XObject /Subtype /Image /Width 1 /Height 1 /BitsPerComponent 8 \
         /ColorSpace [/Indexed /DeviceRGB 1 <000000FFFFFF>] /Filter [/ASCIIHexDecode]",
        b"00>",
    );
    b.build("/Root 1 0 R")
}

#[test]
fn resource_image_returns_dct_payload() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let page = doc.get_page(0).unwrap();
    let data = page.get_resource_image(&doc, "/Im4").unwrap();
    assert_eq!(hex::encode(&data), hex::encode(JPEG));
    assert_eq!(page.get_resource_image(&doc, "Im4").unwrap(), data);
}

#[test]
fn resource_image_applies_filters() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let page = doc.get_page(0).unwrap();
    assert_eq!(page.get_resource_image(&doc, "/Im5").unwrap(), vec![0x00]);
}

#[test]
fn missing_resource_image() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let page = doc.get_page(0).unwrap();
    let err = page.get_resource_image(&doc, "/Im9").unwrap_err();
    assert!(matches!(err, PdfError::ResourceNotFound(_)), "{err:?}");
}

#[test]
fn images_lists_painted_images() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let page = doc.get_page(0).unwrap();
    let images = page.images(&doc).unwrap();
    assert_eq!(images.len(), 2);

    assert_eq!(images[0].name, "Im4");
    assert_eq!(images[0].filter.as_deref(), Some("DCTDecode"));
    assert_eq!(images[0].color_space.as_deref(), Some("DeviceRGB"));
    assert_eq!(images[0].data, JPEG.to_vec());

    assert_eq!(images[1].name, "inline-0");
    assert_eq!((images[1].width, images[1].height), (2, 1));
    assert_eq!(images[1].bits_per_component, Some(8));
    assert_eq!(images[1].color_space.as_deref(), Some("G"));
    assert_eq!(images[1].data, vec![0x00, 0xff]);
}

#[test]
fn rotate_counter_clockwise_accepts_multiples_of_90() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let mut page = doc.get_page(0).unwrap();
    assert_eq!(page.rotation(), 90);

    for (degrees, expected) in [(0, 90), (90, 0), (180, 180), (270, 270), (360, 270), (-90, 0)] {
        page.rotate_counter_clockwise(degrees).unwrap();
        assert_eq!(page.rotation(), expected, "after {degrees}");
    }
}

#[test]
fn rotate_rejects_other_angles() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let mut page = doc.get_page(0).unwrap();
    let err = page.rotate_counter_clockwise(45).unwrap_err();
    assert!(matches!(err, PdfError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "Rotation angle must be a multiple of 90");
    assert_eq!(page.rotation(), 90);

    assert!(page.rotate_clockwise(-30).is_err());
    assert_eq!(page.rotation(), 90);
}

#[test]
fn rotate_clockwise_is_the_inverse() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let mut page = doc.get_page(0).unwrap();
    page.rotate_clockwise(90).unwrap();
    assert_eq!(page.rotation(), 180);
    page.rotate_counter_clockwise(90).unwrap();
    assert_eq!(page.rotation(), 90);
}

#[test]
fn rotation_by_huge_multiples_of_90() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let mut page = doc.get_page(0).unwrap();
    // both are multiples of 360
    page.rotate_counter_clockwise(i64::MIN / 90 * 90).unwrap();
    assert_eq!(page.rotation(), 90);
    page.rotate_clockwise(i64::MAX / 90 * 90).unwrap();
    assert_eq!(page.rotation(), 90);

    // congruent to 270
    page.rotate_counter_clockwise(i64::MAX / 90 * 90 - 90).unwrap();
    assert_eq!(page.rotation(), 180);
    page.rotate_clockwise(i64::MIN / 90 * 90 + 270).unwrap();
    assert_eq!(page.rotation(), 90);
}

#[test]
fn rotation_does_not_touch_the_document() {
    let doc = PDFDocument::open(image_pdf()).unwrap();
    let mut page = doc.get_page(0).unwrap();
    page.rotate_clockwise(90).unwrap();
    assert_eq!(doc.get_page(0).unwrap().rotation(), 90);
}

#[test]
fn cropbox_is_read() {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 /CropBox [10 10 90 90] >>");
    b.object("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 100 100.5] /Rotate -90 >>");
    let doc = PDFDocument::open(b.build("/Root 1 0 R")).unwrap();
    let page = doc.get_page(0).unwrap();
    assert_eq!(page.mediabox(), [0.0, 0.0, 100.0, 100.5]);
    assert_eq!(page.cropbox(), [10.0, 10.0, 90.0, 90.0]);
    assert_eq!(page.rotation(), 270);
}
