//! Tests for the stream codecs against published vectors.

use quire_core::PDFObject;
use quire_core::codec::arcfour::Arcfour;
use quire_core::codec::ascii85::{ascii85decode, asciihexdecode};
use quire_core::codec::filters::decode_stream_data;
use quire_core::codec::lzw::lzwdecode;
use std::collections::HashMap;

#[test]
fn arcfour_vectors() {
    let cases: [(&[u8], &[u8], &str); 3] = [
        (b"Key", b"Plaintext", "bbf316e8d940af0ad3"),
        (b"Wiki", b"pedia", "1021bf0420"),
        (b"Secret", b"Attack at dawn", "45a01f645fc35b383552544b9bf5"),
    ];
    for (key, plain, expected) in cases {
        let out = Arcfour::new(key).process(plain);
        assert_eq!(hex::encode(&out), expected);
        assert_eq!(Arcfour::new(key).process(&out), plain);
    }
}

#[test]
fn ascii85_end_markers() {
    assert_eq!(ascii85decode(b"9jqo^BlbD-BleB1DJ+*+F(f,q").unwrap(), b"Man is distinguished");
    let variants: [&[u8]; 4] = [
        b"E,9)oF*2M7/c~>",
        b"E,9)oF*2M7/c",
        b"E,9)oF*2M7/c~",
        b"<~E,9)oF*2M7/c~\n>",
    ];
    for encoded in variants {
        assert_eq!(ascii85decode(encoded).unwrap(), b"pleasure.");
    }
    assert_eq!(ascii85decode(b"zE,9)oF*2M7/c~>").unwrap(), b"\0\0\0\0pleasure.");
}

#[test]
fn asciihex_ignores_whitespace() {
    assert_eq!(asciihexdecode(b"61 62 2e6364   65>").unwrap(), b"ab.cde");
    assert_eq!(asciihexdecode(b"61 62 2e6364   657>").unwrap(), b"ab.cdep");
}

#[test]
fn lzw_early_change_vector() {
    let decoded = lzwdecode(b"\x80\x0b\x60\x50\x22\x0c\x0c\x85\x01").unwrap();
    assert_eq!(decoded, b"-----A---B");
}

#[test]
fn chained_filters_apply_in_order() {
    // ASCIIHex wrapping an ASCII85 payload
    let attrs = HashMap::from([(
        "Filter".to_string(),
        PDFObject::Array(vec![
            PDFObject::Name("AHx".into()),
            PDFObject::Name("ASCII85Decode".into()),
        ]),
    )]);
    let payload = hex::encode(b"87cURD]i,\"Ebo7~>");
    let decoded = decode_stream_data(payload.as_bytes(), &attrs).unwrap();
    assert_eq!(decoded, b"Hello World");
}
