//! In-memory PDF fixtures shared by the integration tests.

#![allow(dead_code)]

/// Assembles a PDF with a correct classic cross-reference table.
///
/// Object numbers are assigned in insertion order starting at 1.
#[derive(Default)]
pub struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number the next added object will get.
    pub fn next_id(&self) -> u32 {
        self.objects.len() as u32 + 1
    }

    pub fn object(&mut self, body: &str) -> u32 {
        self.raw_object(body.as_bytes().to_vec())
    }

    pub fn raw_object(&mut self, body: Vec<u8>) -> u32 {
        self.objects.push(body);
        self.objects.len() as u32
    }

    /// Add a stream; `/Length` is appended to `dict_entries`.
    pub fn stream(&mut self, dict_entries: &str, data: &[u8]) -> u32 {
        let mut body = format!("<< {dict_entries} /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.raw_object(body)
    }

    /// Serialize with `trailer_entries` in the trailer (`/Size` is added).
    pub fn build(&self, trailer_entries: &str) -> Vec<u8> {
        let mut out = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_pos = out.len();
        out.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", self.objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} {trailer_entries} >>\nstartxref\n{xref_pos}\n%%EOF\n",
                self.objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }
}

/// One page showing `content`, with Helvetica as `/F1`.
pub fn single_page_pdf(content: &str) -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object("<< /Type /Catalog /Pages 2 0 R >>");
    b.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    b.object(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
    );
    b.stream("", content.as_bytes());
    b.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");
    b.object("<< /Title (Sample) /Producer (quire tests) >>");
    b.build("/Root 1 0 R /Info 6 0 R")
}

/// Replace the offset after the last `startxref` with `replacement`.
pub fn corrupt_startxref(pdf: &[u8], replacement: &str) -> Vec<u8> {
    let marker = b"startxref\n";
    let at = pdf
        .windows(marker.len())
        .rposition(|w| w == marker)
        .expect("startxref present")
        + marker.len();
    let end = at + pdf[at..].iter().take_while(|b| b.is_ascii_digit()).count();
    let mut out = pdf[..at].to_vec();
    out.extend_from_slice(replacement.as_bytes());
    out.extend_from_slice(&pdf[end..]);
    out
}
