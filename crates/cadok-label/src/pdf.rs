// crates/cadok-label/src/pdf.rs
// ============================================================================
// Module: Minimal PDF Renderer
// Description: Single-page PDF synthesis for delivery labels.
// Purpose: Render label documents without an external PDF dependency.
// Dependencies: crate::document
// ============================================================================

//! ## Overview
//! A deliberately small PDF 1.4 writer: one page, Helvetica text, optional
//! JPEG images embedded verbatim via `DCTDecode`. Content streams are
//! uncompressed, which keeps label text greppable in tests and support
//! tooling. Text is encoded as Latin-1; unmappable characters degrade to `?`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::document::DocumentRenderer;
use crate::document::ImageBlock;
use crate::document::LabelBlock;
use crate::document::LabelDocument;
use crate::document::RenderError;
use crate::document::TextBlock;

// ============================================================================
// SECTION: Renderer
// ============================================================================

/// Built-in single-page PDF renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalPdfRenderer;

impl DocumentRenderer for MinimalPdfRenderer {
    fn render(&self, document: &LabelDocument) -> Result<Vec<u8>, RenderError> {
        if document.blocks.is_empty() {
            return Err(RenderError::Backend("document has no blocks".to_string()));
        }
        Ok(write_pdf(document))
    }
}

// ============================================================================
// SECTION: Content Stream
// ============================================================================

/// Escapes text for a PDF literal string, degrading non-Latin-1 to `?`.
fn escape_pdf_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            _ => {
                let code = u32::from(ch);
                if code <= 0xFF {
                    out.push(u8::try_from(code).unwrap_or(b'?'));
                } else {
                    out.push(b'?');
                }
            }
        }
    }
    out
}

/// Appends a text block to the content stream.
fn emit_text(stream: &mut Vec<u8>, block: &TextBlock) {
    stream.extend_from_slice(b"BT\n");
    stream.extend_from_slice(
        format!("/F1 {:.1} Tf\n{:.1} TL\n{:.1} {:.1} Td\n", block.font_size_pt,
            block.leading_pt, block.x_pt, block.y_pt)
            .as_bytes(),
    );
    for (index, line) in block.lines.iter().enumerate() {
        if index > 0 {
            stream.extend_from_slice(b"T*\n");
        }
        stream.push(b'(');
        stream.extend_from_slice(&escape_pdf_text(line));
        stream.extend_from_slice(b") Tj\n");
    }
    stream.extend_from_slice(b"ET\n");
}

/// Appends an image placement to the content stream.
fn emit_image(stream: &mut Vec<u8>, block: &ImageBlock, image_index: usize) {
    stream.extend_from_slice(
        format!(
            "q\n{} 0 0 {} {} {} cm\n/Im{image_index} Do\nQ\n",
            block.width_pt, block.height_pt, block.x_pt, block.y_pt
        )
        .as_bytes(),
    );
}

/// Builds the page content stream.
fn build_content(document: &LabelDocument) -> Vec<u8> {
    let mut stream = Vec::new();
    let mut image_index = 0_usize;
    for block in &document.blocks {
        match block {
            LabelBlock::Text(text) => emit_text(&mut stream, text),
            LabelBlock::Image(image) => {
                emit_image(&mut stream, image, image_index);
                image_index += 1;
            }
        }
    }
    stream
}

// ============================================================================
// SECTION: Document Assembly
// ============================================================================

/// Incremental PDF writer tracking object offsets for the xref table.
struct PdfWriter {
    /// Output buffer.
    buffer: Vec<u8>,
    /// Byte offset of each written object, in object-number order.
    offsets: Vec<usize>,
}

impl PdfWriter {
    /// Creates a writer with the PDF header in place.
    fn new() -> Self {
        Self {
            buffer: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Writes one object body (without the `obj`/`endobj` wrapper).
    fn object(&mut self, body: &[u8]) {
        self.offsets.push(self.buffer.len());
        let number = self.offsets.len();
        self.buffer.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        self.buffer.extend_from_slice(body);
        self.buffer.extend_from_slice(b"\nendobj\n");
    }

    /// Writes a stream object with the given dictionary extras.
    fn stream_object(&mut self, dict_extras: &str, stream: &[u8]) {
        self.offsets.push(self.buffer.len());
        let number = self.offsets.len();
        self.buffer.extend_from_slice(
            format!("{number} 0 obj\n<< {dict_extras} /Length {} >>\nstream\n", stream.len())
                .as_bytes(),
        );
        self.buffer.extend_from_slice(stream);
        self.buffer.extend_from_slice(b"\nendstream\nendobj\n");
    }

    /// Finishes the file with xref table and trailer.
    fn finish(mut self, root_object: usize) -> Vec<u8> {
        let xref_offset = self.buffer.len();
        let count = self.offsets.len() + 1;
        self.buffer.extend_from_slice(format!("xref\n0 {count}\n").as_bytes());
        self.buffer.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            self.buffer.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.buffer.extend_from_slice(
            format!(
                "trailer\n<< /Size {count} /Root {root_object} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
            )
            .as_bytes(),
        );
        self.buffer
    }
}

/// Assembles the full single-page PDF.
fn write_pdf(document: &LabelDocument) -> Vec<u8> {
    let images: Vec<&ImageBlock> = document
        .blocks
        .iter()
        .filter_map(|block| match block {
            LabelBlock::Image(image) => Some(image),
            LabelBlock::Text(_) => None,
        })
        .collect();
    let content = build_content(document);

    // Object layout: 1 catalog, 2 pages, 3 page, 4 font, 5 content,
    // then one object per image.
    let mut writer = PdfWriter::new();
    writer.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");

    let mut xobjects = String::new();
    for (index, _) in images.iter().enumerate() {
        xobjects.push_str(&format!("/Im{index} {} 0 R ", 6 + index));
    }
    writer.object(
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.1} {:.1}] \
             /Resources << /Font << /F1 4 0 R >> /XObject << {xobjects}>> >> \
             /Contents 5 0 R >>",
            document.page_width_pt, document.page_height_pt
        )
        .as_bytes(),
    );
    writer.object(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");
    writer.stream_object("", &content);
    for image in images {
        writer.stream_object(
            &format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                image.width_px, image.height_px
            ),
            &image.jpeg,
        );
    }
    writer.finish(1)
}
