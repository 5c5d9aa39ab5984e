//! PDF output.
//!
//! Replays [`RecordedPage`]s into a printpdf document using the built-in
//! Times faces. An optional watermark image is drawn underneath the text of
//! every page.

use crate::canvas::{PageGeometry, RecordedPage};
use crate::font::Font;
use printpdf::image_crate::{self, DynamicImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load font {font}: {reason}")]
    Font { font: &'static str, reason: String },

    #[error("Unreadable watermark image: {0}")]
    Image(String),

    #[error("Failed to serialize document: {0}")]
    Save(String),
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, RenderError> {
        let add = |font: Font, builtin: BuiltinFont| {
            doc.add_builtin_font(builtin).map_err(|e| RenderError::Font {
                font: font.postscript_name(),
                reason: e.to_string(),
            })
        };
        Ok(Self {
            regular: add(Font::Regular, BuiltinFont::TimesRoman)?,
            bold: add(Font::Bold, BuiltinFont::TimesBold)?,
            italic: add(Font::Italic, BuiltinFont::TimesItalic)?,
        })
    }

    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Italic => &self.italic,
        }
    }
}

/// A multi-page catalog document.
pub struct PdfBook {
    doc: PdfDocumentReference,
    fonts: Fonts,
    geometry: PageGeometry,
    watermark: Option<DynamicImage>,
    pages: usize,
}

impl PdfBook {
    pub fn new(title: &str, geometry: PageGeometry) -> Result<Self, RenderError> {
        let doc = PdfDocument::empty(title);
        let fonts = Fonts::load(&doc)?;
        Ok(Self {
            doc,
            fonts,
            geometry,
            watermark: None,
            pages: 0,
        })
    }

    /// Decode a PNG or JPEG to stamp on every page added afterwards.
    pub fn set_watermark(&mut self, image_bytes: &[u8]) -> Result<(), RenderError> {
        let image = image_crate::load_from_memory(image_bytes)
            .map_err(|e| RenderError::Image(e.to_string()))?;
        self.watermark = Some(image);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Append one page and replay the recording onto it.
    pub fn add_page(&mut self, page: &RecordedPage) {
        let g = self.geometry;
        let (page_index, layer_index) =
            self.doc
                .add_page(Mm::from(Pt(g.width)), Mm::from(Pt(g.height)), "Catalog");
        let layer = self.doc.get_page(page_index).get_layer(layer_index);

        if let Some(image) = &self.watermark {
            stamp(image, &layer, g);
        }

        for op in &page.ops {
            let baseline = g.height - op.y - op.font.ascent_at(op.size);
            layer.use_text(
                op.text.clone(),
                op.size,
                Mm::from(Pt(op.x)),
                Mm::from(Pt(baseline)),
                self.fonts.get(op.font),
            );
        }
        self.pages += 1;
        debug!(page = self.pages, ops = page.ops.len(), "Page written");
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, RenderError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| RenderError::Save(e.to_string()))
    }
}

/// Scale the image to the content width and center it on the page.
fn stamp(image: &DynamicImage, layer: &PdfLayerReference, g: PageGeometry) {
    let (px_width, px_height) = (image.width() as f32, image.height() as f32);
    if px_width == 0.0 || px_height == 0.0 {
        return;
    }
    let target_width = g.content_width();
    // At `dpi`, one pixel is 72 / dpi points.
    let dpi = px_width * 72.0 / target_width;
    let target_height = px_height * 72.0 / dpi;
    let x = (g.width - target_width) / 2.0;
    let y = (g.height - target_height) / 2.0;

    Image::from_dynamic_image(image).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm::from(Pt(x))),
            translate_y: Some(Mm::from(Pt(y))),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, TextOp};

    fn sample_page() -> RecordedPage {
        let mut page = RecordedPage::new();
        page.draw_text(TextOp {
            text: "SKY BOLT".into(),
            font: Font::Bold,
            size: 14.0,
            x: 22.0,
            y: 40.0,
        });
        page
    }

    #[test]
    fn writes_pdf_bytes() {
        let mut book = PdfBook::new("Test Catalog", PageGeometry::HALF_LETTER).unwrap();
        book.add_page(&sample_page());
        book.add_page(&sample_page());
        assert_eq!(book.page_count(), 2);
        let bytes = book.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn garbage_watermark_is_rejected() {
        let mut book = PdfBook::new("Test Catalog", PageGeometry::HALF_LETTER).unwrap();
        let err = book.set_watermark(b"not an image").unwrap_err();
        assert!(matches!(err, RenderError::Image(_)));
    }
}
