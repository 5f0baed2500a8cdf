use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, PdfDocumentReference, Px,
};
use std::io::BufWriter;

use crate::core::{px_to_mm, CertificateError, CertificateResult, Orientation, CANVAS_DPI};
use crate::render::Raster;

const LAYER_NAME: &str = "Certificate";

/// Builds a PDF with one full-bleed page per raster.
///
/// The document only comes into existence with its first page, so an
/// assembler that never receives a raster produces no file at all.
pub struct PdfAssembler {
    title: String,
    document: Option<PdfDocumentReference>,
    pages: usize,
}

impl PdfAssembler {
    pub fn new(title: impl Into<String>) -> Self {
        PdfAssembler {
            title: title.into(),
            document: None,
            pages: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn add_page(&mut self, raster: &Raster) -> CertificateResult<()> {
        let (width_mm, height_mm) = page_size_mm(raster);

        let (document, page, layer) = match self.document.take() {
            Some(document) => {
                let (page, layer) = document.add_page(Mm(width_mm), Mm(height_mm), LAYER_NAME);
                (document, page, layer)
            }
            None => PdfDocument::new(&self.title, Mm(width_mm), Mm(height_mm), LAYER_NAME),
        };
        let layer = document.get_page(page).get_layer(layer);

        let image = Image::from(ImageXObject {
            width: Px(raster.width as usize),
            height: Px(raster.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: raster.image.as_raw().clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // Pixels at 96·ratio dpi fill the page exactly
        image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(CANVAS_DPI * raster.pixel_ratio),
                ..Default::default()
            },
        );

        self.document = Some(document);
        self.pages += 1;
        Ok(())
    }

    /// Serialized document, `None` when no page was ever added.
    pub fn finish(self) -> CertificateResult<Option<Vec<u8>>> {
        let Some(document) = self.document else {
            return Ok(None);
        };

        let mut writer = BufWriter::new(Vec::new());
        document
            .save(&mut writer)
            .map_err(|e| CertificateError::Pdf(e.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| CertificateError::Pdf(e.to_string()))?;
        Ok(Some(bytes))
    }
}

/// Page size in millimetres for a raster captured at its pixel ratio.
pub fn page_size_mm(raster: &Raster) -> (f32, f32) {
    (
        px_to_mm(raster.width, raster.pixel_ratio),
        px_to_mm(raster.height, raster.pixel_ratio),
    )
}

pub fn page_orientation(raster: &Raster) -> Orientation {
    Orientation::from_size(raster.width, raster.height)
}

/// A single-page PDF for one raster.
pub fn single_page_pdf(title: &str, raster: &Raster) -> CertificateResult<Vec<u8>> {
    let mut assembler = PdfAssembler::new(title);
    assembler.add_page(raster)?;
    assembler
        .finish()?
        .ok_or_else(|| CertificateError::Pdf("Single-page document has no page".to_string()))
}
