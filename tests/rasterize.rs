mod common;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use certificate_generator::core::{Orientation, PaperSize};
use certificate_generator::generators::CertificateExporter;
use certificate_generator::models::{LayoutConfig, TemplateId};
use certificate_generator::render::{AssetResolver, FontRegistry, RasterOptions, Rasterizer, ResvgRasterizer};
use certificate_generator::templates::TemplateRegistry;
use common::job;

fn rasterizer() -> ResvgRasterizer {
    ResvgRasterizer::new(
        Arc::new(TemplateRegistry::new()),
        Arc::new(FontRegistry::new(None)),
        Arc::new(AssetResolver::new(reqwest::Client::new(), 60)),
        RasterOptions::default(),
    )
}

#[tokio::test]
async fn captures_at_twice_the_canvas_density() {
    let raster = rasterizer().rasterize(&job("c1", "Nguyễn Văn A")).await.unwrap();
    assert_eq!((raster.width, raster.height), (2246, 1588));
    assert_eq!(raster.image.dimensions(), (2246, 1588));
}

#[tokio::test]
async fn custom_portrait_pages_export_portrait() {
    let mut portrait = job("c1", "An");
    portrait.template_id = TemplateId::Custom;
    portrait.config = Some(LayoutConfig {
        paper_size: PaperSize::A4,
        orientation: Orientation::Portrait,
        ..Default::default()
    });

    let raster = rasterizer().rasterize(&portrait).await.unwrap();
    assert_eq!((raster.width, raster.height), (1588, 2246));

    let exporter = CertificateExporter::new(Arc::new(rasterizer()));
    let outcome = exporter
        .export_pdf("portrait", &[portrait], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.generated, 1);
    assert_eq!(lopdf::Document::load_mem(&outcome.bytes).unwrap().get_pages().len(), 1);
}

#[tokio::test]
async fn unreachable_images_are_left_out() {
    let mut with_logo = job("c1", "An");
    with_logo.config = Some(LayoutConfig {
        logo_image: Some("ftp://example.invalid/logo.png".into()),
        ..Default::default()
    });
    assert!(rasterizer().rasterize(&with_logo).await.is_ok());
}
