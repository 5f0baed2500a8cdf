use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::assets::AssetResolver;
use super::fonts::FontRegistry;
use super::metrics::{CERTIFICATES_FAILED, CERTIFICATES_RASTERIZED, RASTERIZE_SECONDS};
use super::target::{Raster, RenderTarget};
use crate::core::{CertificateError, CertificateResult};
use crate::models::{CertificateRenderData, ElementId, LayoutConfig, TemplateId};
use crate::templates::helpers::{generate_qr_data_uri, verification_url};
use crate::templates::{RenderMode, TemplateRegistry};

/// Everything needed to draw one certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub certificate_id: String,
    pub recipient_name: String,
    pub template_id: TemplateId,
    pub data: CertificateRenderData,
    #[serde(default)]
    pub config: Option<LayoutConfig>,
}

/// Swappable template → bitmap boundary.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, job: &RenderJob) -> CertificateResult<Raster>;
}

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub pixel_ratio: f32,
    pub verify_url_template: String,
    pub require_fonts: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        RasterOptions {
            pixel_ratio: 2.0,
            verify_url_template: "https://educheck.local/verify/{code}".to_string(),
            require_fonts: false,
        }
    }
}

pub struct ResvgRasterizer {
    registry: Arc<TemplateRegistry>,
    fonts: Arc<FontRegistry>,
    assets: Arc<AssetResolver>,
    options: RasterOptions,
}

impl ResvgRasterizer {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        fonts: Arc<FontRegistry>,
        assets: Arc<AssetResolver>,
        options: RasterOptions,
    ) -> Self {
        ResvgRasterizer {
            registry,
            fonts,
            assets,
            options,
        }
    }

    async fn draw(&self, job: &RenderJob) -> CertificateResult<Raster> {
        let config = match &job.config {
            Some(config) => self.assets.resolve_config(config).await,
            None => LayoutConfig::default(),
        };

        let mut data = job.data.clone();
        if data.qr_image.is_none() && config.is_visible(job.template_id, &ElementId::Qr) {
            let url = verification_url(
                &self.options.verify_url_template,
                &data.verification_code,
                &job.certificate_id,
            );
            data.qr_image = Some(generate_qr_data_uri(&url)?);
        }
        self.assets.resolve_data(&mut data).await;

        let fontdb = self
            .fonts
            .ensure_ready(&config.fonts_in_use(), self.options.require_fonts)
            .await?;

        let rendered = self
            .registry
            .render(job.template_id, &data, Some(&config), RenderMode::Static)?;

        let pixel_ratio = self.options.pixel_ratio;
        tokio::task::spawn_blocking(move || {
            let target = RenderTarget::mount(&rendered.svg, rendered.width, rendered.height, fontdb)?;
            target.capture(pixel_ratio)
        })
        .await
        .map_err(|e| CertificateError::Render(format!("Rasterization task failed: {}", e)))?
    }
}

#[async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn rasterize(&self, job: &RenderJob) -> CertificateResult<Raster> {
        let timer = RASTERIZE_SECONDS.start_timer();
        let result = self.draw(job).await;
        timer.observe_duration();

        match &result {
            Ok(raster) => {
                CERTIFICATES_RASTERIZED.inc();
                tracing::debug!(
                    certificate_id = %job.certificate_id,
                    width = raster.width,
                    height = raster.height,
                    live_targets = RenderTarget::live(),
                    "Certificate rasterized"
                );
            }
            Err(e) => {
                CERTIFICATES_FAILED.inc();
                tracing::warn!(certificate_id = %job.certificate_id, "Rasterization failed: {}", e);
            }
        }
        result
    }
}
