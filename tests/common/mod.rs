#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use certificate_generator::models::{CertificateRenderData, CertificateType, TemplateId};
use certificate_generator::render::{Raster, Rasterizer, RenderJob};
use certificate_generator::{CertificateError, CertificateResult};

/// Rasterizer that fails for a fixed set of certificate ids.
pub struct StubRasterizer {
    pub failing: HashSet<String>,
    pub calls: AtomicUsize,
    pub delay_ms: u64,
    /// Cancelled once the given certificate id has been rasterized.
    pub cancel_after: Option<(String, CancellationToken)>,
}

impl StubRasterizer {
    pub fn failing(ids: &[&str]) -> Self {
        StubRasterizer {
            failing: ids.iter().map(|id| id.to_string()).collect(),
            calls: AtomicUsize::new(0),
            delay_ms: 0,
            cancel_after: None,
        }
    }

    pub fn cancelling_after(mut self, id: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((id.to_string(), token));
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

#[async_trait]
impl Rasterizer for StubRasterizer {
    async fn rasterize(&self, job: &RenderJob) -> CertificateResult<Raster> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            // Later jobs finish first
            let wait = self.delay_ms.saturating_sub(call as u64 * 10);
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        if self.failing.contains(&job.certificate_id) {
            return Err(CertificateError::Render(format!("Template failed for {}", job.certificate_id)));
        }

        if let Some((id, token)) = &self.cancel_after {
            if *id == job.certificate_id {
                token.cancel();
            }
        }

        let (width, height) = if job.certificate_id.ends_with("-portrait") {
            (60, 84)
        } else {
            (84, 60)
        };
        Ok(Raster {
            image: RgbImage::from_pixel(width, height, Rgb([250, 240, 200])),
            width,
            height,
            pixel_ratio: 2.0,
        })
    }
}

pub fn render_data(name: &str) -> CertificateRenderData {
    CertificateRenderData {
        recipient_name: name.to_string(),
        title: "Giấy chứng nhận".to_string(),
        event_name: "Hội khỏe Phù Đổng".to_string(),
        issue_date: "20/11/2024".to_string(),
        certificate_type: CertificateType::Participation,
        verification_code: "AB12CD34".to_string(),
        qr_image: None,
    }
}

pub fn job(id: &str, name: &str) -> RenderJob {
    RenderJob {
        certificate_id: id.to_string(),
        recipient_name: name.to_string(),
        template_id: TemplateId::Classic,
        data: render_data(name),
        config: None,
    }
}

pub fn five_jobs() -> Vec<RenderJob> {
    vec![
        job("c1", "Nguyễn Văn A"),
        job("c2", "Trần Thị B"),
        job("c3", "Lê Văn C"),
        job("c4", "Phạm Thị D"),
        job("c5", "Hoàng Văn E"),
    ]
}
