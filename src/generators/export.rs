use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::archive::ArchiveBuilder;
use super::pdf::{page_orientation, single_page_pdf, PdfAssembler};
use crate::core::{CertificateError, CertificateResult};
use crate::render::metrics::EXPORT_FILES;
use crate::render::{Raster, Rasterizer, RenderJob};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Zip,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Zip => "zip",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Zip => "application/zip",
        }
    }
}

/// A recipient left out of the export, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCertificate {
    pub certificate_id: String,
    pub recipient_name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Pages or entries written
    pub generated: usize,
    pub attempted: usize,
    pub skipped: Vec<SkippedCertificate>,
}

/// Runs render jobs through a rasterizer and packs the results.
///
/// Jobs are processed in input order. With `workers > 1` up to that many
/// rasterizations run at once, each on its own render target; results are
/// still consumed in input order.
pub struct CertificateExporter {
    rasterizer: Arc<dyn Rasterizer>,
    workers: usize,
}

impl CertificateExporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        CertificateExporter { rasterizer, workers: 1 }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// One multi-page PDF, one page per successfully rasterized job.
    pub async fn export_pdf(
        &self,
        label: &str,
        jobs: &[RenderJob],
        cancel: &CancellationToken,
    ) -> CertificateResult<ExportOutcome> {
        let mut assembler = PdfAssembler::new(label);
        let skipped = self
            .run(jobs, cancel, |job, raster| {
                tracing::debug!(
                    certificate_id = %job.certificate_id,
                    orientation = %page_orientation(&raster),
                    "Adding certificate page"
                );
                assembler.add_page(&raster)
            })
            .await?;

        let generated = assembler.page_count();
        let bytes = assembler.finish()?;
        self.outcome(ExportFormat::Pdf, label, bytes, generated, jobs.len(), skipped)
    }

    /// A ZIP with one single-page PDF per successfully rasterized job.
    pub async fn export_zip(
        &self,
        label: &str,
        jobs: &[RenderJob],
        cancel: &CancellationToken,
    ) -> CertificateResult<ExportOutcome> {
        let mut archive = ArchiveBuilder::new();
        let skipped = self
            .run(jobs, cancel, |job, raster| {
                let pdf = single_page_pdf(&job.recipient_name, &raster)?;
                archive.add_pdf(&job.recipient_name, &job.certificate_id, &pdf)?;
                Ok(())
            })
            .await?;

        let generated = archive.entry_count();
        let bytes = archive.finish()?;
        self.outcome(ExportFormat::Zip, label, bytes, generated, jobs.len(), skipped)
    }

    /// Rasterizes every job and hands each bitmap to `sink`. Per-certificate
    /// failures become skips; anything else aborts the export.
    async fn run<F>(
        &self,
        jobs: &[RenderJob],
        cancel: &CancellationToken,
        mut sink: F,
    ) -> CertificateResult<Vec<SkippedCertificate>>
    where
        F: FnMut(&RenderJob, Raster) -> CertificateResult<()>,
    {
        let rasterizer = &self.rasterizer;
        let mut results = stream::iter(jobs.iter())
            .map(|job| async move { (job, rasterizer.rasterize(job).await) })
            .buffered(self.workers);

        let mut skipped = Vec::new();
        let mut completed = 0;

        loop {
            // Cancellation only counts while work remains
            if completed < jobs.len() && cancel.is_cancelled() {
                tracing::info!(completed, "Export cancelled");
                return Err(CertificateError::Cancelled { completed });
            }
            let Some((job, result)) = results.next().await else {
                break;
            };

            match result.and_then(|raster| sink(job, raster)) {
                Ok(()) => {}
                Err(e) if e.is_per_certificate() => {
                    tracing::warn!(
                        certificate_id = %job.certificate_id,
                        recipient = %job.recipient_name,
                        "Certificate skipped: {}",
                        e
                    );
                    skipped.push(SkippedCertificate {
                        certificate_id: job.certificate_id.clone(),
                        recipient_name: job.recipient_name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
            completed += 1;
        }

        Ok(skipped)
    }

    fn outcome(
        &self,
        format: ExportFormat,
        label: &str,
        bytes: Option<Vec<u8>>,
        generated: usize,
        attempted: usize,
        skipped: Vec<SkippedCertificate>,
    ) -> CertificateResult<ExportOutcome> {
        let bytes = match bytes {
            Some(bytes) if generated > 0 => bytes,
            _ => {
                tracing::warn!(attempted, "Export produced no certificates");
                return Err(CertificateError::NoOutput { attempted });
            }
        };

        EXPORT_FILES.with_label_values(&[format.extension()]).inc();
        let file_name = export_file_name(label, Utc::now().timestamp_millis(), format);
        tracing::info!(
            file_name = %file_name,
            generated,
            attempted,
            skipped = skipped.len(),
            "Export finished"
        );

        Ok(ExportOutcome {
            format,
            file_name,
            bytes,
            generated,
            attempted,
            skipped,
        })
    }
}

/// `{label}_{timestamp_ms}.{ext}` with whitespace runs in the label replaced by `_`.
pub fn export_file_name(label: &str, timestamp_ms: i64, format: ExportFormat) -> String {
    let label = label.split_whitespace().collect::<Vec<_>>().join("_");
    let label = if label.is_empty() { "certificates".to_string() } else { label };
    format!("{}_{}.{}", label, timestamp_ms, format.extension())
}
