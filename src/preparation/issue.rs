use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::compress::{snapshot, CompressionPolicy};
use super::prepare::{generate_verification_code, personalize_config, stored_render_job, template_variables};
use crate::core::{CertificateError, CertificateResult};
use crate::models::{
    Certificate, CertificateFilter, CertificateType, LayoutConfig, NewCertificate, NewPreset, Preset, Recipient,
    TemplateId,
};
use crate::render::RenderJob;
use crate::storage::DataService;
use crate::templates::helpers::format_issue_date;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    #[serde(default)]
    pub event_id: Option<String>,
    pub title: String,
    #[serde(rename = "type", default)]
    pub certificate_type: CertificateType,
    pub template_id: TemplateId,
    pub issue_date: NaiveDate,
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub config: LayoutConfig,
    /// Overrides the name of the auto-saved preset.
    #[serde(default)]
    pub preset_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueOutcome {
    pub certificates: Vec<Certificate>,
    pub preset: Option<Preset>,
}

#[derive(Debug, Clone)]
pub struct IssueSettings {
    pub chunk_size: usize,
    pub max_asset_bytes: usize,
    pub compression: CompressionPolicy,
}

impl Default for IssueSettings {
    fn default() -> Self {
        IssueSettings {
            chunk_size: 50,
            max_asset_bytes: 5 * 1024 * 1024,
            compression: CompressionPolicy::default(),
        }
    }
}

/// Bulk issuing and re-export of stored certificates.
pub struct IssueService {
    data: Arc<dyn DataService>,
    settings: IssueSettings,
}

impl IssueService {
    pub fn new(data: Arc<dyn DataService>, settings: IssueSettings) -> Self {
        IssueService { data, settings }
    }

    pub async fn issue(&self, request: IssueRequest) -> CertificateResult<IssueOutcome> {
        request.config.validate_assets(self.settings.max_asset_bytes)?;
        if request.recipients.is_empty() {
            return Err(CertificateError::Validation("No recipients selected".to_string()));
        }

        let policy = self.settings.compression.clone();
        let live = request.config.clone();
        let metadata = tokio::task::spawn_blocking(move || snapshot(&live, &policy))
            .await
            .map_err(|e| CertificateError::Compression(e.to_string()))?;

        let date = format_issue_date(request.issue_date);
        let pending: Vec<NewCertificate> = request
            .recipients
            .iter()
            .map(|recipient| {
                let vars = template_variables(recipient, &date);
                NewCertificate {
                    id: Uuid::new_v4(),
                    recipient_id: recipient.id.clone(),
                    recipient_name: recipient.display_name(),
                    event_id: request.event_id.clone(),
                    certificate_type: request.certificate_type,
                    title: vars.substitute(&request.title),
                    template_id: request.template_id,
                    issue_date: request.issue_date,
                    verification_code: generate_verification_code(),
                    metadata: personalize_config(&metadata, &vars),
                }
            })
            .collect();

        let chunk_size = self.settings.chunk_size.max(1);
        let mut certificates = Vec::with_capacity(pending.len());
        let mut chunks = pending.into_iter().peekable();
        while chunks.peek().is_some() {
            let chunk: Vec<NewCertificate> = chunks.by_ref().take(chunk_size).collect();
            let stored = self.data.create_certificates(chunk).await?;
            tracing::debug!(stored = stored.len(), "Certificate chunk persisted");
            certificates.extend(stored);
        }

        let preset_name = request
            .preset_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| auto_preset_name(&request));
        let preset = match self
            .data
            .save_preset(NewPreset {
                name: preset_name,
                template_id: request.template_id,
                config: metadata,
                auto_saved: true,
            })
            .await
        {
            Ok(preset) => Some(preset),
            Err(e) => {
                tracing::warn!("Failed to auto-save preset: {}", e);
                None
            }
        };

        tracing::info!(
            issued = certificates.len(),
            template = %request.template_id,
            event = request.event_id.as_deref().unwrap_or("-"),
            "Certificates issued"
        );

        Ok(IssueOutcome { certificates, preset })
    }

    /// Render jobs for stored certificates, drawn from their own snapshots
    /// without substituting variables a second time.
    pub async fn stored_jobs(&self, filter: &CertificateFilter) -> CertificateResult<Vec<RenderJob>> {
        let certificates = self.data.fetch_certificates(filter).await?;
        if certificates.is_empty() {
            return Ok(Vec::new());
        }

        // Lookups only name certificates stored without a recipient name
        let users: HashMap<String, _> = self
            .data
            .fetch_users()
            .await?
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        let events: HashMap<String, String> = self
            .data
            .fetch_events()
            .await?
            .into_iter()
            .map(|event| (event.id, event.name))
            .collect();

        let mut participants = HashMap::new();
        if let Some(event_id) = &filter.event_id {
            for participant in self.data.fetch_event_participants(event_id).await? {
                let key = participant.user_id.clone().unwrap_or_else(|| participant.id.clone());
                participants.insert(key, participant);
            }
        }

        let jobs = certificates
            .iter()
            .map(|certificate| {
                let recipient_name = if certificate.recipient_name.trim().is_empty() {
                    Recipient {
                        id: certificate.recipient_id.clone(),
                        user: users.get(&certificate.recipient_id).cloned(),
                        participant: participants.get(&certificate.recipient_id).cloned(),
                        rank: None,
                    }
                    .display_name()
                } else {
                    certificate.recipient_name.clone()
                };
                let event_name = certificate
                    .event_id
                    .as_ref()
                    .and_then(|id| events.get(id))
                    .map(String::as_str)
                    .unwrap_or_default();
                stored_render_job(certificate, recipient_name, event_name)
            })
            .collect();

        Ok(jobs)
    }
}

fn auto_preset_name(request: &IssueRequest) -> String {
    let subject = request
        .event_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(request.title.as_str());
    format!("{} ({})", subject, format_issue_date(request.issue_date))
}
