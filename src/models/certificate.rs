use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{CertificateType, TemplateId};
use super::layout::LayoutConfig;

/// Everything a template needs to draw one certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRenderData {
    pub recipient_name: String,
    pub title: String,
    pub event_name: String,
    pub issue_date: String,
    #[serde(rename = "type")]
    pub certificate_type: CertificateType,
    pub verification_code: String,
    /// Data URI or URL of the verification QR; generated at rasterization when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_image: Option<String>,
}

/// One issued certificate as stored by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub recipient_id: String,
    /// Display name at issue time; empty on records that predate it.
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(rename = "type")]
    pub certificate_type: CertificateType,
    pub title: String,
    pub template_id: TemplateId,
    pub issue_date: NaiveDate,
    pub verification_code: String,
    /// Snapshot of the layout at issue time.
    #[serde(default)]
    pub metadata: Option<LayoutConfig>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a certificate; the data service assigns the timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    pub id: Uuid,
    pub recipient_id: String,
    pub recipient_name: String,
    pub event_id: Option<String>,
    #[serde(rename = "type")]
    pub certificate_type: CertificateType,
    pub title: String,
    pub template_id: TemplateId,
    pub issue_date: NaiveDate,
    pub verification_code: String,
    pub metadata: LayoutConfig,
}

impl NewCertificate {
    pub fn into_certificate(self, created_at: DateTime<Utc>) -> Certificate {
        Certificate {
            id: self.id,
            recipient_id: self.recipient_id,
            recipient_name: self.recipient_name,
            event_id: self.event_id,
            certificate_type: self.certificate_type,
            title: self.title,
            template_id: self.template_id,
            issue_date: self.issue_date,
            verification_code: self.verification_code,
            metadata: Some(self.metadata),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFilter {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl CertificateFilter {
    pub fn for_event(event_id: impl Into<String>) -> Self {
        CertificateFilter {
            recipient_id: None,
            event_id: Some(event_id.into()),
        }
    }

    pub fn matches(&self, certificate: &Certificate) -> bool {
        let recipient_ok = self
            .recipient_id
            .as_ref()
            .map_or(true, |id| &certificate.recipient_id == id);
        let event_ok = self
            .event_id
            .as_ref()
            .map_or(true, |id| certificate.event_id.as_ref() == Some(id));
        recipient_ok && event_ok
    }
}

/// Named, reusable layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: Uuid,
    pub name: String,
    pub template_id: TemplateId,
    pub config: LayoutConfig,
    /// Saved implicitly by a bulk issue rather than by the operator.
    #[serde(default)]
    pub auto_saved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPreset {
    pub name: String,
    pub template_id: TemplateId,
    pub config: LayoutConfig,
    #[serde(default)]
    pub auto_saved: bool,
}

impl NewPreset {
    pub fn into_preset(self) -> Preset {
        Preset {
            id: Uuid::new_v4(),
            name: self.name,
            template_id: self.template_id,
            config: self.config,
            auto_saved: self.auto_saved,
            created_at: Utc::now(),
        }
    }
}
