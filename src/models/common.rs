use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::CertificateError;

/// Visual style a certificate is rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Classic,
    Luxury,
    Modern,
    Tech,
    Custom,
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Classic,
        TemplateId::Luxury,
        TemplateId::Modern,
        TemplateId::Tech,
        TemplateId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Classic => "classic",
            TemplateId::Luxury => "luxury",
            TemplateId::Modern => "modern",
            TemplateId::Tech => "tech",
            TemplateId::Custom => "custom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, TemplateId::Custom)
    }

    /// Caption used when the config does not override a label.
    pub fn default_label(&self, key: LabelKey) -> &'static str {
        match (self, key) {
            (TemplateId::Luxury, LabelKey::Title) => "CHỨNG NHẬN",
            (TemplateId::Modern | TemplateId::Tech, LabelKey::Title) => "CERTIFICATE",
            (_, LabelKey::Title) => "GIẤY CHỨNG NHẬN",
            (TemplateId::Luxury, LabelKey::PresentedTo) => "Trân trọng vinh danh",
            (TemplateId::Modern | TemplateId::Tech, LabelKey::PresentedTo) => "Chứng nhận này được trao cho",
            (_, LabelKey::PresentedTo) => "Trân trọng trao tặng",
            (TemplateId::Modern | TemplateId::Tech, LabelKey::EventPrefix) => "Vì đã hoàn thành",
            (_, LabelKey::EventPrefix) => "Đã tham gia",
            (_, LabelKey::DatePrefix) => "Ngày",
            (_, LabelKey::Signature) => "Ban tổ chức",
            (_, LabelKey::EntryNo) => "Số vào sổ",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = CertificateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CertificateError::Template(format!("Unknown template: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    #[default]
    Participation,
    Completion,
    Excellent,
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateType::Participation => write!(f, "participation"),
            CertificateType::Completion => write!(f, "completion"),
            CertificateType::Excellent => write!(f, "excellent"),
        }
    }
}

/// User-editable caption slots shared by every template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelKey {
    Title,
    PresentedTo,
    EventPrefix,
    DatePrefix,
    Signature,
    EntryNo,
}

impl LabelKey {
    pub const ALL: [LabelKey; 6] = [
        LabelKey::Title,
        LabelKey::PresentedTo,
        LabelKey::EventPrefix,
        LabelKey::DatePrefix,
        LabelKey::Signature,
        LabelKey::EntryNo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKey::Title => "title",
            LabelKey::PresentedTo => "presentedTo",
            LabelKey::EventPrefix => "eventPrefix",
            LabelKey::DatePrefix => "datePrefix",
            LabelKey::Signature => "signature",
            LabelKey::EntryNo => "entryNo",
        }
    }

    pub fn parse(key: &str) -> Option<LabelKey> {
        LabelKey::ALL.iter().copied().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
