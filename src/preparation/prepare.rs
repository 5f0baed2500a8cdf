use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::models::{Certificate, CertificateRenderData, LayoutConfig, Recipient};
use crate::render::RenderJob;
use crate::templates::helpers::{format_issue_date, TemplateVariables};

pub const VERIFICATION_CODE_LEN: usize = 8;

/// Variables a recipient contributes to titles and captions.
pub fn template_variables(recipient: &Recipient, date: &str) -> TemplateVariables {
    let mut vars = TemplateVariables::new()
        .full_name(recipient.display_name())
        .date(date);
    if let Some(class) = recipient.class_name() {
        vars = vars.class(class);
    }
    if let Some(points) = recipient.points() {
        vars = vars.points(points.to_string());
    }
    if let Some(rank) = recipient.rank {
        vars = vars.rank(rank.to_string());
    }
    vars
}

/// Copy of `config` with every configured caption personalized.
pub fn personalize_config(config: &LayoutConfig, vars: &TemplateVariables) -> LayoutConfig {
    let mut personalized = config.clone();
    personalized.labels.map_configured(|text| vars.substitute(text));
    for custom in personalized.custom_texts.iter_mut() {
        custom.content = vars.substitute(&custom.content);
    }
    personalized
}

/// Fresh uppercase alphanumeric code printed on the certificate.
pub fn generate_verification_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_CODE_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect()
}

/// Render inputs for a stored certificate. Title and snapshot were
/// personalized when it was issued and are drawn as stored.
pub fn stored_render_job(certificate: &Certificate, recipient_name: String, event_name: &str) -> RenderJob {
    RenderJob {
        certificate_id: certificate.id.to_string(),
        recipient_name: recipient_name.clone(),
        template_id: certificate.template_id,
        data: CertificateRenderData {
            recipient_name,
            title: certificate.title.clone(),
            event_name: event_name.to_string(),
            issue_date: format_issue_date(certificate.issue_date),
            certificate_type: certificate.certificate_type,
            verification_code: certificate.verification_code.clone(),
            qr_image: None,
        },
        config: certificate.metadata.clone(),
    }
}
