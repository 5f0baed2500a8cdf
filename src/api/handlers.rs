use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::generators::{ExportFormat, ExportOutcome};
use crate::models::{CertificateFilter, CertificateRenderData, LayoutConfig, LayoutUpdate, NewPreset, TemplateId};
use crate::render::RenderJob;
use crate::templates::RenderMode;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub template_id: TemplateId,
    pub data: CertificateRenderData,
    #[serde(default)]
    pub config: Option<LayoutConfig>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub show_center_guide: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLayoutRequest {
    #[serde(default)]
    pub config: LayoutConfig,
    #[serde(default)]
    pub updates: Vec<LayoutUpdate>,
    /// Editor-style `{ "pos_title": {...}, "visibility_qr": true }` changes
    #[serde(default)]
    pub changes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub label: String,
    pub jobs: Vec<RenderJob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredExportRequest {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
}

/// List templates available in the picker
pub async fn list_templates(state: web::Data<ApiState>) -> HttpResponse {
    let templates: Vec<_> = state
        .registry
        .list()
        .into_iter()
        .map(|(id, description)| json!({ "id": id, "description": description }))
        .collect();

    HttpResponse::Ok().json(json!({ "templates": templates }))
}

/// Render one certificate to SVG
pub async fn preview(body: web::Json<PreviewRequest>, state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    let mode = if request.editable {
        RenderMode::Editable {
            show_center_guide: request.show_center_guide,
        }
    } else {
        RenderMode::Static
    };

    let rendered = state
        .registry
        .render(request.template_id, &request.data, request.config.as_ref(), mode)?;

    Ok(HttpResponse::Ok()
        .content_type("image/svg+xml; charset=utf-8")
        .insert_header(("X-Canvas-Width", rendered.width.to_string()))
        .insert_header(("X-Canvas-Height", rendered.height.to_string()))
        .body(rendered.svg))
}

/// Apply editor updates to a layout and return the new layout
pub async fn apply_layout(body: web::Json<ApplyLayoutRequest>) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    let mut config = request.config;

    for update in request.updates {
        config.apply(update);
    }
    for (key, value) in &request.changes {
        config.apply(LayoutUpdate::from_key(key, value)?);
    }

    Ok(HttpResponse::Ok().json(config))
}

/// Persist one certificate per recipient
pub async fn issue_certificates(
    req: HttpRequest,
    body: web::Json<crate::preparation::IssueRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let outcome = state.issuer.issue(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(outcome))
}

pub async fn export_pdf(
    req: HttpRequest,
    body: web::Json<ExportRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    export(req, body.into_inner(), ExportFormat::Pdf, state).await
}

pub async fn export_zip(
    req: HttpRequest,
    body: web::Json<ExportRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    export(req, body.into_inner(), ExportFormat::Zip, state).await
}

async fn export(
    req: HttpRequest,
    request: ExportRequest,
    format: ExportFormat,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    for job in &request.jobs {
        if let Some(config) = &job.config {
            config.validate_assets(state.config.max_asset_bytes)?;
        }
    }

    let outcome = run_export(&state, format, &request.label, &request.jobs).await?;
    Ok(file_response(outcome))
}

/// Re-export the stored certificates of one event
pub async fn export_event(
    req: HttpRequest,
    path: web::Path<String>,
    body: Option<web::Json<StoredExportRequest>>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let event_id = path.into_inner();
    let request = body.map(web::Json::into_inner).unwrap_or(StoredExportRequest {
        format: ExportFormat::Pdf,
        label: None,
        recipient_id: None,
    });

    let filter = CertificateFilter {
        recipient_id: request.recipient_id,
        event_id: Some(event_id.clone()),
    };
    let jobs = state.issuer.stored_jobs(&filter).await?;

    let label = match request.label {
        Some(label) => label,
        None => state
            .data
            .fetch_events()
            .await?
            .into_iter()
            .find(|event| event.id == event_id)
            .map(|event| event.name)
            .unwrap_or(event_id),
    };

    let outcome = run_export(&state, request.format, &label, &jobs).await?;
    Ok(file_response(outcome))
}

async fn run_export(
    state: &ApiState,
    format: ExportFormat,
    label: &str,
    jobs: &[RenderJob],
) -> ApiResult<ExportOutcome> {
    // Cancelled when the client goes away and the handler future is dropped
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let outcome = match format {
        ExportFormat::Pdf => state.exporter.export_pdf(label, jobs, &cancel).await?,
        ExportFormat::Zip => state.exporter.export_zip(label, jobs, &cancel).await?,
    };
    Ok(outcome)
}

fn file_response(outcome: ExportOutcome) -> HttpResponse {
    let mut parameters = vec![DispositionParam::Filename(ascii_fallback(&outcome.file_name))];
    if !outcome.file_name.is_ascii() {
        parameters.push(DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: outcome.file_name.clone().into_bytes(),
        }));
    }

    HttpResponse::Ok()
        .content_type(outcome.format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters,
        })
        .insert_header(("X-Generated-Count", outcome.generated.to_string()))
        .insert_header(("X-Attempted-Count", outcome.attempted.to_string()))
        .insert_header(("X-Skipped-Count", outcome.skipped.len().to_string()))
        .body(outcome.bytes)
}

fn ascii_fallback(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' { c } else { '_' })
        .collect()
}

pub async fn list_presets(state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let presets = state.data.list_presets().await?;
    Ok(HttpResponse::Ok().json(json!({ "presets": presets })))
}

pub async fn save_preset(body: web::Json<NewPreset>, state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let preset = body.into_inner();
    if preset.name.trim().is_empty() {
        return Err(ApiError::bad_request("Preset name is required"));
    }
    preset.config.validate_assets(state.config.max_asset_bytes)?;

    let saved = state.data.save_preset(preset).await?;
    tracing::info!(preset_id = %saved.id, name = %saved.name, "Preset saved");
    Ok(HttpResponse::Created().json(saved))
}

pub async fn delete_preset(path: web::Path<Uuid>, state: web::Data<ApiState>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    state.data.delete_preset(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Rate limit heavy endpoints per client address
fn check_rate_limit(req: &HttpRequest, state: &ApiState) -> ApiResult<()> {
    let key = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("anonymous")
        .to_string();

    if state.rate_limiter.check_key(&key).is_err() {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return Err(ApiError::too_many_requests());
    }
    Ok(())
}
