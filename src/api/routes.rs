use actix_web::{web, HttpResponse};

use super::error::ApiResult;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health checks
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))

        // API v1
        .service(
            web::scope("/api/v1")
                .route("/templates", web::get().to(handlers::list_templates))
                .route("/layout/apply", web::post().to(handlers::apply_layout))

                // Certificates
                .service(
                    web::scope("/certificates")
                        .route("/preview", web::post().to(handlers::preview))
                        .route("/issue", web::post().to(handlers::issue_certificates))
                        .route("/export/pdf", web::post().to(handlers::export_pdf))
                        .route("/export/zip", web::post().to(handlers::export_zip))
                )
                .route("/events/{id}/certificates/export", web::post().to(handlers::export_event))

                // Presets
                .service(
                    web::scope("/presets")
                        .route("", web::get().to(handlers::list_presets))
                        .route("", web::post().to(handlers::save_preset))
                        .route("/{id}", web::delete().to(handlers::delete_preset))
                )
        );
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}

async fn metrics_endpoint() -> ApiResult<HttpResponse> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder.encode(&metric_families, &mut buffer)?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}
