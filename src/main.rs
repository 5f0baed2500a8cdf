use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use certificate_generator::api::{configure_routes, ApiState, AppConfig};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    tracing::info!("Starting Certificate Generator API");

    // Process metrics next to the export counters
    prometheus::default_registry()
        .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

    // Load configuration
    let config = AppConfig::load()?;
    let host = config.host.clone();
    let port = config.port;
    let payload_limit = config.max_payload_bytes;

    // Initialize application state
    let state = web::Data::new(ApiState::new(config)?);

    tracing::info!("Starting server on {}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(payload_limit))
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .wrap(
                Cors::default()
                    .allowed_origin_fn(|origin, _req_head| {
                        origin.as_bytes().starts_with(b"http://localhost") ||
                        origin.as_bytes().starts_with(b"https://")
                    })
                    .allowed_methods(vec!["GET", "POST", "DELETE"])
                    .allowed_headers(vec!["Content-Type"])
                    .expose_headers(vec![
                        "Content-Disposition",
                        "X-Generated-Count",
                        "X-Attempted-Count",
                        "X-Skipped-Count",
                    ])
                    .max_age(3600)
            )
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
