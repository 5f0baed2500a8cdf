use config::{Config, ConfigError, Environment};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::generators::CertificateExporter;
use crate::preparation::{CompressionPolicy, IssueService, IssueSettings};
use crate::render::{AssetResolver, FontRegistry, RasterOptions, Rasterizer, ResvgRasterizer};
use crate::storage::{DataService, HttpDataService, InMemoryDataService};
use crate::templates::TemplateRegistry;

pub type KeyedRateLimiter = Arc<RateLimiter<String, DashMapStateStore<String>, DefaultClock>>;

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<TemplateRegistry>,
    pub data: Arc<dyn DataService>,
    pub issuer: Arc<IssueService>,
    pub exporter: Arc<CertificateExporter>,
    pub rate_limiter: KeyedRateLimiter,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    /// Remote data service; the in-memory store is used when unset
    pub data_service_url: Option<String>,
    pub data_service_timeout_ms: u64,
    pub fonts_dir: Option<PathBuf>,
    pub verify_url_template: String,
    pub pixel_ratio: f32,
    pub require_fonts: bool,
    pub max_asset_bytes: usize,
    pub compress_threshold_bytes: usize,
    pub compress_max_dimension: u32,
    pub compress_jpeg_quality: u8,
    pub issue_chunk_size: usize,
    pub export_workers: usize,
    pub asset_cache_ttl_seconds: i64,
    pub max_payload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            rate_limit_per_minute: 30,
            rate_limit_burst: 10,
            data_service_url: None,
            data_service_timeout_ms: 10_000,
            fonts_dir: None,
            verify_url_template: "https://educheck.local/verify/{code}".to_string(),
            pixel_ratio: 2.0,
            require_fonts: false,
            max_asset_bytes: 5 * 1024 * 1024,       // 5MB
            compress_threshold_bytes: 200 * 1024,   // 200KB
            compress_max_dimension: 1200,
            compress_jpeg_quality: 80,
            issue_chunk_size: 50,
            export_workers: 1,
            asset_cache_ttl_seconds: 600,
            max_payload_bytes: 64 * 1024 * 1024,    // 64MB
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `CERTGEN_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(Environment::with_prefix("CERTGEN").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn issue_settings(&self) -> IssueSettings {
        IssueSettings {
            chunk_size: self.issue_chunk_size,
            max_asset_bytes: self.max_asset_bytes,
            compression: CompressionPolicy {
                threshold_bytes: self.compress_threshold_bytes,
                max_dimension: self.compress_max_dimension,
                jpeg_quality: self.compress_jpeg_quality,
            },
        }
    }

    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            pixel_ratio: self.pixel_ratio,
            verify_url_template: self.verify_url_template.clone(),
            require_fonts: self.require_fonts,
        }
    }
}

impl ApiState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.data_service_timeout_ms);

        // Initialize data service
        let data: Arc<dyn DataService> = match &config.data_service_url {
            Some(url) => {
                tracing::info!("Using remote data service at {}", url);
                Arc::new(HttpDataService::new(url, timeout)?)
            }
            None => {
                tracing::warn!("No data service configured, using in-memory store");
                Arc::new(InMemoryDataService::new())
            }
        };

        // Initialize rasterizer
        let registry = Arc::new(TemplateRegistry::new());
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let rasterizer = Arc::new(ResvgRasterizer::new(
            registry.clone(),
            Arc::new(FontRegistry::new(config.fonts_dir.clone())),
            Arc::new(AssetResolver::new(client, config.asset_cache_ttl_seconds)),
            config.raster_options(),
        ));

        Self::with_parts(config, registry, data, rasterizer)
    }

    /// Assembles the state around an existing data service and rasterizer.
    pub fn with_parts(
        config: AppConfig,
        registry: Arc<TemplateRegistry>,
        data: Arc<dyn DataService>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> anyhow::Result<Self> {
        let issuer = Arc::new(IssueService::new(data.clone(), config.issue_settings()));
        let exporter = Arc::new(CertificateExporter::new(rasterizer).with_workers(config.export_workers));

        // Initialize rate limiter
        let per_minute = NonZeroU32::new(config.rate_limit_per_minute)
            .ok_or_else(|| anyhow::anyhow!("rate_limit_per_minute must be positive"))?;
        let burst = NonZeroU32::new(config.rate_limit_burst)
            .ok_or_else(|| anyhow::anyhow!("rate_limit_burst must be positive"))?;
        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::dashmap_with_clock(quota, &DefaultClock::default()));

        Ok(ApiState {
            registry,
            data,
            issuer,
            exporter,
            rate_limiter,
            config: Arc::new(config),
        })
    }
}
