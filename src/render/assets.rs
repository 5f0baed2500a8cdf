use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{CertificateRenderData, LayoutConfig};

#[derive(Clone)]
pub struct CachedAsset {
    pub data_uri: String,
    pub fetched_at: DateTime<Utc>,
    pub ttl_seconds: i64,
}

impl CachedAsset {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.fetched_at + Duration::seconds(self.ttl_seconds)
    }
}

/// Turns remote image URLs into data URIs so a render target never touches the
/// network. Unreachable or undecodable images resolve to `None` and their
/// element is left out.
pub struct AssetResolver {
    client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedAsset>>>,
    ttl_seconds: i64,
}

impl AssetResolver {
    pub fn new(client: reqwest::Client, ttl_seconds: i64) -> Self {
        AssetResolver {
            client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl_seconds,
        }
    }

    pub async fn resolve(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }
        if src.starts_with("data:") {
            return Some(src.to_string());
        }
        if !(src.starts_with("http://") || src.starts_with("https://")) {
            tracing::warn!("Unsupported image source skipped: {}", src);
            return None;
        }

        {
            let cache = self.cache.read().await;
            if let Some(asset) = cache.get(src) {
                if !asset.is_expired() {
                    return Some(asset.data_uri.clone());
                }
            }
        }

        match self.fetch(src).await {
            Ok(data_uri) => {
                let asset = CachedAsset {
                    data_uri: data_uri.clone(),
                    fetched_at: Utc::now(),
                    ttl_seconds: self.ttl_seconds,
                };
                self.cache.write().await.insert(src.to_string(), asset);
                Some(data_uri)
            }
            Err(e) => {
                tracing::warn!("Image {} could not be loaded: {}", src, e);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;

        let mime = sniff_mime(&bytes, content_type.as_deref()).ok_or("unsupported image format")?;
        Ok(format!("data:{};base64,{}", mime, BASE64.encode(&bytes)))
    }

    /// Copy of `config` with every image slot inlined; unresolvable slots are dropped.
    pub async fn resolve_config(&self, config: &LayoutConfig) -> LayoutConfig {
        let mut resolved = config.clone();
        for slot in [
            &mut resolved.bg_image,
            &mut resolved.logo_image,
            &mut resolved.signature_image,
            &mut resolved.seal_image,
        ] {
            if let Some(src) = slot.take() {
                *slot = self.resolve(&src).await;
            }
        }

        let mut logos = Vec::with_capacity(resolved.logos.len());
        for src in &resolved.logos {
            if let Some(uri) = self.resolve(src).await {
                logos.push(uri);
            }
        }
        resolved.logos = logos;
        resolved
    }

    pub async fn resolve_data(&self, data: &mut CertificateRenderData) {
        if let Some(src) = data.qr_image.take() {
            data.qr_image = self.resolve(&src).await;
        }
    }
}

fn sniff_mime(bytes: &[u8], content_type: Option<&str>) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(bytes) {
        return match format {
            image::ImageFormat::Png => Some("image/png"),
            image::ImageFormat::Jpeg => Some("image/jpeg"),
            image::ImageFormat::Gif => Some("image/gif"),
            image::ImageFormat::WebP => Some("image/webp"),
            _ => None,
        };
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    if content_type == Some("image/svg+xml") || head.contains("<svg") {
        return Some("image/svg+xml");
    }
    None
}
