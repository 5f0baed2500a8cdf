use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageOutputFormat};
use serde::Deserialize;
use std::io::Cursor;

use crate::core::{CertificateError, CertificateResult};
use crate::models::{data_uri_payload_size, LayoutConfig};

/// When and how embedded images are shrunk before a snapshot is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct CompressionPolicy {
    pub threshold_bytes: usize,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        CompressionPolicy {
            threshold_bytes: 200 * 1024,
            max_dimension: 1200,
            jpeg_quality: 80,
        }
    }
}

/// Deep copy of `config` suitable for storing on a certificate. Embedded
/// images above the threshold are re-encoded; everything else is kept as is.
pub fn snapshot(config: &LayoutConfig, policy: &CompressionPolicy) -> LayoutConfig {
    let mut snapshot = config.clone();
    for (slot, src) in snapshot.image_slots_mut() {
        let Some(size) = data_uri_payload_size(src) else {
            continue;
        };
        if size <= policy.threshold_bytes {
            continue;
        }
        match compress_data_uri(src, policy) {
            Ok(compressed) => {
                tracing::debug!(slot = %slot, before = size, after = compressed.len(), "Image compressed");
                *src = compressed;
            }
            Err(e) => tracing::warn!(slot = %slot, "Keeping original image: {}", e),
        }
    }
    snapshot
}

/// Downscales to fit `max_dimension` and re-encodes as JPEG, or PNG when the
/// image has an alpha channel.
pub fn compress_data_uri(src: &str, policy: &CompressionPolicy) -> CertificateResult<String> {
    let payload = src
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| CertificateError::Compression("Not a base64 data URI".to_string()))?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| CertificateError::Compression(e.to_string()))?;

    let mut image = image::load_from_memory(&bytes)?;
    if image.width() > policy.max_dimension || image.height() > policy.max_dimension {
        image = image.resize(policy.max_dimension, policy.max_dimension, FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    let mime = if image.color().has_alpha() {
        image.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)?;
        "image/png"
    } else {
        let rgb = image.to_rgb8();
        JpegEncoder::new_with_quality(&mut out, policy.jpeg_quality).encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ColorType::Rgb8,
        )?;
        "image/jpeg"
    };

    Ok(format!("data:{};base64,{}", mime, BASE64.encode(&out)))
}
