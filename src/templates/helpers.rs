use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use image::{ImageBuffer, ImageOutputFormat, Luma};
use qrcode::{Color, QrCode};
use std::collections::HashMap;

use crate::core::{CertificateError, CertificateResult};

/// Valores disponibles para `{full_name}`, `{class}`, `{points}`, `{rank}` y `{date}`
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    values: HashMap<&'static str, String>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_name(mut self, value: impl Into<String>) -> Self {
        self.values.insert("full_name", value.into());
        self
    }

    pub fn class(mut self, value: impl Into<String>) -> Self {
        self.values.insert("class", value.into());
        self
    }

    pub fn points(mut self, value: impl Into<String>) -> Self {
        self.values.insert("points", value.into());
        self
    }

    pub fn rank(mut self, value: impl Into<String>) -> Self {
        self.values.insert("rank", value.into());
        self
    }

    pub fn date(mut self, value: impl Into<String>) -> Self {
        self.values.insert("date", value.into());
        self
    }

    /// Sustituye las variables conocidas; los marcadores desconocidos se dejan tal cual
    pub fn substitute(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('{') {
            output.push_str(&rest[..start]);
            let candidate = &rest[start + 1..];
            match candidate.find('}') {
                Some(end) => {
                    let name = &candidate[..end];
                    match self.values.get(name) {
                        Some(value) => output.push_str(value),
                        None => {
                            output.push('{');
                            output.push_str(name);
                            output.push('}');
                        }
                    }
                    rest = &candidate[end + 1..];
                }
                None => {
                    output.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        output.push_str(rest);
        output
    }
}

/// Formatea una fecha al estilo dd/mm/yyyy
pub fn format_issue_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Escapa texto para contenido y atributos SVG
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Genera el código QR de verificación como data URI PNG
pub fn generate_qr_data_uri(data: &str) -> CertificateResult<String> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| CertificateError::Render(format!("Failed to generate QR code: {}", e)))?;

    let width = code.width();
    let scale = 8;
    let quiet_zone = 4;
    let img_size = ((width + quiet_zone * 2) * scale) as u32;

    let mut image = ImageBuffer::<Luma<u8>, Vec<u8>>::from_pixel(img_size, img_size, Luma([255]));

    for y in 0..width {
        for x in 0..width {
            if code[(x, y)] != Color::Dark {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = ((x + quiet_zone) * scale + dx) as u32;
                    let py = ((y + quiet_zone) * scale + dy) as u32;
                    image.put_pixel(px, py, Luma([0]));
                }
            }
        }
    }

    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageOutputFormat::Png)
        .map_err(|e| CertificateError::Render(format!("Failed to encode QR image: {}", e)))?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&buffer)))
}

/// Construye la URL de verificación a partir de la plantilla configurada
pub fn verification_url(template: &str, code: &str, certificate_id: &str) -> String {
    let key = if code.trim().is_empty() { certificate_id } else { code };
    if template.contains("{code}") {
        template.replace("{code}", key)
    } else {
        format!("{}/{}", template.trim_end_matches('/'), key)
    }
}
