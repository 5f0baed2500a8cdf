use minijinja::{AutoEscape, Environment};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::core::CertificateResult;
use crate::models::{CertificateRenderData, ElementId, FontRole, LabelKey, LayoutConfig, TemplateId};

use super::svg::logo_row;
use super::template_trait::{utils, RenderMode, RenderedCertificate};

const MACROS: &str = include_str!("svg/macros.svg.j2");
const CLASSIC: &str = include_str!("svg/classic.svg.j2");
const LUXURY: &str = include_str!("svg/luxury.svg.j2");
const MODERN: &str = include_str!("svg/modern.svg.j2");

/// Lienzo de los diseños fijos, independiente de `paperSize`
pub const FIXED_CANVAS: (u32, u32) = (1123, 794);

static ENGINE: Lazy<TemplateEngine> = Lazy::new(TemplateEngine::new);

/// Motor minijinja con los diseños fijos embebidos
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        // Registrar filtros
        env.add_filter("px", px_filter);

        for (name, source) in [
            ("macros.svg.j2", MACROS),
            ("classic.svg.j2", CLASSIC),
            ("luxury.svg.j2", LUXURY),
            ("modern.svg.j2", MODERN),
        ] {
            // Un error aquí aparece después como plantilla inexistente
            if let Err(e) = env.add_template(name, source) {
                tracing::error!("Failed to compile template {}: {}", name, e);
            }
        }

        TemplateEngine { env }
    }

    /// Instancia compartida por todas las plantillas fijas
    pub fn shared() -> &'static TemplateEngine {
        &ENGINE
    }

    pub fn render<S: Serialize>(&self, template_name: &str, context: S) -> CertificateResult<String> {
        let template = self.env.get_template(template_name)?;
        Ok(template.render(context)?)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn px_filter(value: f64) -> String {
    format!("{:.2}", value)
}

/// Colores de un diseño fijo
#[derive(Debug, Clone, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
    pub heading: &'static str,
    pub body: &'static str,
    pub recipient: &'static str,
    pub muted: &'static str,
}

#[derive(Debug, Serialize)]
struct TextBlock {
    text: String,
    size: f64,
    color: String,
    font: String,
}

#[derive(Debug, Serialize)]
struct BackgroundBlock {
    href: String,
    preserve: &'static str,
    opacity: f64,
}

#[derive(Debug, Serialize)]
struct ImageBlock {
    href: String,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Debug, Serialize)]
struct FixedContext {
    width: u32,
    height: u32,
    cx: f64,
    unit: f64,
    editable: bool,
    palette: Palette,
    background: Option<BackgroundBlock>,
    logos: Vec<ImageBlock>,
    title: Option<TextBlock>,
    presented_to: Option<TextBlock>,
    recipient: TextBlock,
    event_prefix: Option<TextBlock>,
    event_name: Option<TextBlock>,
    date: Option<TextBlock>,
    entry_no: Option<TextBlock>,
    signature: Option<TextBlock>,
    signature_image: Option<String>,
    seal: Option<String>,
    qr: Option<String>,
}

/// Diseño fijo: sólo se editan etiquetas, visibilidad, colores e imágenes
#[derive(Debug, Clone)]
pub struct FixedLayout {
    pub template_id: TemplateId,
    pub source: &'static str,
    pub palette: Palette,
}

impl FixedLayout {
    pub fn render(
        &self,
        data: &CertificateRenderData,
        config: &LayoutConfig,
        mode: RenderMode,
    ) -> CertificateResult<RenderedCertificate> {
        let context = self.context(data, config, mode);
        let svg = TemplateEngine::shared().render(self.source, &context)?;

        Ok(RenderedCertificate {
            template_id: self.template_id,
            width: context.width,
            height: context.height,
            svg,
            elements: Vec::new(),
        })
    }

    fn context(&self, data: &CertificateRenderData, config: &LayoutConfig, mode: RenderMode) -> FixedContext {
        let template = self.template_id;
        let (width, height) = FIXED_CANVAS;
        let unit = f64::from(width.min(height)) / 794.0;
        let visible = |element: ElementId| config.is_visible(template, &element);

        let themed = |palette_color: &str| config.text_color.clone().unwrap_or_else(|| palette_color.to_string());

        // Per-element overrides win over the theme color
        let block = |element: ElementId, text: String, base: f64, role: FontRole, default_color: String| {
            let style = config.element_styles.get(&element);
            let scale = style.and_then(|s| s.scale).unwrap_or(1.0);
            let color = style.and_then(|s| s.color.clone()).unwrap_or(default_color);
            TextBlock {
                text,
                size: base * scale * unit,
                color,
                font: config.font_for(role).css_family(),
            }
        };

        let background = utils::image_src(&config.bg_image).map(|href| BackgroundBlock {
            href: href.to_string(),
            preserve: config.bg_mode.preserve_aspect_ratio(),
            opacity: config.bg_opacity(),
        });

        let logos = if visible(ElementId::Logo) {
            let logo_height = 70.0 * unit * config.logo_scale();
            logo_row(
                &config.logo_sources(),
                config.logo_alignment,
                f64::from(width),
                f64::from(height) * 0.05,
                logo_height,
                80.0 * unit,
            )
            .into_iter()
            .map(|(href, x, y, w, h)| ImageBlock { href, x, y, w, h })
            .collect()
        } else {
            Vec::new()
        };

        let title = visible(ElementId::Title).then(|| {
            block(
                ElementId::Title,
                utils::title_text(template, data, config),
                48.0,
                FontRole::Title,
                themed(self.palette.heading),
            )
        });
        let presented_to = visible(ElementId::PresentedTo).then(|| {
            block(
                ElementId::PresentedTo,
                config.label(template, LabelKey::PresentedTo),
                20.0,
                FontRole::Body,
                themed(self.palette.body),
            )
        });
        let recipient = block(
            ElementId::Recipient,
            data.recipient_name.clone(),
            54.0,
            FontRole::Recipient,
            themed(self.palette.recipient),
        );

        // El nombre del evento arrastra consigo a su prefijo
        let event_visible = visible(ElementId::EventName);
        let event_prefix = (event_visible && visible(ElementId::EventStr)).then(|| {
            block(
                ElementId::EventStr,
                config.label(template, LabelKey::EventPrefix),
                18.0,
                FontRole::Body,
                themed(self.palette.body),
            )
        });
        let event_name = event_visible.then(|| {
            block(
                ElementId::EventName,
                data.event_name.clone(),
                28.0,
                FontRole::Body,
                themed(self.palette.heading),
            )
        });

        let date = visible(ElementId::Date).then(|| {
            block(
                ElementId::Date,
                utils::date_line(template, data, config),
                16.0,
                FontRole::Body,
                themed(self.palette.body),
            )
        });
        let entry_no = visible(ElementId::EntryNo).then(|| {
            block(
                ElementId::EntryNo,
                utils::entry_line(template, data, config),
                13.0,
                FontRole::Body,
                self.palette.muted.to_string(),
            )
        });
        let signature = visible(ElementId::Signature).then(|| {
            block(
                ElementId::Signature,
                config.label(template, LabelKey::Signature),
                16.0,
                FontRole::Body,
                themed(self.palette.body),
            )
        });

        let signature_image = visible(ElementId::SignatureImg)
            .then(|| utils::image_src(&config.signature_image).map(str::to_string))
            .flatten();
        let seal = visible(ElementId::Seal)
            .then(|| utils::image_src(&config.seal_image).map(str::to_string))
            .flatten();
        let qr = visible(ElementId::Qr)
            .then(|| utils::image_src(&data.qr_image).map(str::to_string))
            .flatten();

        FixedContext {
            width,
            height,
            cx: f64::from(width) / 2.0,
            unit,
            editable: mode.is_editable(),
            palette: self.palette.clone(),
            background,
            logos,
            title,
            presented_to,
            recipient,
            event_prefix,
            event_name,
            date,
            entry_no,
            signature,
            signature_image,
            seal,
            qr,
        }
    }
}
