use crate::core::CertificateResult;
use crate::models::{CertificateRenderData, ElementId, FontRole, LabelKey, LayoutConfig, TemplateId};
use crate::templates::svg::{image_element, line_element, logo_row_at, text_element, SvgBuilder, TextAnchor, TextSpec};
use crate::templates::template_trait::{utils, CertificateTemplate, ElementBox, RenderMode, RenderedCertificate};

const EDITOR_ACCENT: &str = "#3b82f6";
const EDITOR_DANGER: &str = "#ef4444";
const HANDLE_SIZE: f64 = 10.0;

/// Plantilla libre: cada elemento se posiciona, escala, colorea y oculta por separado
pub struct CustomTemplate;

impl CustomTemplate {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CustomTemplate {
    fn default() -> Self {
        Self::new()
    }
}

struct TextItem {
    element: ElementId,
    content: String,
    base_size: f64,
    role: FontRole,
    bold: bool,
    italic: bool,
    label: Option<LabelKey>,
}

/// Lienzo en construcción más las cajas de los elementos dibujados
struct Canvas<'a> {
    svg: SvgBuilder,
    config: &'a LayoutConfig,
    mode: RenderMode,
    unit: f64,
    elements: Vec<ElementBox>,
}

impl<'a> Canvas<'a> {
    fn new(config: &'a LayoutConfig, mode: RenderMode) -> Self {
        let (width, height) = config.canvas_size();
        Canvas {
            svg: SvgBuilder::new(width, height),
            config,
            mode,
            unit: f64::from(width.min(height)) / 794.0,
            elements: Vec::new(),
        }
    }

    fn width(&self) -> f64 {
        f64::from(self.svg.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.svg.height())
    }

    fn visible(&self, element: &ElementId) -> bool {
        self.config.is_visible(TemplateId::Custom, element)
    }

    /// Ancla del elemento en píxeles
    fn anchor(&self, element: &ElementId) -> (f64, f64) {
        let position = self.config.position(element);
        (position.x / 100.0 * self.width(), position.y / 100.0 * self.height())
    }

    fn background(&mut self) {
        let (width, height) = (self.width(), self.height());
        self.svg.add_rect(0.0, 0.0, width, height, "#ffffff", None);
        if let Some(href) = utils::image_src(&self.config.bg_image) {
            self.svg.add_image(
                href,
                0.0,
                0.0,
                width,
                height,
                self.config.bg_mode.preserve_aspect_ratio(),
                self.config.bg_opacity(),
            );
        }
    }

    fn text(&mut self, item: TextItem) {
        if !self.visible(&item.element) || item.content.trim().is_empty() {
            return;
        }
        let style = self.config.style(&item.element);
        let font_family = self.config.font_for(item.role).css_family();
        let font_size = item.base_size * style.scale * self.unit;
        let (x, y) = self.anchor(&item.element);

        let markup = text_element(&TextSpec {
            x,
            y,
            content: &item.content,
            font_family: &font_family,
            font_size,
            color: &style.color,
            bold: item.bold,
            italic: item.italic,
            anchor: TextAnchor::Middle,
        });
        let bbox = text_box(&item.element, x, y, &item.content, font_size);
        self.place(bbox, markup, item.label);
    }

    /// Imagen centrada en su ancla; `base` es (ancho, alto) a escala 1
    fn image(&mut self, element: ElementId, href: Option<&str>, base: (f64, f64)) {
        let Some(href) = href else {
            return;
        };
        if !self.visible(&element) {
            return;
        }
        let scale = self.config.style(&element).scale;
        let (w, h) = (base.0 * scale * self.unit, base.1 * scale * self.unit);
        let (cx, cy) = self.anchor(&element);
        let (x, y) = (cx - w / 2.0, cy - h / 2.0);

        let markup = image_element(href, x, y, w, h, "xMidYMid meet", 1.0);
        let bbox = ElementBox {
            element,
            x,
            y,
            width: w,
            height: h,
        };
        self.place(bbox, markup, None);
    }

    fn logos(&mut self) {
        let element = ElementId::Logo;
        let sources = self.config.logo_sources();
        if sources.is_empty() || !self.visible(&element) {
            return;
        }
        let scale = self.config.style(&element).scale;
        let height = 90.0 * self.unit * self.config.logo_scale() * scale;
        let (anchor_x, anchor_y) = self.anchor(&element);
        let row = logo_row_at(&sources, self.config.logo_alignment, anchor_x, anchor_y - height / 2.0, height);

        let left = row.iter().map(|l| l.1).fold(f64::INFINITY, f64::min);
        let right = row.iter().map(|l| l.1 + l.3).fold(f64::NEG_INFINITY, f64::max);
        let markup = row
            .iter()
            .map(|(href, x, y, w, h)| image_element(href, *x, *y, *w, *h, "xMidYMid meet", 1.0))
            .collect::<String>();
        let bbox = ElementBox {
            element,
            x: left,
            y: anchor_y - height / 2.0,
            width: right - left,
            height,
        };
        self.place(bbox, markup, None);
    }

    fn custom_texts(&mut self) {
        let config = self.config;
        for custom in &config.custom_texts {
            let element = ElementId::Custom(custom.id.clone());
            if !self.visible(&element) || custom.content.trim().is_empty() {
                continue;
            }
            let style = config.style(&element);
            let color = custom.color.clone().unwrap_or(style.color);
            let font_family = custom
                .font_style
                .unwrap_or_else(|| config.font_for(FontRole::Body))
                .css_family();
            let font_size = custom.font_size * style.scale;
            let (x, y) = self.anchor(&element);

            let markup = text_element(&TextSpec {
                x,
                y,
                content: &custom.content,
                font_family: &font_family,
                font_size,
                color: &color,
                bold: false,
                italic: false,
                anchor: TextAnchor::Middle,
            });
            let bbox = text_box(&element, x, y, &custom.content, font_size);
            self.place(bbox, markup, None);
        }
    }

    /// Añade el elemento; en modo editable lo envuelve con asa y botón de ocultar
    fn place(&mut self, bbox: ElementBox, markup: String, label: Option<LabelKey>) {
        if self.mode.is_editable() {
            let key = bbox.element.to_string();
            let mut attributes = vec![("data-element", key.clone())];
            if let Some(label) = label {
                attributes.push(("data-label", label.to_string()));
            }
            let children = vec![markup, outline(&bbox), resize_handle(&bbox, &key), hide_button(&bbox, &key)];
            self.svg.add_group(&attributes, children);
        } else {
            self.svg.add_raw(&markup);
        }
        self.elements.push(bbox);
    }

    fn center_guide(&mut self) {
        if !self.mode.shows_center_guide() {
            return;
        }
        let x = self.width() / 2.0;
        let line = line_element(x, 0.0, x, self.height(), EDITOR_DANGER, 1.0, true);
        self.svg.add_group(&[("data-guide", "center".to_string())], vec![line]);
    }
}

/// Caja aproximada de un texto centrado en (x, y)
fn text_box(element: &ElementId, x: f64, y: f64, content: &str, font_size: f64) -> ElementBox {
    let width = content.chars().count() as f64 * font_size * 0.55;
    let height = font_size * 1.2;
    ElementBox {
        element: element.clone(),
        x: x - width / 2.0,
        y: y - height / 2.0,
        width,
        height,
    }
}

fn outline(bbox: &ElementBox) -> String {
    format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}" stroke-width="1" stroke-dasharray="4 3"/>"#,
        bbox.x, bbox.y, bbox.width, bbox.height, EDITOR_ACCENT
    )
}

fn resize_handle(bbox: &ElementBox, key: &str) -> String {
    format!(
        r#"<rect data-handle="resize" data-element="{}" x="{:.2}" y="{:.2}" width="{}" height="{}" fill="{}"/>"#,
        key,
        bbox.x + bbox.width - HANDLE_SIZE / 2.0,
        bbox.y + bbox.height - HANDLE_SIZE / 2.0,
        HANDLE_SIZE,
        HANDLE_SIZE,
        EDITOR_ACCENT
    )
}

fn hide_button(bbox: &ElementBox, key: &str) -> String {
    let (cx, cy) = (bbox.x + bbox.width, bbox.y);
    format!(
        r##"<g data-action="hide" data-element="{key}"><circle cx="{cx:.2}" cy="{cy:.2}" r="8" fill="{fill}"/><text x="{cx:.2}" y="{cy:.2}" font-size="12" fill="#ffffff" text-anchor="middle" dominant-baseline="middle">×</text></g>"##,
        key = key,
        cx = cx,
        cy = cy,
        fill = EDITOR_DANGER
    )
}

impl CertificateTemplate for CustomTemplate {
    fn template_id(&self) -> TemplateId {
        TemplateId::Custom
    }

    fn canvas_size(&self, config: &LayoutConfig) -> (u32, u32) {
        config.canvas_size()
    }

    fn render(
        &self,
        data: &CertificateRenderData,
        config: &LayoutConfig,
        mode: RenderMode,
    ) -> CertificateResult<RenderedCertificate> {
        let template = TemplateId::Custom;
        let mut canvas = Canvas::new(config, mode);

        canvas.background();
        canvas.logos();

        let texts = [
            TextItem {
                element: ElementId::Title,
                content: utils::title_text(template, data, config),
                base_size: 48.0,
                role: FontRole::Title,
                bold: true,
                italic: false,
                label: Some(LabelKey::Title),
            },
            TextItem {
                element: ElementId::PresentedTo,
                content: config.label(template, LabelKey::PresentedTo),
                base_size: 20.0,
                role: FontRole::Body,
                bold: false,
                italic: true,
                label: Some(LabelKey::PresentedTo),
            },
            TextItem {
                element: ElementId::Recipient,
                content: data.recipient_name.clone(),
                base_size: 56.0,
                role: FontRole::Recipient,
                bold: true,
                italic: false,
                label: None,
            },
            TextItem {
                element: ElementId::EventStr,
                content: config.label(template, LabelKey::EventPrefix),
                base_size: 18.0,
                role: FontRole::Body,
                bold: false,
                italic: false,
                label: Some(LabelKey::EventPrefix),
            },
            TextItem {
                element: ElementId::EventName,
                content: data.event_name.clone(),
                base_size: 28.0,
                role: FontRole::Body,
                bold: true,
                italic: false,
                label: None,
            },
            TextItem {
                element: ElementId::EntryNo,
                content: utils::entry_line(template, data, config),
                base_size: 14.0,
                role: FontRole::Body,
                bold: false,
                italic: false,
                label: Some(LabelKey::EntryNo),
            },
            TextItem {
                element: ElementId::Date,
                content: utils::date_line(template, data, config),
                base_size: 16.0,
                role: FontRole::Body,
                bold: false,
                italic: true,
                label: Some(LabelKey::DatePrefix),
            },
        ];
        for item in texts {
            canvas.text(item);
        }

        canvas.image(ElementId::Qr, utils::image_src(&data.qr_image), (110.0, 110.0));
        canvas.image(
            ElementId::SignatureImg,
            utils::image_src(&config.signature_image),
            (200.0, 80.0),
        );
        canvas.image(ElementId::Seal, utils::image_src(&config.seal_image), (120.0, 120.0));
        canvas.text(TextItem {
            element: ElementId::Signature,
            content: config.label(template, LabelKey::Signature),
            base_size: 16.0,
            role: FontRole::Body,
            bold: true,
            italic: false,
            label: Some(LabelKey::Signature),
        });

        canvas.custom_texts();
        canvas.center_guide();

        Ok(RenderedCertificate {
            template_id: template,
            width: canvas.svg.width(),
            height: canvas.svg.height(),
            svg: canvas.svg.build(),
            elements: canvas.elements,
        })
    }

    fn description(&self) -> &str {
        "Personalizado: elementos libres sobre el tamaño de papel elegido"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Orientation, PaperSize};
    use crate::models::{CertificateType, CustomText, ElementStyle, Position};

    fn data() -> CertificateRenderData {
        CertificateRenderData {
            recipient_name: "Nguyễn Văn A".into(),
            title: "Chứng nhận".into(),
            event_name: "Hội thao".into(),
            issue_date: "02/09/2024".into(),
            certificate_type: CertificateType::Completion,
            verification_code: "QWERTY".into(),
            qr_image: Some("data:image/png;base64,iVBORw0KGgo=".into()),
        }
    }

    fn render(config: &LayoutConfig, mode: RenderMode) -> RenderedCertificate {
        CustomTemplate::new().render(&data(), config, mode).unwrap()
    }

    #[test]
    fn a4_portrait_canvas() {
        let config = LayoutConfig {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            ..Default::default()
        };
        let rendered = render(&config, RenderMode::Static);
        assert_eq!((rendered.width, rendered.height), (794, 1123));
        assert!(rendered.svg.contains(r#"width="794" height="1123""#));
    }

    #[test]
    fn qr_hidden_unless_enabled() {
        let mut config = LayoutConfig::default();
        let rendered = render(&config, RenderMode::Static);
        assert!(!rendered.svg.contains("iVBORw0KGgo"));

        config.visibility.insert(ElementId::Qr, true);
        let rendered = render(&config, RenderMode::Static);
        assert!(rendered.svg.contains("iVBORw0KGgo"));
        assert!(rendered.elements.iter().any(|b| b.element == ElementId::Qr));
    }

    #[test]
    fn missing_images_are_omitted() {
        let rendered = render(&LayoutConfig::default(), RenderMode::Static);
        assert!(!rendered.elements.iter().any(|b| b.element == ElementId::Seal));
        assert!(!rendered.elements.iter().any(|b| b.element == ElementId::SignatureImg));
        assert!(!rendered.elements.iter().any(|b| b.element == ElementId::Logo));
    }

    #[test]
    fn elements_follow_positions_and_scale() {
        let mut config = LayoutConfig::default();
        config.positions.insert(ElementId::Recipient, Position::new(25.0, 50.0));
        config.element_styles.insert(
            ElementId::Recipient,
            ElementStyle {
                scale: Some(0.5),
                color: Some("#ff0000".into()),
            },
        );
        let rendered = render(&config, RenderMode::Static);
        let recipient = rendered
            .elements
            .iter()
            .find(|b| b.element == ElementId::Recipient)
            .unwrap();
        let center_x = recipient.x + recipient.width / 2.0;
        assert!((center_x - 1123.0 * 0.25).abs() < 1e-6);
        assert!(rendered.svg.contains(r##"font-size="28.00" fill="#ff0000""##));
    }

    #[test]
    fn hidden_elements_are_not_drawn() {
        let mut config = LayoutConfig::default();
        config.visibility.insert(ElementId::Recipient, false);
        let rendered = render(&config, RenderMode::Static);
        assert!(!rendered.svg.contains("Nguyễn Văn A"));
    }

    #[test]
    fn custom_texts_use_their_own_anchor() {
        let mut config = LayoutConfig::default();
        config.custom_texts.push(CustomText {
            id: "motto".into(),
            content: "Tiên học lễ".into(),
            x: 10.0,
            y: 90.0,
            font_size: 20.0,
            color: Some("#123456".into()),
            font_style: None,
        });
        let rendered = render(&config, RenderMode::Editable { show_center_guide: false });
        assert!(rendered.svg.contains(r#"data-element="custom_motto""#));
        assert!(rendered.svg.contains("#123456"));
        let hit = rendered.element_at(1123.0 * 0.10, 794.0 * 0.90);
        assert_eq!(hit, Some(&ElementId::Custom("motto".into())));
    }

    #[test]
    fn editable_mode_adds_affordances() {
        let rendered = render(&LayoutConfig::default(), RenderMode::Editable { show_center_guide: true });
        assert!(rendered.svg.contains(r#"data-handle="resize""#));
        assert!(rendered.svg.contains(r#"data-action="hide""#));
        assert!(rendered.svg.contains(r#"data-guide="center""#));
        assert!(rendered.svg.contains(r#"data-label="presentedTo""#));

        let static_svg = render(&LayoutConfig::default(), RenderMode::Static).svg;
        assert!(!static_svg.contains("data-element"));
        assert!(!static_svg.contains("data-handle"));
        assert!(!static_svg.contains("data-guide"));
    }
}
