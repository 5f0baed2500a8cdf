use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{CertificateError, CertificateResult};
use crate::models::{CertificateRenderData, ElementId, LabelKey, LayoutConfig, TemplateId};

/// Cómo se dibuja la plantilla
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Salida final, sin controles de edición
    #[default]
    Static,
    /// Anota los elementos arrastrables y añade asas de redimensionado
    Editable { show_center_guide: bool },
}

impl RenderMode {
    pub fn is_editable(&self) -> bool {
        matches!(self, RenderMode::Editable { .. })
    }

    pub fn shows_center_guide(&self) -> bool {
        matches!(self, RenderMode::Editable { show_center_guide: true })
    }
}

/// Caja de un elemento arrastrable, en píxeles del lienzo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBox {
    pub element: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBox {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Árbol visual resultante: un documento SVG de tamaño fijo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedCertificate {
    pub template_id: TemplateId,
    pub width: u32,
    pub height: u32,
    pub svg: String,
    /// Regiones arrastrables, vacío en las plantillas de diseño fijo
    pub elements: Vec<ElementBox>,
}

impl RenderedCertificate {
    /// Elemento bajo el puntero; el último dibujado gana
    pub fn element_at(&self, x: f64, y: f64) -> Option<&ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|b| b.contains(x, y))
            .map(|b| &b.element)
    }
}

/// Trait base para todas las plantillas de certificados
pub trait CertificateTemplate: Send + Sync {
    /// Retorna el ID único de la plantilla
    fn template_id(&self) -> TemplateId;

    /// Tamaño del lienzo en píxeles CSS
    fn canvas_size(&self, _config: &LayoutConfig) -> (u32, u32) {
        (1123, 794)
    }

    /// Genera el árbol visual a partir de los datos y la configuración
    fn render(
        &self,
        data: &CertificateRenderData,
        config: &LayoutConfig,
        mode: RenderMode,
    ) -> CertificateResult<RenderedCertificate>;

    /// Retorna una descripción de la plantilla
    fn description(&self) -> &str {
        "Plantilla de certificado"
    }

    /// Si la plantilla aparece en el selector
    fn listed(&self) -> bool {
        true
    }
}

/// Registry central de todas las plantillas disponibles
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, Arc<dyn CertificateTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        use crate::templates::templates::*;

        let mut registry = Self {
            templates: HashMap::new(),
        };

        registry.register(Arc::new(ClassicTemplate::new()));
        registry.register(Arc::new(LuxuryTemplate::new()));
        registry.register(Arc::new(ModernTemplate::modern()));
        // Tech: idéntica a Modern, oculta del selector
        registry.register(Arc::new(ModernTemplate::tech()));
        registry.register(Arc::new(CustomTemplate::new()));

        registry
    }

    pub fn register(&mut self, template: Arc<dyn CertificateTemplate>) {
        self.templates.insert(template.template_id(), template);
    }

    /// Obtiene una plantilla por su ID
    pub fn get(&self, template_id: TemplateId) -> CertificateResult<Arc<dyn CertificateTemplate>> {
        self.templates
            .get(&template_id)
            .cloned()
            .ok_or_else(|| CertificateError::Template(format!("Template not registered: {}", template_id)))
    }

    /// Renderiza con la configuración indicada o la predeterminada
    pub fn render(
        &self,
        template_id: TemplateId,
        data: &CertificateRenderData,
        config: Option<&LayoutConfig>,
        mode: RenderMode,
    ) -> CertificateResult<RenderedCertificate> {
        let template = self.get(template_id)?;
        match config {
            Some(config) => template.render(data, config, mode),
            None => template.render(data, &LayoutConfig::default(), mode),
        }
    }

    /// Lista las plantillas del selector, en orden estable
    pub fn list(&self) -> Vec<(TemplateId, String)> {
        TemplateId::ALL
            .iter()
            .filter_map(|id| self.templates.get(id))
            .filter(|template| template.listed())
            .map(|template| (template.template_id(), template.description().to_string()))
            .collect()
    }

    /// Valida si existe una plantilla con el ID dado
    pub fn exists(&self, template_id: TemplateId) -> bool {
        self.templates.contains_key(&template_id)
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Utilidades compartidas entre plantillas
pub mod utils {
    use super::*;

    /// Título mostrado: la etiqueta configurada, luego el título del certificado,
    /// luego el texto por defecto de la plantilla
    pub fn title_text(template: TemplateId, data: &CertificateRenderData, config: &LayoutConfig) -> String {
        if let Some(title) = config.labels.get(LabelKey::Title) {
            return title.to_string();
        }
        if !data.title.trim().is_empty() {
            return data.title.clone();
        }
        template.default_label(LabelKey::Title).to_string()
    }

    /// Línea de fecha, p. ej. "Ngày 20/11/2024"
    pub fn date_line(template: TemplateId, data: &CertificateRenderData, config: &LayoutConfig) -> String {
        join_caption(&config.label(template, LabelKey::DatePrefix), &data.issue_date)
    }

    /// Línea de número de registro, p. ej. "Số vào sổ: AB12CD"
    pub fn entry_line(template: TemplateId, data: &CertificateRenderData, config: &LayoutConfig) -> String {
        let caption = config.label(template, LabelKey::EntryNo);
        if caption.trim().is_empty() {
            data.verification_code.clone()
        } else {
            format!("{}: {}", caption, data.verification_code)
        }
    }

    fn join_caption(caption: &str, value: &str) -> String {
        match (caption.trim().is_empty(), value.trim().is_empty()) {
            (true, _) => value.to_string(),
            (false, true) => caption.to_string(),
            (false, false) => format!("{} {}", caption, value),
        }
    }

    /// Fuente no vacía de una imagen
    pub fn image_src(src: &Option<String>) -> Option<&str> {
        src.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CertificateType;

    fn data() -> CertificateRenderData {
        CertificateRenderData {
            recipient_name: "Nguyễn Văn A".into(),
            title: "Chứng nhận học sinh giỏi".into(),
            event_name: "Hội khỏe Phù Đổng".into(),
            issue_date: "20/11/2024".into(),
            certificate_type: CertificateType::Excellent,
            verification_code: "AB12CD".into(),
            qr_image: None,
        }
    }

    #[test]
    fn registry_lists_picker_templates_only() {
        let registry = TemplateRegistry::new();
        let listed: Vec<TemplateId> = registry.list().into_iter().map(|(id, _)| id).collect();
        assert_eq!(
            listed,
            vec![TemplateId::Classic, TemplateId::Luxury, TemplateId::Modern, TemplateId::Custom]
        );
        assert!(registry.exists(TemplateId::Tech));
    }

    #[test]
    fn title_prefers_configured_label() {
        let mut config = LayoutConfig::default();
        assert_eq!(utils::title_text(TemplateId::Classic, &data(), &config), "Chứng nhận học sinh giỏi");
        config.labels.set(LabelKey::Title, "BẰNG KHEN");
        assert_eq!(utils::title_text(TemplateId::Classic, &data(), &config), "BẰNG KHEN");

        let mut untitled = data();
        untitled.title.clear();
        assert_eq!(
            utils::title_text(TemplateId::Luxury, &untitled, &LayoutConfig::default()),
            "CHỨNG NHẬN"
        );
    }

    #[test]
    fn caption_lines() {
        let config = LayoutConfig::default();
        assert_eq!(utils::date_line(TemplateId::Classic, &data(), &config), "Ngày 20/11/2024");
        assert_eq!(utils::entry_line(TemplateId::Classic, &data(), &config), "Số vào sổ: AB12CD");
    }
}
