use crate::core::CertificateResult;
use crate::models::{CertificateRenderData, LayoutConfig, TemplateId};
use crate::templates::engine::{FixedLayout, Palette};
use crate::templates::template_trait::{CertificateTemplate, RenderMode, RenderedCertificate};

pub struct LuxuryTemplate {
    layout: FixedLayout,
}

impl LuxuryTemplate {
    pub fn new() -> Self {
        Self {
            layout: FixedLayout {
                template_id: TemplateId::Luxury,
                source: "luxury.svg.j2",
                palette: Palette {
                    background: "#111827",
                    primary: "#0b1220",
                    accent: "#d4af37",
                    heading: "#d4af37",
                    body: "#e5e7eb",
                    recipient: "#f5e6a8",
                    muted: "#9ca3af",
                },
            },
        }
    }
}

impl Default for LuxuryTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateTemplate for LuxuryTemplate {
    fn template_id(&self) -> TemplateId {
        TemplateId::Luxury
    }

    fn render(
        &self,
        data: &CertificateRenderData,
        config: &LayoutConfig,
        mode: RenderMode,
    ) -> CertificateResult<RenderedCertificate> {
        self.layout.render(data, config, mode)
    }

    fn description(&self) -> &str {
        "Lujo: fondo oscuro con degradado dorado"
    }
}
