use crate::core::CertificateResult;
use crate::models::{CertificateRenderData, LayoutConfig, TemplateId};
use crate::templates::engine::{FixedLayout, Palette};
use crate::templates::template_trait::{CertificateTemplate, RenderMode, RenderedCertificate};

/// Banda lateral y texto alineado a la izquierda. `tech` usa el mismo
/// diseño con otra paleta.
pub struct ModernTemplate {
    layout: FixedLayout,
}

impl ModernTemplate {
    pub fn modern() -> Self {
        Self {
            layout: FixedLayout {
                template_id: TemplateId::Modern,
                source: "modern.svg.j2",
                palette: Palette {
                    background: "#ffffff",
                    primary: "#2563eb",
                    accent: "#f59e0b",
                    heading: "#111827",
                    body: "#374151",
                    recipient: "#2563eb",
                    muted: "#6b7280",
                },
            },
        }
    }

    pub fn tech() -> Self {
        Self {
            layout: FixedLayout {
                template_id: TemplateId::Tech,
                source: "modern.svg.j2",
                palette: Palette {
                    background: "#0f172a",
                    primary: "#0891b2",
                    accent: "#22d3ee",
                    heading: "#f8fafc",
                    body: "#cbd5e1",
                    recipient: "#22d3ee",
                    muted: "#64748b",
                },
            },
        }
    }
}

impl CertificateTemplate for ModernTemplate {
    fn template_id(&self) -> TemplateId {
        self.layout.template_id
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
        match self.layout.template_id {
            TemplateId::Tech => "Tech: variante oscura de Moderno",
            _ => "Moderno: banda de color y tipografía limpia",
        }
    }

    fn listed(&self) -> bool {
        self.layout.template_id != TemplateId::Tech
    }
}
