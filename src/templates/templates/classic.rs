use crate::core::CertificateResult;
use crate::models::{CertificateRenderData, LayoutConfig, TemplateId};
use crate::templates::engine::{FixedLayout, Palette};
use crate::templates::template_trait::{CertificateTemplate, RenderMode, RenderedCertificate};

/// Marco doble azul y dorado sobre papel crema
pub struct ClassicTemplate {
    layout: FixedLayout,
}

impl ClassicTemplate {
    pub fn new() -> Self {
        Self {
            layout: FixedLayout {
                template_id: TemplateId::Classic,
                source: "classic.svg.j2",
                palette: Palette {
                    background: "#fffdf5",
                    primary: "#1e3a5f",
                    accent: "#c9a227",
                    heading: "#1e3a5f",
                    body: "#374151",
                    recipient: "#8b1a1a",
                    muted: "#6b7280",
                },
            },
        }
    }
}

impl Default for ClassicTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateTemplate for ClassicTemplate {
    fn template_id(&self) -> TemplateId {
        TemplateId::Classic
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
        "Clásico: marco doble con ornamentos dorados"
    }
}
