pub mod engine;
pub mod helpers;
pub mod svg;
pub mod template_trait;
pub mod templates;

pub use engine::{FixedLayout, Palette, TemplateEngine, FIXED_CANVAS};
pub use template_trait::{CertificateTemplate, ElementBox, RenderMode, RenderedCertificate, TemplateRegistry};
