pub mod api;
pub mod core;
pub mod editor;
pub mod generators;
pub mod models;
pub mod preparation;
pub mod render;
pub mod storage;
pub mod templates;

// Re-export commonly used types
pub use crate::core::{CertificateError, CertificateResult};
pub use generators::{CertificateExporter, ExportFormat, ExportOutcome};
pub use models::{CertificateRenderData, LayoutConfig, TemplateId};
pub use render::{Rasterizer, RenderJob, ResvgRasterizer};
pub use templates::{RenderMode, TemplateRegistry};
