pub mod archive;
pub mod export;
pub mod pdf;

pub use archive::{sanitize_file_component, ArchiveBuilder};
pub use export::{CertificateExporter, ExportFormat, ExportOutcome, SkippedCertificate};
pub use pdf::PdfAssembler;
