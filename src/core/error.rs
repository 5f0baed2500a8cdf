use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertificateError {
    /// The template could not be mounted or captured for one certificate.
    #[error("Render error: {0}")]
    Render(String),

    #[error("Asset too large: {size} bytes exceeds the {limit} byte limit ({slot})")]
    AssetTooLarge {
        slot: String,
        size: usize,
        limit: usize,
    },

    #[error("Compression error: {0}")]
    Compression(String),

    /// Every recipient of a batch failed to rasterize.
    #[error("No certificate could be generated ({attempted} attempted)")]
    NoOutput { attempted: usize },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Export cancelled after {completed} certificates")]
    Cancelled { completed: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertificateError {
    /// Errors that only affect one recipient and must not abort a batch.
    pub fn is_per_certificate(&self) -> bool {
        matches!(
            self,
            CertificateError::Render(_) | CertificateError::Template(_) | CertificateError::Pdf(_)
        )
    }
}

impl From<minijinja::Error> for CertificateError {
    fn from(error: minijinja::Error) -> Self {
        CertificateError::Template(error.to_string())
    }
}

impl From<serde_json::Error> for CertificateError {
    fn from(error: serde_json::Error) -> Self {
        CertificateError::Validation(error.to_string())
    }
}

impl From<zip::result::ZipError> for CertificateError {
    fn from(error: zip::result::ZipError) -> Self {
        CertificateError::Archive(error.to_string())
    }
}

impl From<image::ImageError> for CertificateError {
    fn from(error: image::ImageError) -> Self {
        CertificateError::Compression(error.to_string())
    }
}

pub type CertificateResult<T> = Result<T, CertificateError>;
