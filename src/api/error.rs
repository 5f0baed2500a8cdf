use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

use crate::core::CertificateError;

#[derive(Debug)]
pub struct ApiError {
    message: String,
    status_code: StatusCode,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        ApiError {
            message: message.into(),
            status_code,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn too_many_requests() -> Self {
        Self::new("Rate limit exceeded", StatusCode::TOO_MANY_REQUESTS)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code)
            .json(serde_json::json!({
                "error": self.message,
                "status": self.status_code.as_u16()
            }))
    }

    fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

impl From<CertificateError> for ApiError {
    fn from(err: CertificateError) -> Self {
        let status_code = match &err {
            CertificateError::AssetTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CertificateError::Validation(_) | CertificateError::Template(_) => StatusCode::BAD_REQUEST,
            CertificateError::NoOutput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CertificateError::Persistence(_) => StatusCode::BAD_GATEWAY,
            CertificateError::Cancelled { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status_code.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        ApiError::new(err.to_string(), status_code)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<prometheus::Error> for ApiError {
    fn from(err: prometheus::Error) -> Self {
        ApiError::internal_server_error(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_certificate_errors_to_statuses() {
        let cases = [
            (
                CertificateError::AssetTooLarge {
                    slot: "bgImage".into(),
                    size: 10,
                    limit: 5,
                },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (CertificateError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CertificateError::NoOutput { attempted: 3 }, StatusCode::UNPROCESSABLE_ENTITY),
            (CertificateError::Persistence("down".into()), StatusCode::BAD_GATEWAY),
            (CertificateError::Cancelled { completed: 1 }, StatusCode::CONFLICT),
            (CertificateError::Pdf("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn keeps_the_message_verbatim() {
        let err = ApiError::from(CertificateError::NoOutput { attempted: 4 });
        assert_eq!(err.to_string(), "No certificate could be generated (4 attempted)");
    }
}
