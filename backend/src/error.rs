use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use shared::{ArchiveError, DetectionModel, ErrorBody};
use thiserror::Error;

use crate::detection::TransportError;

/// Every way `POST /api/upload` can fail. Each variant renders as one JSON `ErrorBody`.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,
    #[error("Only ZIP files are allowed")]
    InvalidType,
    #[error("File size must be less than 5GB")]
    TooLarge,
    #[error("Backend service is not configured")]
    Misconfigured,
    #[error("{model} service error: {reason}")]
    Backend {
        model: DetectionModel,
        status: u16,
        reason: String,
        body: String,
    },
    #[error("Upload timeout - file may be too large or backend processing took too long")]
    Timeout,
    #[error("File is too large")]
    PayloadTooLarge,
    #[error("Cannot connect to backend service")]
    ConnectionRefused,
    #[error("Failed to upload file")]
    Unclassified(String),
}

impl UploadError {
    /// Catch-all for unexpected failures, refined by what the diagnostic mentions.
    pub fn classify(diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        let lowered = diagnostic.to_lowercase();
        let mentions_413 = diagnostic
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token == "413");
        if diagnostic.contains("PayloadTooLarge")
            || lowered.contains("payload too large")
            || mentions_413
        {
            UploadError::PayloadTooLarge
        } else if diagnostic.contains("ECONNREFUSED") || lowered.contains("connection refused") {
            UploadError::ConnectionRefused
        } else {
            UploadError::Unclassified(diagnostic)
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            UploadError::Backend { body, .. } => Some(body.clone()),
            UploadError::Timeout => {
                Some("Please try with a smaller file or contact support".to_string())
            }
            UploadError::PayloadTooLarge => {
                Some("The file exceeds the maximum allowed size of 5GB".to_string())
            }
            UploadError::ConnectionRefused => Some(
                "Please ensure the backend service is running and accessible".to_string(),
            ),
            UploadError::Unclassified(diagnostic) => Some(diagnostic.clone()),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            details: self.details(),
        }
    }
}

impl From<ArchiveError> for UploadError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::InvalidType => UploadError::InvalidType,
            ArchiveError::TooLarge => UploadError::TooLarge,
        }
    }
}

impl From<TransportError> for UploadError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect(_) => UploadError::ConnectionRefused,
            TransportError::Request(diagnostic) => UploadError::classify(diagnostic),
        }
    }
}

impl From<actix_multipart::MultipartError> for UploadError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        UploadError::classify(err.to_string())
    }
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::MissingFile | UploadError::InvalidType | UploadError::TooLarge => {
                StatusCode::BAD_REQUEST
            }
            UploadError::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            UploadError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            UploadError::Misconfigured
            | UploadError::PayloadTooLarge
            | UploadError::ConnectionRefused
            | UploadError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests_without_details() {
        for err in [
            UploadError::MissingFile,
            UploadError::InvalidType,
            UploadError::TooLarge,
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.details(), None);
        }
        assert_eq!(UploadError::MissingFile.body().error, "No file provided");
    }

    #[test]
    fn backend_error_relays_upstream_status_and_body() {
        let err = UploadError::Backend {
            model: DetectionModel::HerdNet,
            status: 503,
            reason: "Service Unavailable".to_string(),
            body: "model warming up".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let body = err.body();
        assert_eq!(body.error, "HerdNet service error: Service Unavailable");
        assert_eq!(body.details.as_deref(), Some("model warming up"));
    }

    #[test]
    fn out_of_range_upstream_status_becomes_bad_gateway() {
        let err = UploadError::Backend {
            model: DetectionModel::Yolo,
            status: 1000,
            reason: String::new(),
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn classify_recognises_known_diagnostics() {
        assert!(matches!(
            UploadError::classify("PayloadTooLargeError: request entity too large"),
            UploadError::PayloadTooLarge
        ));
        assert!(matches!(
            UploadError::classify("status 413"),
            UploadError::PayloadTooLarge
        ));
        assert!(matches!(
            UploadError::classify("connect ECONNREFUSED 127.0.0.1:8000"),
            UploadError::ConnectionRefused
        ));
        assert!(matches!(
            UploadError::classify("tcp connect error: Connection refused (os error 111)"),
            UploadError::ConnectionRefused
        ));

        assert!(matches!(
            UploadError::classify("error sending request for url (http://models:4130/analyze-image)"),
            UploadError::Unclassified(_)
        ));

        let other = UploadError::classify("boundary missing");
        assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = other.body();
        assert_eq!(body.error, "Failed to upload file");
        assert_eq!(body.details.as_deref(), Some("boundary missing"));
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = UploadError::Timeout;
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            err.body().details.as_deref(),
            Some("Please try with a smaller file or contact support")
        );
    }
}
