mod http;

pub use http::HttpDetectionClient;

use actix_web::http::StatusCode;
use async_trait::async_trait;
use bytes::Bytes;
use shared::DetectionModel;
use thiserror::Error;

use crate::upload::UploadedFile;

/// One outbound multipart POST to a detection service.
#[derive(Debug, Clone)]
pub struct BackendCall {
    pub model: DetectionModel,
    pub url: String,
    /// Text parts sent after the `file` part, in order.
    pub fields: Vec<(String, String)>,
    pub file: UploadedFile,
    pub bearer_token: Option<String>,
}

impl BackendCall {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw answer of a detection service; the body is read in full.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: u16,
    /// Reason phrase from the status line when it is not the canonical one.
    pub reason_phrase: Option<String>,
    pub body: Bytes,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Upstream reason phrase, or the canonical one for the status code.
    pub fn reason(&self) -> String {
        if let Some(phrase) = self.reason_phrase.as_deref().filter(|p| !p.is_empty()) {
            return phrase.to_string();
        }
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default()
            .to_string()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Request(String),
}

#[async_trait]
pub trait DetectionClient: Send + Sync {
    async fn submit(&self, call: BackendCall) -> Result<BackendReply, TransportError>;
}
