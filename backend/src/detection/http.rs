use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};
use std::error::Error as StdError;

use super::{BackendCall, BackendReply, DetectionClient, TransportError};
use crate::upload::UploadedFile;

/// Talks to the detection services over HTTP with a shared connection pool.
#[derive(Clone, Default)]
pub struct HttpDetectionClient {
    http_client: HttpClient,
}

impl HttpDetectionClient {
    pub fn new() -> Self {
        Self {
            http_client: HttpClient::new(),
        }
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn submit(&self, call: BackendCall) -> Result<BackendReply, TransportError> {
        let mut form = Form::new().part("file", file_part(&call.file));
        for (name, value) in call.fields {
            form = form.text(name, value);
        }

        let mut request = self.http_client.post(&call.url).multipart(form);
        if let Some(token) = &call.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let reason_phrase = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned());
        let body = response.bytes().await?;
        Ok(BackendReply {
            status,
            reason_phrase,
            body,
        })
    }
}

fn file_part(file: &UploadedFile) -> Part {
    let part = || {
        Part::stream_with_length(file.data.clone(), file.data.len() as u64)
            .file_name(file.name.clone())
    };
    match file.content_type.as_deref() {
        Some(mime) => part().mime_str(mime).unwrap_or_else(|_| {
            log::warn!("Dropping unparseable media type {:?} for {}", mime, file.name);
            part()
        }),
        None => part(),
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let diagnostic = error_chain(&err);
        if err.is_connect() {
            TransportError::Connect(diagnostic)
        } else {
            TransportError::Request(diagnostic)
        }
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
