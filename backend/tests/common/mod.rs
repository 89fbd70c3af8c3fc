#![allow(dead_code)]

use async_trait::async_trait;
use backend::detection::{BackendCall, BackendReply, DetectionClient, TransportError};
use bytes::Bytes;
use shared::DetectionModel;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BOUNDARY: &str = "----detection-gateway-test-boundary";

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, file_name: &str, content_type: Option<&str>, data: &[u8]) -> Self {
        let mut head = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
        );
        if let Some(content_type) = content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");
        self.body.extend_from_slice(head.as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

#[derive(Clone)]
pub enum Script {
    Reply(u16, &'static str),
    Fail(TransportError),
    Stall(Duration),
}

/// Detection client that answers from a script and records every call.
pub struct FakeClient {
    herdnet: Script,
    yolo: Script,
    calls: Mutex<Vec<BackendCall>>,
}

impl FakeClient {
    pub fn new(herdnet: Script, yolo: Script) -> Arc<Self> {
        Arc::new(Self {
            herdnet,
            yolo,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn ok() -> Arc<Self> {
        Self::new(
            Script::Reply(200, r#"{"detections":[],"plots":[]}"#),
            Script::Reply(200, r#"{"annotated_images":[]}"#),
        )
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_for(&self, model: DetectionModel) -> Option<BackendCall> {
        self.calls().into_iter().find(|call| call.model == model)
    }
}

#[async_trait]
impl DetectionClient for FakeClient {
    async fn submit(&self, call: BackendCall) -> Result<BackendReply, TransportError> {
        let script = match call.model {
            DetectionModel::HerdNet => self.herdnet.clone(),
            DetectionModel::Yolo => self.yolo.clone(),
        };
        self.calls.lock().unwrap().push(call);
        match script {
            Script::Reply(status, body) => Ok(BackendReply {
                status,
                reason_phrase: None,
                body: Bytes::from_static(body.as_bytes()),
            }),
            Script::Fail(err) => Err(err),
            Script::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(BackendReply {
                    status: 200,
                    reason_phrase: None,
                    body: Bytes::from_static(b"{}"),
                })
            }
        }
    }
}
