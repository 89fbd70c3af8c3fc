//! Fans one uploaded archive out to HerdNet and YOLO and merges the answers.
//!
//! Both calls run under a single deadline. The join waits for both; any
//! failure of either call fails the whole upload and the other result is
//! discarded.

use futures::future;
use serde_json::Value;
use shared::{DetectionModel, MergedResult, SUCCESS_MESSAGE};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::detection::{BackendCall, BackendReply, DetectionClient, TransportError};
use crate::error::UploadError;
use crate::upload::{self, UploadForm, UploadedFile, describe_parameters, outbound_fields};

type Outcome = Result<BackendReply, TransportError>;

#[derive(Clone)]
pub struct UploadOrchestrator {
    config: Config,
    client: Arc<dyn DetectionClient>,
}

impl UploadOrchestrator {
    pub fn new(config: Config, client: Arc<dyn DetectionClient>) -> Self {
        Self { config, client }
    }

    pub async fn process(&self, form: UploadForm) -> Result<MergedResult, UploadError> {
        let file = upload::validate(form.file.as_ref())?;
        let base_url = self.config.backend_url.as_deref().ok_or_else(|| {
            log::error!("BACKEND_URL is not set");
            UploadError::Misconfigured
        })?;

        let upload_id = Uuid::new_v4();
        log::info!(
            "[{}] Processing file: {}, size: {:.2} MB",
            upload_id,
            file.name,
            file.size_mb()
        );
        log::info!(
            "[{}] HerdNet parameters: {}",
            upload_id,
            describe_parameters(DetectionModel::HerdNet, &form)
        );
        log::info!(
            "[{}] YOLO parameters: {}",
            upload_id,
            describe_parameters(DetectionModel::Yolo, &form)
        );

        let herdnet_call = self.build_call(DetectionModel::HerdNet, base_url, file, &form);
        let yolo_call = self.build_call(DetectionModel::Yolo, base_url, file, &form);

        let (herdnet, yolo) = self.dispatch(upload_id, herdnet_call, yolo_call).await?;

        // Statuses of both are checked before either body is parsed.
        let herdnet = Self::accept(upload_id, DetectionModel::HerdNet, herdnet)?;
        let yolo = Self::accept(upload_id, DetectionModel::Yolo, yolo)?;

        Ok(MergedResult {
            message: SUCCESS_MESSAGE.to_string(),
            herdnet: Self::parse(DetectionModel::HerdNet, &herdnet)?,
            yolo: Self::parse(DetectionModel::Yolo, &yolo)?,
            file_name: file.name.clone(),
            file_size: file.size,
        })
    }

    fn build_call(
        &self,
        model: DetectionModel,
        base_url: &str,
        file: &UploadedFile,
        form: &UploadForm,
    ) -> BackendCall {
        BackendCall {
            model,
            url: format!("{}/{}", base_url, model.endpoint()),
            fields: outbound_fields(model, form),
            file: file.clone(),
            bearer_token: self.config.backend_api_key.clone(),
        }
    }

    /// Runs both calls concurrently. When the deadline passes the joined
    /// future is dropped, cancelling whichever calls are still in flight.
    async fn dispatch(
        &self,
        upload_id: Uuid,
        herdnet: BackendCall,
        yolo: BackendCall,
    ) -> Result<(Outcome, Outcome), UploadError> {
        let both = future::join(self.client.submit(herdnet), self.client.submit(yolo));
        tokio::time::timeout(self.config.upload_timeout, both)
            .await
            .map_err(|_| {
                log::error!(
                    "[{}] Backend request timeout after {}s",
                    upload_id,
                    self.config.upload_timeout.as_secs()
                );
                UploadError::Timeout
            })
    }

    fn accept(
        upload_id: Uuid,
        model: DetectionModel,
        outcome: Outcome,
    ) -> Result<BackendReply, UploadError> {
        match outcome {
            Ok(reply) if reply.is_success() => Ok(reply),
            Ok(reply) => {
                let body = reply.text();
                log::error!("[{}] {} API error ({}): {}", upload_id, model, reply.status, body);
                Err(UploadError::Backend {
                    model,
                    status: reply.status,
                    reason: reply.reason(),
                    body,
                })
            }
            Err(err) => {
                log::error!("[{}] {} request failed: {}", upload_id, model, err);
                Err(err.into())
            }
        }
    }

    fn parse(model: DetectionModel, reply: &BackendReply) -> Result<Value, UploadError> {
        serde_json::from_slice(&reply.body).map_err(|e| {
            UploadError::Unclassified(format!("Invalid JSON from {} service: {}", model, e))
        })
    }
}
