use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use log::{error, info};
use shared::MAX_ARCHIVE_BYTES;

use crate::error::UploadError;
use crate::orchestrator::UploadOrchestrator;
use crate::upload::UploadForm;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/upload").route(web::post().to(handle_upload)));
}

async fn handle_upload(
    orchestrator: web::Data<UploadOrchestrator>,
    payload: Multipart,
) -> Result<HttpResponse, UploadError> {
    let result = async {
        let form = UploadForm::read(payload, MAX_ARCHIVE_BYTES).await?;
        orchestrator.process(form).await
    }
    .await;

    match result {
        Ok(merged) => {
            info!(
                "Upload {} processed by both models ({} bytes)",
                merged.file_name, merged.file_size
            );
            Ok(HttpResponse::Ok().json(merged))
        }
        Err(e) => {
            if let UploadError::Unclassified(diagnostic) = &e {
                error!("Upload error: {}", diagnostic);
            }
            Err(e)
        }
    }
}
