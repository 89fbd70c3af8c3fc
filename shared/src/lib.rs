//! Types shared between the upload gateway and its clients.
//!
//! The crate root holds the wire format of `POST /api/upload`, which the
//! backend produces. [`upload`] and [`report`] are client-facing API: what a
//! browser or CLI uploader needs to build a request and render the merged
//! result. The backend only uses the archive check from [`upload`].

pub mod report;
pub mod upload;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumIter};

pub use upload::{ArchiveError, MAX_ARCHIVE_BYTES, validate_archive};

pub const SUCCESS_MESSAGE: &str = "Files processed successfully by both models";

/// The two external detection services an upload is fanned out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DetectionModel {
    #[strum(serialize = "HerdNet")]
    HerdNet,
    #[strum(serialize = "YOLO")]
    Yolo,
}

impl DetectionModel {
    /// Path segment appended to the services' base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            DetectionModel::HerdNet => "analyze-image",
            DetectionModel::Yolo => "analyze-yolo",
        }
    }

    /// Optional form fields this service understands.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            DetectionModel::HerdNet => &[
                "patch_size",
                "overlap",
                "rotation",
                "thumbnail_size",
                "include_thumbnails",
            ],
            DetectionModel::Yolo => &["conf_threshold", "iou_threshold", "img_size"],
        }
    }

    /// Flag that is always sent as `true` so the service returns images.
    pub fn forced_flag(&self) -> &'static str {
        match self {
            DetectionModel::HerdNet => "include_plots",
            DetectionModel::Yolo => "include_annotated_images",
        }
    }
}

/// Successful response of `POST /api/upload`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MergedResult {
    pub message: String,
    pub herdnet: Value,
    pub yolo: Value,
    pub file_name: String,
    pub file_size: u64,
}

/// Error body returned by every failing branch of `POST /api/upload`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn merged_result_uses_camel_case_keys() {
        let merged = MergedResult {
            message: SUCCESS_MESSAGE.to_string(),
            herdnet: json!({"detections": []}),
            yolo: json!({"annotated_images": []}),
            file_name: "herd.zip".to_string(),
            file_size: 42,
        };
        let value = serde_json::to_value(&merged).unwrap();
        assert_eq!(value["fileName"], "herd.zip");
        assert_eq!(value["fileSize"], 42);
        assert!(value.get("file_name").is_none());
    }

    #[test]
    fn error_body_omits_missing_details() {
        let body = ErrorBody {
            error: "No file provided".to_string(),
            details: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"No file provided"}"#
        );
    }

    #[test]
    fn every_model_has_distinct_endpoint_and_flag() {
        let models: Vec<_> = DetectionModel::iter().collect();
        assert_eq!(models.len(), 2);
        assert_ne!(models[0].endpoint(), models[1].endpoint());
        assert_ne!(models[0].forced_flag(), models[1].forced_flag());
        assert_eq!(DetectionModel::HerdNet.to_string(), "HerdNet");
        assert_eq!(DetectionModel::Yolo.to_string(), "YOLO");
    }
}
