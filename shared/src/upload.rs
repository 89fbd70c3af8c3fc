//! Client-side upload model: archive validation, tunable detection
//! parameters and the form fields a browser or CLI client sends.

use strum_macros::Display;
use thiserror::Error;

use crate::DetectionModel;

/// Largest accepted archive, inclusive.
pub const MAX_ARCHIVE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

pub const ZIP_MEDIA_TYPES: [&str; 2] = ["application/zip", "application/x-zip-compressed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArchiveError {
    #[error("Only ZIP files are allowed")]
    InvalidType,
    #[error("File size must be less than 5GB")]
    TooLarge,
}

pub fn is_zip(file_name: &str, media_type: Option<&str>) -> bool {
    if file_name.to_lowercase().ends_with(".zip") {
        return true;
    }
    media_type
        .map(|mime| {
            let essence = mime.split(';').next().unwrap_or_default().trim();
            ZIP_MEDIA_TYPES
                .iter()
                .any(|zip| essence.eq_ignore_ascii_case(zip))
        })
        .unwrap_or(false)
}

/// Type is checked before size.
pub fn validate_archive(
    file_name: &str,
    media_type: Option<&str>,
    size: u64,
) -> Result<(), ArchiveError> {
    if !is_zip(file_name, media_type) {
        return Err(ArchiveError::InvalidType);
    }
    if size > MAX_ARCHIVE_BYTES {
        return Err(ArchiveError::TooLarge);
    }
    Ok(())
}

/// Quarter-turn rotations HerdNet applies before patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Rotation {
    #[default]
    #[strum(serialize = "0")]
    None,
    #[strum(serialize = "1")]
    Quarter,
    #[strum(serialize = "2")]
    Half,
    #[strum(serialize = "3")]
    ThreeQuarters,
}

impl TryFrom<u8> for Rotation {
    type Error = u8;

    fn try_from(steps: u8) -> Result<Self, Self::Error> {
        match steps {
            0 => Ok(Rotation::None),
            1 => Ok(Rotation::Quarter),
            2 => Ok(Rotation::Half),
            3 => Ok(Rotation::ThreeQuarters),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HerdnetParams {
    pub patch_size: u32,
    pub overlap: u32,
    pub rotation: Rotation,
    pub thumbnail_size: u32,
    pub include_thumbnails: bool,
}

impl Default for HerdnetParams {
    fn default() -> Self {
        Self {
            patch_size: 512,
            overlap: 160,
            rotation: Rotation::None,
            thumbnail_size: 256,
            include_thumbnails: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloParams {
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub img_size: u32,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            img_size: 640,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadParams {
    pub herdnet: HerdnetParams,
    pub yolo: YoloParams,
}

impl UploadParams {
    /// Text fields sent next to the `file` part, in the order a browser client appends them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let h = &self.herdnet;
        let y = &self.yolo;
        vec![
            ("patch_size", h.patch_size.to_string()),
            ("overlap", h.overlap.to_string()),
            ("rotation", h.rotation.to_string()),
            ("thumbnail_size", h.thumbnail_size.to_string()),
            ("include_thumbnails", h.include_thumbnails.to_string()),
            (DetectionModel::HerdNet.forced_flag(), "true".to_string()),
            ("conf_threshold", y.conf_threshold.to_string()),
            ("iou_threshold", y.iou_threshold.to_string()),
            ("img_size", y.img_size.to_string()),
            (DetectionModel::Yolo.forced_flag(), "true".to_string()),
        ]
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Percentage of the request body sent so far.
pub fn upload_progress(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (loaded as f64 * 100.0 / total as f64).round();
    percent.min(100.0) as u8
}
