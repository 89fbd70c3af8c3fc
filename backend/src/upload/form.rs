use actix_multipart::{Field, Multipart};
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use shared::DetectionModel;
use std::collections::HashMap;

use crate::error::UploadError;

const FILE_FIELD: &str = "file";

/// Largest text value kept for a detection parameter.
pub const MAX_FIELD_BYTES: usize = 64 * 1024;

/// The `file` part of an upload. `size` counts every byte received, even
/// those past the buffering limit, which are dropped.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub size: u64,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    /// Detection parameters by name; the first occurrence of a name wins.
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Only the first `file` part and known detection parameters are kept.
    /// Every other part is read to its end and discarded.
    pub async fn read(mut payload: Multipart, max_file_bytes: u64) -> Result<Self, UploadError> {
        let mut form = UploadForm::default();

        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == FILE_FIELD && form.file.is_none() {
                form.file = Some(read_file(&mut field, max_file_bytes).await?);
                continue;
            }
            if !is_parameter(&name) || form.fields.contains_key(&name) {
                drain(&mut field).await?;
                continue;
            }

            match read_capped(&mut field, MAX_FIELD_BYTES).await? {
                Some(value) => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&value).into_owned());
                }
                None => log::warn!(
                    "Ignoring parameter {} longer than {} bytes",
                    name,
                    MAX_FIELD_BYTES
                ),
            }
        }

        Ok(form)
    }

    /// Non-empty text value of `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

fn is_parameter(name: &str) -> bool {
    [DetectionModel::HerdNet, DetectionModel::Yolo]
        .iter()
        .any(|model| model.parameter_names().contains(&name))
}

async fn read_file(field: &mut Field, max_file_bytes: u64) -> Result<UploadedFile, UploadError> {
    let name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or_default()
        .to_string();
    let content_type = field.content_type().map(|mime| mime.to_string());

    let mut data = BytesMut::new();
    let mut size: u64 = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        if size <= max_file_bytes {
            data.extend_from_slice(&chunk);
        } else if !data.is_empty() {
            data = BytesMut::new();
        }
    }

    Ok(UploadedFile {
        name,
        content_type,
        size,
        data: data.freeze(),
    })
}

/// Whole value of the part, or `None` once it grows past `limit`.
async fn read_capped(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>, UploadError> {
    let mut value = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if value.len() + chunk.len() > limit {
            drain(field).await?;
            return Ok(None);
        }
        value.extend_from_slice(&chunk);
    }
    Ok(Some(value))
}

async fn drain(field: &mut Field) -> Result<(), UploadError> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}
