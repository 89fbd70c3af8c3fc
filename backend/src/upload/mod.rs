mod form;
mod params;

pub use form::{UploadForm, UploadedFile};
pub use params::{describe_parameters, outbound_fields};

use crate::error::UploadError;

/// Presence, then type, then size; the first failure wins.
pub fn validate(file: Option<&UploadedFile>) -> Result<&UploadedFile, UploadError> {
    let file = file.ok_or(UploadError::MissingFile)?;
    shared::validate_archive(&file.name, file.content_type.as_deref(), file.size)?;
    Ok(file)
}
