use thiserror::Error;
use tracing::{debug, warn};

use crate::encode::{EncodeConfig, ImageEncoder};

/// 10 MB upload limit for story images
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Raw file as handed over by the picker or drop target.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Upload failures. `Display` strings are shown to the user as-is.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please select a valid image file")]
    UnsupportedFormat { mime: String },
    #[error("Image size must be less than 10MB")]
    Oversize { size: usize, limit: usize },
    #[error("Failed to load image")]
    Decode(String),
    #[error("Failed to process image")]
    Encode(String),
}

/// Check MIME category and size before any decoding happens.
pub fn validate(file: &UploadFile) -> Result<(), UploadError> {
    if !file.mime.starts_with("image/") {
        return Err(UploadError::UnsupportedFormat {
            mime: file.mime.clone(),
        });
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::Oversize {
            size: file.bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Validate and encode `file`, returning the story payload.
pub fn prepare_upload<E: ImageEncoder + ?Sized>(
    file: &UploadFile,
    encoder: &E,
    config: &EncodeConfig,
) -> Result<String, UploadError> {
    if let Err(e) = validate(file) {
        warn!("Rejected upload {}: {:?}", file.name, e);
        return Err(e);
    }

    let data_uri = encoder.encode(&file.bytes, config).inspect_err(|e| {
        warn!("Failed to encode upload {}: {:?}", file.name, e);
    })?;

    debug!(
        "Prepared upload {} ({} bytes in, {} bytes out)",
        file.name,
        file.bytes.len(),
        data_uri.len()
    );
    Ok(data_uri)
}
