/// Story image intake.
///
/// Validates an uploaded file, fits it into the 9:16 story frame and
/// returns it as a data URI ready for `StoryStore::create`.

pub mod encode;
pub mod upload;

pub use encode::{
    data_uri, fit_story_frame, EncodeConfig, ImageEncoder, JpegEncoder, PngEncoder,
};
pub use upload::{prepare_upload, validate, UploadError, UploadFile, MAX_UPLOAD_BYTES};
