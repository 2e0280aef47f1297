use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::jpeg::JpegEncoder as JpegWriter;
use image::imageops::FilterType;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::upload::UploadError;

/// Target frame for story images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Width / height of the story frame.
    pub aspect_ratio: f64,
    /// Lossy quality hint in `[0, 1]`. Lossless encoders ignore it.
    pub quality: f32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        EncodeConfig {
            max_width: 1080,
            max_height: 1920,
            aspect_ratio: 9.0 / 16.0,
            quality: 0.8,
        }
    }
}

/// Output dimensions for a `width` x `height` source.
///
/// Images within both bounds keep their size. Anything larger is mapped
/// onto the story frame: width-bound when the source is wider than the
/// frame's aspect ratio, height-bound otherwise.
pub fn fit_story_frame(width: u32, height: u32, config: &EncodeConfig) -> (u32, u32) {
    if width <= config.max_width && height <= config.max_height {
        return (width, height);
    }

    let source_ratio = width as f64 / height.max(1) as f64;
    let (w, h) = if source_ratio > config.aspect_ratio {
        let w = config.max_width as f64;
        (w, w / config.aspect_ratio)
    } else {
        let h = config.max_height as f64;
        (h * config.aspect_ratio, h)
    };
    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Turns raw image bytes into a data URI sized for the story frame.
pub trait ImageEncoder {
    fn encode(&self, bytes: &[u8], config: &EncodeConfig) -> Result<String, UploadError>;
}

/// PNG in, PNG data URI out, resampled with tiny-skia.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn encode(&self, bytes: &[u8], config: &EncodeConfig) -> Result<String, UploadError> {
        let source = Pixmap::decode_png(bytes).map_err(|e| UploadError::Decode(e.to_string()))?;
        let (width, height) = fit_story_frame(source.width(), source.height(), config);

        let encoded = if (width, height) == (source.width(), source.height()) {
            source.encode_png()
        } else {
            let mut target = Pixmap::new(width, height).ok_or_else(|| {
                UploadError::Encode(format!("cannot allocate {}x{} canvas", width, height))
            })?;
            let scale_x = width as f32 / source.width() as f32;
            let scale_y = height as f32 / source.height() as f32;
            let paint = PixmapPaint {
                quality: FilterQuality::Bicubic,
                ..PixmapPaint::default()
            };
            target.draw_pixmap(
                0,
                0,
                source.as_ref(),
                &paint,
                Transform::from_scale(scale_x, scale_y),
                None,
            );
            target.encode_png()
        }
        .map_err(|e| UploadError::Encode(e.to_string()))?;

        Ok(data_uri("image/png", &encoded))
    }
}

/// Any format the `image` crate can decode in, JPEG data URI out at
/// `config.quality`. Alpha is discarded.
pub struct JpegEncoder;

impl JpegEncoder {
    fn quality(config: &EncodeConfig) -> u8 {
        (config.quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
    }
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, bytes: &[u8], config: &EncodeConfig) -> Result<String, UploadError> {
        let source =
            image::load_from_memory(bytes).map_err(|e| UploadError::Decode(e.to_string()))?;
        let (width, height) = fit_story_frame(source.width(), source.height(), config);

        let frame = if (width, height) == (source.width(), source.height()) {
            source
        } else {
            source.resize_exact(width, height, FilterType::CatmullRom)
        };

        let mut encoded = Vec::new();
        JpegWriter::new_with_quality(&mut encoded, Self::quality(config))
            .encode_image(&frame.to_rgb8())
            .map_err(|e| UploadError::Encode(e.to_string()))?;

        Ok(data_uri("image/jpeg", &encoded))
    }
}

/// `data:{mime};base64,{payload}`
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
