use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use uuid::Uuid;

/// Images above this size get downscaled before upload.
pub const COMPRESSION_THRESHOLD: usize = 1024 * 1024;

/// Longest side of a downscaled image.
pub const MAX_DIMENSION: u32 = 1920;

const JPEG_QUALITY: u8 = 80;

/// Bytes ready for the bucket, possibly re-encoded.
#[derive(Debug)]
pub struct Prepared {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Downscales large images to at most [`MAX_DIMENSION`] on the longest
/// side and re-encodes them as JPEG. Non-images, small images, undecodable
/// bytes and re-encodes that do not shrink all pass through unchanged.
pub fn prepare(bytes: Vec<u8>, mime_type: &str) -> Prepared {
    let original = |bytes: Vec<u8>| Prepared {
        bytes,
        mime_type: mime_type.to_string(),
    };

    if !mime_type.starts_with("image/") || bytes.len() < COMPRESSION_THRESHOLD
    {
        return original(bytes);
    }

    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("failed to decode image for compression: {e}");
            return original(bytes);
        }
    };

    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION
    {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut encoded = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY);
    if let Err(e) = img.write_with_encoder(encoder) {
        tracing::warn!("failed to re-encode image: {e}");
        return original(bytes);
    }

    let encoded = encoded.into_inner();
    if encoded.len() < bytes.len() {
        Prepared {
            bytes: encoded,
            mime_type: "image/jpeg".to_string(),
        }
    } else {
        original(bytes)
    }
}

/// Random bucket path keeping the original extension.
pub fn object_path(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            format!("{}.{ext}", Uuid::new_v4())
        }
        _ => Uuid::new_v4().to_string(),
    }
}

/// Human-readable size shown next to an attachment, e.g. `256KB`.
pub fn human_size(bytes: usize) -> String {
    format!("{}KB", (bytes as f64 / 1024.0).round() as u64)
}
