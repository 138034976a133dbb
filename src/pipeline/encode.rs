//! Image encoding: raster → PNG bytes, and PNG bytes → VLM `ImageData`.
//!
//! PNG is lossless, so "maximum quality" only selects the encoder's best
//! compression and adaptive filtering; the pixels are identical at any
//! setting. The encoder is deterministic: the same raster always produces
//! the same bytes.

use crate::error::ConversionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use tracing::debug;

/// Serialise a rendered page to PNG bytes.
///
/// An encoder error or an empty buffer is
/// [`ConversionError::EncodeFailure`].
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ConversionError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);

    img.write_with_encoder(encoder)
        .map_err(|e| ConversionError::EncodeFailure {
            detail: format!("{}", e),
        })?;

    if buf.is_empty() {
        return Err(ConversionError::EncodeFailure {
            detail: "encoder produced no bytes".into(),
        });
    }

    debug!(
        "Encoded {}x{} px → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap stored image bytes as a base64 attachment for the vision model.
///
/// `detail: "high"` lets GPT-4-class models tile the full-resolution preview
/// instead of a single 512 px overview, which is what makes small résumé
/// text legible to the reviewer.
pub fn encode_for_vision(bytes: &[u8], mime_type: &str) -> ImageData {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    ImageData::new(b64, mime_type).with_detail("high")
}

/// Guess an image MIME type from magic bytes. Returns `None` for anything a
/// vision model would not accept.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else {
        None
    }
}
