//! Image payload helpers: format sniffing and `data:` URL handling.
//!
//! The AI gateway returns generated images as base64 `data:` URLs. Before
//! persisting one to object storage the bytes are decoded and the real
//! format is sniffed from the magic bytes, since the declared MIME type is
//! not reliable.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::error::CoreError;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }

    /// Sniff the format, defaulting to PNG when the header is unrecognised.
    pub fn sniff_or_png(bytes: &[u8]) -> Self {
        Self::sniff(bytes).unwrap_or(ImageKind::Png)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Webp => "webp",
        }
    }
}

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Whether `url` is an inline `data:` URL rather than a hosted one.
pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

/// Decode a base64 `data:` URL.
pub fn parse_data_url(url: &str) -> Result<DataUrl, CoreError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::Validation("Not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::Validation("Data URL has no payload".into()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| CoreError::Validation("Only base64 data URLs are supported".into()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CoreError::Validation(format!("Invalid base64 payload: {e}")))?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Encode bytes as a base64 `data:` URL.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(ImageKind::sniff(PNG_HEADER), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(JPEG_HEADER), Some(ImageKind::Jpeg));
    }

    #[test]
    fn unknown_header_defaults_to_png() {
        assert_eq!(ImageKind::sniff(b"hello world"), None);
        assert_eq!(ImageKind::sniff_or_png(b"hello world"), ImageKind::Png);
    }

    #[test]
    fn parses_data_url() {
        let url = to_data_url("image/jpeg", JPEG_HEADER);
        let parsed = parse_data_url(&url).unwrap();
        assert_eq!(parsed.mime_type, "image/jpeg");
        assert_eq!(ImageKind::sniff(&parsed.bytes), Some(ImageKind::Jpeg));
    }

    #[test]
    fn rejects_non_base64_data_url() {
        let err = parse_data_url("data:text/plain,hello").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("base64"));
    }

    #[test]
    fn rejects_hosted_url() {
        assert!(!is_data_url("https://cdn.example.com/a.png"));
        assert!(parse_data_url("https://cdn.example.com/a.png").is_err());
    }
}
