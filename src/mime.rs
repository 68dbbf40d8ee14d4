//! Image media type detection from magic bytes.

use base64::Engine as _;

pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}

/// Sniff the media type of a base64 payload from its first few bytes.
///
/// Only a 16-character prefix is decoded, which is enough for every signature
/// above. Undecodable or unrecognized payloads fall back to `image/jpeg`.
pub fn sniff_base64_mime(payload: &str) -> &'static str {
    let head = &payload.as_bytes()[..payload.len().min(16)];
    let usable = head.len() - head.len() % 4;

    match base64::engine::general_purpose::STANDARD.decode(&head[..usable]) {
        Ok(bytes) => detect_image_mime(&bytes).unwrap_or_else(|| {
            tracing::debug!(
                "Unrecognized image format (first bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                FALLBACK_IMAGE_MIME
            );
            FALLBACK_IMAGE_MIME
        }),
        Err(_) => FALLBACK_IMAGE_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some("image/png")
        );
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(
            detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
    }

    #[test]
    fn test_unknown_is_none() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_sniff_png_payload() {
        // base64 of the PNG signature
        assert_eq!(sniff_base64_mime("iVBORw0KGgoAAAANSUhEUg=="), "image/png");
    }

    #[test]
    fn test_sniff_jpeg_payload() {
        assert_eq!(sniff_base64_mime("/9j/4AAQSkZJRgABAQ"), "image/jpeg");
    }

    #[test]
    fn test_sniff_short_or_invalid_payload_falls_back() {
        assert_eq!(sniff_base64_mime("abc"), FALLBACK_IMAGE_MIME);
        assert_eq!(sniff_base64_mime("QUJD"), FALLBACK_IMAGE_MIME);
        assert_eq!(sniff_base64_mime("!!!!not base64!!"), FALLBACK_IMAGE_MIME);
        assert_eq!(sniff_base64_mime(""), FALLBACK_IMAGE_MIME);
    }
}
