//! Saving displayed images to disk.

use crate::models::ImageRecord;
use crate::{Error, Result};
use base64::Engine as _;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_EXTENSION: &str = "jpg";

/// File extension for a data URL, taken from its declared media type.
///
/// `image/jpeg` maps to `jpg`; anything undetermined falls back to `jpg`.
pub fn extension_for(data_url: &str) -> String {
    declared_subtype(data_url)
        .map(|subtype| match subtype.as_str() {
            "jpeg" => DEFAULT_EXTENSION.to_string(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// `generated-<position>.<ext>`, with a 1-based position.
pub fn download_file_name(index: usize, data_url: &str) -> String {
    format!("generated-{}.{}", index + 1, extension_for(data_url))
}

/// Decode the record's payload and write it into `dir`.
pub fn save_image(record: &ImageRecord, index: usize, dir: &Path) -> Result<PathBuf> {
    let (_, payload) = record
        .data_url
        .split_once(";base64,")
        .ok_or_else(|| Error::Generic("Image is not a base64 data URL".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;

    fs::create_dir_all(dir)?;
    let path = dir.join(download_file_name(index, &record.data_url));
    fs::write(&path, &bytes)?;

    tracing::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

fn declared_subtype(data_url: &str) -> Option<String> {
    // The header is short; no need to lowercase the whole payload.
    let head: String = data_url
        .chars()
        .take(64)
        .collect::<String>()
        .to_ascii_lowercase();
    let rest = head.strip_prefix("data:image/")?;
    let (subtype, _) = rest.split_once(";base64,")?;

    if subtype.is_empty() {
        return None;
    }
    Some(subtype.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("data:image/png;base64,AAAA"), "png");
        assert_eq!(extension_for("data:image/jpeg;base64,AAAA"), "jpg");
        assert_eq!(extension_for("data:image/webp;base64,AAAA"), "webp");
        assert_eq!(extension_for("DATA:IMAGE/PNG;BASE64,AAAA"), "png");
    }

    #[test]
    fn test_extension_for_undetermined_defaults_to_jpg() {
        assert_eq!(extension_for("AAAA"), "jpg");
        assert_eq!(extension_for("data:text/plain;base64,AAAA"), "jpg");
        assert_eq!(extension_for("data:image/;base64,AAAA"), "jpg");
        assert_eq!(extension_for("data:image/png,AAAA"), "jpg");
        assert_eq!(extension_for(""), "jpg");
    }

    #[test]
    fn test_download_file_name_is_one_based() {
        assert_eq!(
            download_file_name(0, "data:image/png;base64,AAAA"),
            "generated-1.png"
        );
        assert_eq!(
            download_file_name(4, "data:image/jpeg;base64,AAAA"),
            "generated-5.jpg"
        );
    }

    #[test]
    fn test_save_image_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("downloads");
        let record = ImageRecord::new("data:image/jpeg;base64,QUJD".to_string());

        let path = save_image(&record, 2, &out).unwrap();

        assert_eq!(path, out.join("generated-3.jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"ABC");
    }

    #[test]
    fn test_save_image_rejects_invalid_payload() {
        let dir = tempfile::tempdir().unwrap();
        let record = ImageRecord::new("data:image/png;base64,!!!".to_string());

        let err = save_image(&record, 0, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
    }

    #[test]
    fn test_save_image_rejects_non_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let record = ImageRecord::new("https://example.com/cat.png".to_string());

        let err = save_image(&record, 0, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Generic(_)));
    }
}
