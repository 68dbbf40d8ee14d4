//! Relay response normalization.
//!
//! The relay may answer with `{ "images": [..] }`, `{ "images": ".." }` or
//! `{ "image": ".." }`. [`normalize_images`] folds all of these into a list of
//! displayable `data:` URLs.

use crate::mime::sniff_base64_mime;
use serde_json::Value;

/// Turn a relay response body into data URLs, in response order.
///
/// Precedence: a non-empty `images` array, then a singular `images` value,
/// then a singular `image` value. Null, non-string and blank entries are
/// dropped.
pub fn normalize_images(data: &Value) -> Vec<String> {
    let candidates: Vec<&Value> = match (data.get("images"), data.get("image")) {
        (Some(Value::Array(items)), _) if !items.is_empty() => items.iter().collect(),
        (Some(single), _) if !single.is_array() && !single.is_null() => vec![single],
        (_, Some(single)) => vec![single],
        _ => Vec::new(),
    };

    candidates
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(to_data_url)
        .collect()
}

/// Ensure `entry` is a well-formed `data:image/...;base64,` URL.
pub fn to_data_url(entry: &str) -> Option<String> {
    if is_image_data_url(entry) {
        return Some(entry.to_string());
    }

    // Strip a malformed `data:...,` prefix and keep only the payload.
    let payload = match entry.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, p)| p).unwrap_or(rest),
        None => entry,
    };

    if payload.is_empty() {
        return None;
    }

    Some(format!(
        "data:{};base64,{}",
        sniff_base64_mime(payload),
        payload
    ))
}

fn is_image_data_url(entry: &str) -> bool {
    let Some(rest) = entry.strip_prefix("data:image/") else {
        return false;
    };
    let Some((subtype, payload)) = rest.split_once(";base64,") else {
        return false;
    };

    !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !payload.is_empty()
}
