//! Cover image embedding
//!
//! Covers are stored inline on the record as `data:` URLs so the catalog stays
//! a single self-contained JSON array.

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Largest image accepted for embedding
const MAX_COVER_BYTES: usize = 2 * 1024 * 1024;

/// Read an image file and encode it as a data URL
pub fn encode_cover(path: &Path) -> Result<String> {
    let mime = mime_for(path).with_context(|| {
        format!(
            "Unsupported cover image type: {:?} (use png, jpg, gif, webp or svg)",
            path
        )
    })?;

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read cover image: {:?}", path))?;

    if bytes.len() > MAX_COVER_BYTES {
        bail!(
            "Cover image is too large ({} KiB, limit {} KiB)",
            bytes.len() / 1024,
            MAX_COVER_BYTES / 1024
        );
    }

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Describe a cover for terminal display instead of dumping the data URL
pub fn describe_cover(cover: &str) -> String {
    match cover.strip_prefix("data:") {
        Some(rest) => {
            let mime = rest.split(';').next().unwrap_or("image");
            let encoded_len = rest.split_once(',').map(|(_, d)| d.len()).unwrap_or(0);
            format!("embedded {} (~{} KiB)", mime, encoded_len * 3 / 4 / 1024)
        }
        None => cover.to_string(),
    }
}
