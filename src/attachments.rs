//! Screenshot attachments.
//!
//! Images are embedded into entries as `data:` URIs so a journal document or
//! CSV export is self-contained.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::debug;

/// Image types that can be embedded, by file extension
fn mime_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Encodes raw image bytes as a data URI
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Turns a `--screenshot` argument into the value stored on the entry.
///
/// An existing image file is read and embedded; anything else is kept as a
/// short textual reference.
pub async fn screenshot_from_arg(value: &str) -> std::io::Result<String> {
    let path = Path::new(value);
    match mime_for(path) {
        Some(mime) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
            let bytes = tokio::fs::read(path).await?;
            debug!(path = %path.display(), bytes = bytes.len(), "Embedding screenshot");
            Ok(encode_data_uri(mime, &bytes))
        }
        _ => Ok(value.to_string()),
    }
}

/// Short label for tables: the mime type of an embedded image, or the reference itself
pub fn describe(screenshot: &str) -> String {
    match screenshot.strip_prefix("data:") {
        Some(rest) => {
            let mime = rest.split(';').next().unwrap_or("image");
            format!("[{}]", mime)
        }
        None => screenshot.to_string(),
    }
}
