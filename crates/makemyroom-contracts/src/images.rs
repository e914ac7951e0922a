use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// An encoded image carried end to end as media type plus base64 payload.
///
/// The payload is kept in its base64 form; it is only decoded when bytes are
/// actually needed (saving, compositing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub mime_type: String,
    pub data: String,
}

impl ImageRef {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64.encode(bytes))
    }

    /// Accepts either `data:<mime>;base64,<data>` or bare base64.
    ///
    /// Anything before the first comma is treated as the header. A header
    /// without a `data:<mime>;` segment, or no header at all, falls back to
    /// `image/jpeg`.
    pub fn from_data_uri(raw: &str) -> Self {
        let Some((header, data)) = raw.split_once(',') else {
            return Self::new(DEFAULT_MIME_TYPE, raw);
        };
        let mime_type = header
            .find("data:")
            .map(|start| &header[start + "data:".len()..])
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime.to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        Self::new(mime_type, data)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(BASE64.decode(self.data.trim().as_bytes())?)
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }

    /// Approximate decoded size, for logging.
    pub fn byte_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let lowered = mime_type.trim().to_ascii_lowercase();
    if lowered.contains("png") {
        return "png";
    }
    if lowered.contains("webp") {
        return "webp";
    }
    if lowered.contains("gif") {
        return "gif";
    }
    "jpg"
}

pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.trim().to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
