//! Attachment encoding for images and documents sent alongside a question
//!
//! A selected file is read once, base64-encoded for inline transport, and
//! paired with its declared media type. Read failures are reported as
//! `AttachmentError`; the session decides to degrade rather than block.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Fallback media type for unrecognised files
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Error type for attachment encoding
#[derive(Error, Debug)]
pub enum AttachmentError {
    /// The file could not be read
    #[error("Failed to read attachment {path}: {source}")]
    Read {
        /// Path that was selected
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file exceeds the configured size limit
    #[error("Attachment {path} is {size} bytes, limit is {limit} bytes")]
    TooLarge {
        /// Path that was selected
        path: String,
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
}

/// Broad kind of an attachment, used for display only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    /// Any `image/*` media type
    Image,
    /// Everything else
    Document,
}

/// An encoded file ready to be sent as inline data
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the user
    pub display_name: String,
    /// Declared media type, e.g. "image/png"
    pub media_type: String,
    /// Standard base64 of the file bytes, without any data-URL prefix
    pub encoded_bytes: String,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("display_name", &self.display_name)
            .field("media_type", &self.media_type)
            .field("encoded_len", &self.encoded_bytes.len())
            .finish()
    }
}

/// What the conversation log keeps about an attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    /// File name shown to the user
    pub display_name: String,
    /// Declared media type
    pub media_type: String,
    /// Image or document
    pub kind: AttachmentKind,
}

impl AttachmentDescriptor {
    /// Describe a selected file without reading it
    pub fn for_path(path: &Path) -> Self {
        let media_type = media_type_from_extension(path).to_string();
        Self {
            display_name: display_name(path),
            kind: kind_of(&media_type),
            media_type,
        }
    }
}

impl Attachment {
    /// Log-side descriptor for this attachment
    pub fn descriptor(&self) -> AttachmentDescriptor {
        AttachmentDescriptor {
            display_name: self.display_name.clone(),
            media_type: self.media_type.clone(),
            kind: kind_of(&self.media_type),
        }
    }

    /// Build an attachment from an already-encoded payload
    ///
    /// Accepts either bare base64 or a full data URL; the prefix is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::attachment::Attachment;
    ///
    /// let att = Attachment::from_encoded("a.png", "image/png", "data:image/png;base64,iVBORw0K");
    /// assert_eq!(att.encoded_bytes, "iVBORw0K");
    /// ```
    pub fn from_encoded(
        display_name: impl Into<String>,
        media_type: impl Into<String>,
        encoded: &str,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            media_type: media_type.into(),
            encoded_bytes: strip_data_url_prefix(encoded).to_string(),
        }
    }
}

/// Reads and encodes a file for inline transport
///
/// # Arguments
///
/// * `path` - The selected file
/// * `max_bytes` - Upper bound on the raw file size
///
/// # Errors
///
/// Returns `AttachmentError::Read` if the file cannot be read and
/// `AttachmentError::TooLarge` if it exceeds `max_bytes`
pub async fn encode_file(path: &Path, max_bytes: u64) -> Result<Attachment, AttachmentError> {
    let read_error = |source| AttachmentError::Read {
        path: path.display().to_string(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
    if metadata.len() > max_bytes {
        return Err(AttachmentError::TooLarge {
            path: path.display().to_string(),
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(read_error)?;
    let media_type = detect_media_type(path, &bytes);

    tracing::debug!(
        path = %path.display(),
        media_type = %media_type,
        size = bytes.len(),
        "Encoded attachment"
    );

    Ok(Attachment {
        display_name: display_name(path),
        media_type: media_type.to_string(),
        encoded_bytes: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

/// Removes a leading `data:<type>;base64,` prefix if present
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        if let Some((_, payload)) = encoded.split_once(',') {
            return payload;
        }
    }
    encoded
}

/// Media type from the file extension, refined by magic bytes
///
/// Sniffing only applies when the extension already names an image or is
/// missing or unknown, so a text file that happens to start with `BM` stays
/// text.
pub fn detect_media_type(path: &Path, bytes: &[u8]) -> &'static str {
    let declared = media_type_from_extension(path);
    if declared.starts_with("image/") || declared == DEFAULT_MEDIA_TYPE {
        sniff_image(bytes).unwrap_or(declared)
    } else {
        declared
    }
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if bytes.starts_with(b"\xff\xd8\xff") {
        Some("image/jpeg")
    } else if bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else if bytes.starts_with(b"II\x2a\x00") || bytes.starts_with(b"MM\x00\x2a") {
        Some("image/tiff")
    } else {
        None
    }
}

/// Media type declared by the file extension
pub fn media_type_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => DEFAULT_MEDIA_TYPE,
    }
}

fn kind_of(media_type: &str) -> AttachmentKind {
    if media_type.starts_with("image/") {
        AttachmentKind::Image
    } else {
        AttachmentKind::Document
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("data:broken"), "data:broken");
    }

    #[test]
    fn test_text_file_starting_with_bm_stays_text() {
        let bytes = b"BMI = m / h^2. Tinh BMI cua mot ban nang 45 kg.";
        assert_eq!(detect_media_type(Path::new("bai-tap.txt"), bytes), "text/plain");
    }

    #[test]
    fn test_sniff_refines_image_extension() {
        let bytes = b"\x89PNG\r\n\x1a\nrest";
        assert_eq!(detect_media_type(Path::new("photo.jpg"), bytes), "image/png");
    }

    #[test]
    fn test_sniff_without_extension() {
        assert_eq!(detect_media_type(Path::new("scan"), b"\xff\xd8\xff\xe0"), "image/jpeg");
        assert_eq!(detect_media_type(Path::new("scan.xyz"), b"GIF89a"), "image/gif");
    }

    #[test]
    fn test_sniff_minimal_webp_header() {
        let bytes = b"RIFF\x04\x00\x00\x00WEBP";
        assert_eq!(bytes.len(), 12);
        assert_eq!(detect_media_type(Path::new("upload"), bytes), "image/webp");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect_media_type(Path::new("bai-tap.PDF"), b"%PDF-1.7"), "application/pdf");
        assert_eq!(detect_media_type(Path::new("notes"), b"hello"), DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_descriptor_kind() {
        let image = AttachmentDescriptor::for_path(Path::new("/tmp/hinh.jpg"));
        assert_eq!(image.kind, AttachmentKind::Image);
        assert_eq!(image.display_name, "hinh.jpg");

        let doc = AttachmentDescriptor::for_path(Path::new("de-bai.docx"));
        assert_eq!(doc.kind, AttachmentKind::Document);
    }

    #[tokio::test]
    async fn test_encode_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("de.txt");
        std::fs::write(&path, "x + 5 = 3").unwrap();

        let att = encode_file(&path, 1024).await.unwrap();
        assert_eq!(att.display_name, "de.txt");
        assert_eq!(att.media_type, "text/plain");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&att.encoded_bytes)
            .unwrap();
        assert_eq!(decoded, b"x + 5 = 3");
    }

    #[tokio::test]
    async fn test_encode_text_file_starting_with_bm() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bai-tap.txt");
        std::fs::write(&path, "BMI = m / h^2. Tính BMI của bạn An nặng 45 kg, cao 1,5 m.").unwrap();

        let att = encode_file(&path, 1024).await.unwrap();
        assert_eq!(att.media_type, "text/plain");
        assert_eq!(att.descriptor().kind, AttachmentKind::Document);
    }

    #[tokio::test]
    async fn test_encode_missing_file_fails() {
        let err = encode_file(Path::new("/definitely/not/here.png"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::Read { .. }));
    }

    #[tokio::test]
    async fn test_encode_oversized_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let err = encode_file(&path, 16).await.unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { size: 64, limit: 16, .. }));
    }

    #[test]
    fn test_debug_hides_payload() {
        let att = Attachment::from_encoded("a.png", "image/png", "SECRETPAYLOAD");
        let debug = format!("{:?}", att);
        assert!(!debug.contains("SECRETPAYLOAD"));
    }
}
