//! # Upload Store
//! haulboard/crates/hb-api/src/upload.rs
//!
//! Local filesystem storage for submitted photos. Filenames are re-derived
//! to epoch millis plus a random suffix, so nothing client-controlled ever
//! reaches the filesystem path.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;

use hb_core::error::{AppError, Result};
use hb_core::models::AttachmentRef;
use hb_core::validate::sanitize;

/// Hard limits applied by the intake endpoint while buffering parts.
pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];
const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

#[derive(Clone)]
pub struct LocalUploadStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root: PathBuf,
    /// Public URL prefix (e.g., "/data/uploads")
    url_prefix: String,
}

impl LocalUploadStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self { root, url_prefix }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// MIME and extension must both be on the image allow-list.
    pub fn is_allowed(mimetype: &str, original_name: &str) -> bool {
        ALLOWED_MIME_TYPES.contains(&mimetype)
            && ALLOWED_EXTENSIONS.contains(&extension_of(original_name).as_str())
    }

    /// Writes the buffered bytes under a server-derived filename and returns
    /// the attachment metadata that gets embedded in the contact record.
    pub async fn save_image(
        &self,
        data: Vec<u8>,
        original_name: &str,
        mimetype: &str,
    ) -> Result<AttachmentRef> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create upload dir: {e}")))?;

        let filename = format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>(),
            extension_of(original_name)
        );
        let target = self.root.join(&filename);
        fs::write(&target, &data)
            .await
            .map_err(|e| AppError::Internal(format!("failed to write {}: {e}", target.display())))?;

        Ok(AttachmentRef {
            path: format!("{}/{}", self.url_prefix, filename),
            filename,
            original_name: sanitize(base_name(original_name)),
            size: data.len() as u64,
            mimetype: mimetype.to_string(),
        })
    }
}

/// Base name only, to block traversal via the client-supplied name.
fn base_name(original_name: &str) -> &str {
    Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
}

/// Lowercased extension including the dot, or empty.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        assert!(LocalUploadStore::is_allowed("image/png", "couch.png"));
        assert!(LocalUploadStore::is_allowed("image/jpeg", "COUCH.JPG"));
        assert!(!LocalUploadStore::is_allowed("image/png", "couch.exe"));
        assert!(!LocalUploadStore::is_allowed("application/pdf", "couch.pdf"));
        assert!(!LocalUploadStore::is_allowed("image/svg+xml", "couch.svg"));
    }

    #[tokio::test]
    async fn test_save_image_rederives_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path().join("uploads"), "/data/uploads".to_string());

        let attachment = store
            .save_image(vec![1, 2, 3], "../../etc/passwd.png", "image/png")
            .await
            .unwrap();

        // Traversal components never reach the stored name or path.
        assert!(!attachment.filename.contains(".."));
        assert!(attachment.filename.ends_with(".png"));
        assert_eq!(attachment.original_name, "passwd.png");
        assert_eq!(attachment.size, 3);
        assert_eq!(attachment.path, format!("/data/uploads/{}", attachment.filename));
        assert!(dir.path().join("uploads").join(&attachment.filename).exists());
    }
}
