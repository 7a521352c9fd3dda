//! Local storage for report images.
//!
//! Files land in the configured upload directory as
//! `<uuid-hex>_<sanitized-name>` and are served back under
//! [`UPLOADS_URL_PREFIX`].

use std::path::{Path, PathBuf};

use crowdalert_core::validation::image_extension;

use crate::error::{AppError, AppResult};

/// URL path under which stored images are served.
pub const UPLOADS_URL_PREFIX: &str = "/api/uploads";

/// Longest sanitized file-name stem kept in a stored name.
const MAX_STEM_CHARS: usize = 64;

/// Image formats accepted by content sniffing.
const SNIFFED_FORMATS: &[image::ImageFormat] = &[
    image::ImageFormat::Png,
    image::ImageFormat::Jpeg,
    image::ImageFormat::Gif,
    image::ImageFormat::WebP,
];

/// A file written by [`UploadStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub file_name: String,
    /// Public URL recorded on the report.
    pub url: String,
}

#[derive(Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and write one image.
    ///
    /// The extension must be a supported image type and the bytes must
    /// sniff as one of the supported formats.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> AppResult<StoredImage> {
        image_extension(original_name)?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded image is empty".into()));
        }
        match image::guess_format(bytes) {
            Ok(format) if SNIFFED_FORMATS.contains(&format) => {}
            _ => {
                return Err(AppError::BadRequest(
                    "Uploaded file is not a supported image".into(),
                ))
            }
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let file_name = format!(
            "{}_{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_file_name(original_name)
        );
        tokio::fs::write(self.dir.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tracing::debug!(file_name = %file_name, size = bytes.len(), "Stored report image");
        Ok(StoredImage {
            url: format!("{UPLOADS_URL_PREFIX}/{file_name}"),
            file_name,
        })
    }

    /// Best-effort removal of a stored image.
    pub async fn remove(&self, file_name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await {
            tracing::warn!(file_name, error = %e, "Failed to remove stored image");
        }
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, dropping any
/// directory components.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext.to_ascii_lowercase())),
        None => (base, None),
    };

    let mut clean: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let trimmed = clean.trim_matches('_');
    clean = if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    };

    match ext {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!("{clean}.{ext}"),
        _ => clean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd.png"), "passwd.png");
        assert_eq!(sanitize_file_name("C:\\photos\\my fire!.JPG"), "my_fire.jpg");
        assert_eq!(sanitize_file_name("???.webp"), "image.webp");
        assert_eq!(sanitize_file_name("noext"), "noext");
    }

    #[tokio::test]
    async fn save_writes_under_unique_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let first = store.save("fire.png", PNG_HEADER).await.unwrap();
        let second = store.save("fire.png", PNG_HEADER).await.unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert!(first.file_name.ends_with("_fire.png"));
        assert_eq!(first.url, format!("/api/uploads/{}", first.file_name));
        let written = std::fs::read(dir.path().join(&first.file_name)).unwrap();
        assert_eq!(written, PNG_HEADER);
    }

    #[tokio::test]
    async fn save_rejects_wrong_extension_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        assert!(matches!(
            store.save("notes.txt", PNG_HEADER).await,
            Err(AppError::Core(_))
        ));
        assert!(matches!(
            store.save("fake.png", b"not an image at all").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            store.save("empty.png", b"").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let saved = store.save("a.png", PNG_HEADER).await.unwrap();

        store.remove(&saved.file_name).await;
        assert!(!dir.path().join(&saved.file_name).exists());
    }
}
