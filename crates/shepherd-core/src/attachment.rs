//! Local image files attached to church events.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::utils::format_bytes;

/// Largest image we will upload
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Not an image ({mime}): {}", .path.display())]
    NotAnImage { path: PathBuf, mime: String },

    #[error("Image is too large ({size} bytes, limit {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// An image read into memory, ready to be sent as a multipart file part.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Read and check an image file. A leading `~/` is expanded.
    pub async fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let path = expand_home(path);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AttachmentError::NotFound(path))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(AttachmentError::NotAFile(path));
        }

        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(AttachmentError::NotAnImage {
                path,
                mime: mime.to_string(),
            });
        }

        if metadata.len() > MAX_IMAGE_BYTES {
            return Err(AttachmentError::TooLarge {
                size: metadata.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        debug!(file = %file_name, mime = %mime, size = bytes.len(), "Image attached");
        Ok(Self {
            file_name,
            mime: mime.to_string(),
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// One-line summary shown in the form before upload
    pub fn preview(&self) -> String {
        format!("{} · {} · {}", self.file_name, self.mime, format_bytes(self.size()))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 0, 0, 0]).unwrap();

        let image = ImageAttachment::from_path(&path).await.unwrap();
        assert_eq!(image.file_name, "banner.png");
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.size(), 8);
        assert_eq!(image.preview(), "banner.png · image/png · 8 B");
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = ImageAttachment::from_path(&path).await.unwrap_err();
        assert!(matches!(err, AttachmentError::NotAnImage { ref mime, .. } if mime == "text/plain"));
    }

    #[tokio::test]
    async fn test_missing_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();

        let missing = ImageAttachment::from_path(&dir.path().join("gone.jpg")).await;
        assert!(matches!(missing, Err(AttachmentError::NotFound(_))));

        let not_file = ImageAttachment::from_path(dir.path()).await;
        assert!(matches!(not_file, Err(AttachmentError::NotAFile(_))));
    }

    #[tokio::test]
    async fn test_rejects_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_IMAGE_BYTES + 1).unwrap();

        let err = ImageAttachment::from_path(&path).await.unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { .. }));
    }
}
