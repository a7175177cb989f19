//! Local filesystem attachment vault.
//!
//! Implements the `AttachmentVault` trait from colloquy-core with bytes
//! stored at `{base_dir}/attachments/{uuid}.{ext}`. The relative path is
//! the stable reference recorded on messages, so files survive restarts as
//! long as the data directory does.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use colloquy_core::vault::AttachmentVault;
use colloquy_types::error::StorageError;
use colloquy_types::message::{AttachmentKind, AttachmentRef};

const ATTACHMENTS_DIR: &str = "attachments";

/// Filesystem-backed attachment vault rooted at a data directory.
pub struct FsAttachmentVault {
    base_dir: PathBuf,
}

impl FsAttachmentVault {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn absolute(&self, reference: &AttachmentRef) -> Result<PathBuf, StorageError> {
        validate_ref_path(&reference.path)?;
        Ok(self.base_dir.join(&reference.path))
    }
}

/// A ref path must stay inside the data directory: relative, no parent
/// components.
fn validate_ref_path(path: &str) -> Result<(), StorageError> {
    let path = Path::new(path);
    if path.is_absolute() {
        return Err(StorageError::InvalidRef("absolute path".to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => {
                return Err(StorageError::InvalidRef(format!(
                    "path escapes the vault: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(())
}

/// Classify an attachment by its file extension.
fn kind_for_extension(extension: &str) -> AttachmentKind {
    match extension.to_lowercase().as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "heic" => AttachmentKind::Image,
        _ => AttachmentKind::File,
    }
}

impl AttachmentVault for FsAttachmentVault {
    async fn store(
        &self,
        bytes: &[u8],
        suggested_extension: &str,
    ) -> Result<AttachmentRef, StorageError> {
        let dir = self.base_dir.join(ATTACHMENTS_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let extension = suggested_extension.trim_start_matches('.').to_lowercase();
        let filename = if extension.is_empty() {
            Uuid::now_v7().to_string()
        } else {
            format!("{}.{extension}", Uuid::now_v7())
        };

        fs::write(dir.join(&filename), bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(AttachmentRef {
            path: format!("{ATTACHMENTS_DIR}/{filename}"),
            kind: kind_for_extension(&extension),
        })
    }

    async fn resolve(&self, reference: &AttachmentRef) -> Result<Vec<u8>, StorageError> {
        let path = self.absolute(reference)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn delete(&self, reference: &AttachmentRef) -> Result<(), StorageError> {
        let path = self.absolute(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone is fine for a best-effort cleanup.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> (FsAttachmentVault, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (FsAttachmentVault::new(dir.path().to_path_buf()), dir)
    }

    #[tokio::test]
    async fn test_store_and_resolve_roundtrip() {
        let (vault, _dir) = vault();

        let reference = vault.store(b"image bytes", "png").await.unwrap();
        assert!(reference.path.starts_with("attachments/"));
        assert!(reference.path.ends_with(".png"));
        assert_eq!(reference.kind, AttachmentKind::Image);

        let bytes = vault.resolve(&reference).await.unwrap();
        assert_eq!(bytes, b"image bytes");
    }

    #[tokio::test]
    async fn test_non_image_extension_is_file_kind() {
        let (vault, _dir) = vault();

        let reference = vault.store(b"notes", "txt").await.unwrap();
        assert_eq!(reference.kind, AttachmentKind::File);
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let (vault, _dir) = vault();

        let reference = AttachmentRef {
            path: "attachments/gone.png".into(),
            kind: AttachmentKind::Image,
        };
        let err = vault.resolve(&reference).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (vault, _dir) = vault();

        let reference = vault.store(b"bytes", "png").await.unwrap();
        vault.delete(&reference).await.unwrap();
        assert!(matches!(
            vault.resolve(&reference).await.unwrap_err(),
            StorageError::NotFound
        ));
        // Second delete of a missing file succeeds.
        vault.delete(&reference).await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_refs_rejected() {
        let (vault, _dir) = vault();

        for path in ["../etc/passwd", "/etc/passwd", "attachments/../../x"] {
            let reference = AttachmentRef {
                path: path.to_string(),
                kind: AttachmentKind::File,
            };
            assert!(
                matches!(
                    vault.resolve(&reference).await.unwrap_err(),
                    StorageError::InvalidRef(_)
                ),
                "{path} should be rejected"
            );
            assert!(matches!(
                vault.delete(&reference).await.unwrap_err(),
                StorageError::InvalidRef(_)
            ));
        }
    }
}
