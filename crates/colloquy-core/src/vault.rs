//! AttachmentVault trait definition.
//!
//! Binary attachment port. The vault hands out stable relative references;
//! bytes are resolved lazily (preview, re-encoding into a request) and are
//! never rewritten once stored.

use colloquy_types::error::StorageError;
use colloquy_types::message::AttachmentRef;

/// Durable storage for attachment bytes, addressed by relative references.
///
/// Implementations live in colloquy-infra (e.g. `FsAttachmentVault`).
pub trait AttachmentVault: Send + Sync {
    /// Write bytes under a freshly named file and return its reference.
    /// The reference contains only a relative path; the durable root may
    /// move between launches.
    fn store(
        &self,
        bytes: &[u8],
        suggested_extension: &str,
    ) -> impl std::future::Future<Output = Result<AttachmentRef, StorageError>> + Send;

    /// Read the bytes back. `StorageError::NotFound` when the file is gone.
    fn resolve(
        &self,
        reference: &AttachmentRef,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Best-effort removal; a missing file is not an error.
    fn delete(
        &self,
        reference: &AttachmentRef,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
