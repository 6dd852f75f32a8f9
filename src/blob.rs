//! Staged payload lifecycle for intercepted downloads.
//!
//! A [`Blob`] is the local, revocable reference to a fetched binary body:
//! the payload lives in a uniquely named staging file until it is either
//! published into the save directory under its suggested filename, or
//! released and discarded. The lifecycle is a strict one-way state machine:
//!
//! ```text
//! Staged -> Published -> Released      (success)
//! Staged -> Released                   (failure: staged data discarded)
//! ```
//!
//! Release must never precede publish on the success path; the interceptor
//! defers it to a later scheduler turn so the publish rename has fully
//! settled first. A blob dropped while still staged cleans up its staging
//! file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::savename::resolve_unique_path;

/// Process-wide sequence for unique staging names. Two activations staging
/// the same key concurrently must never collide on the staging path.
static STAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Errors from blob publication.
#[derive(Debug, Error)]
pub enum BlobError {
    /// File system error while publishing the staged payload.
    #[error("IO error publishing blob to {path}: {source}")]
    Io {
        /// The destination path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle state of a staged payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobState {
    /// Payload lives in the staging file.
    Staged,
    /// Payload has been renamed into the save directory.
    Published,
    /// Staging resource has been released.
    Released,
}

/// A published download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Final path in the save directory.
    pub path: PathBuf,
    /// Payload size in bytes.
    pub bytes: u64,
}

/// A staged binary payload owned by a single activation.
#[derive(Debug)]
pub struct Blob {
    staging: PathBuf,
    state: BlobState,
}

impl Blob {
    /// Stages a new blob under `staging_dir`, keyed by the suggested
    /// filename. The staging path is unique per call.
    #[must_use]
    pub fn stage(staging_dir: &Path, key: &str) -> Self {
        let seq = STAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = staging_dir.join(format!("{key}.{seq}.part"));
        debug!(path = %staging.display(), "staged blob");
        Self {
            staging,
            state: BlobState::Staged,
        }
    }

    /// Returns the staging file path the payload should be written to.
    #[must_use]
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BlobState {
        self.state
    }

    /// Publishes the staged payload into `save_dir` under `name`.
    ///
    /// The payload is materialized with a single atomic rename; a taken
    /// name gets a numeric suffix. After this returns, the download is
    /// visible to the user and the blob only awaits release.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Io`] if the rename fails. The blob stays
    /// staged in that case and its staging file is cleaned up on release
    /// or drop.
    pub async fn publish(
        &mut self,
        save_dir: &Path,
        name: &str,
        bytes: u64,
    ) -> Result<SavedFile, BlobError> {
        let final_path = resolve_unique_path(save_dir, name);
        tokio::fs::rename(&self.staging, &final_path)
            .await
            .map_err(|e| BlobError::Io {
                path: final_path.clone(),
                source: e,
            })?;
        self.state = BlobState::Published;
        debug!(path = %final_path.display(), bytes, "published blob");
        Ok(SavedFile {
            path: final_path,
            bytes,
        })
    }

    /// Releases the staging resource.
    ///
    /// For a published blob the staging file is already gone and this only
    /// finishes the lifecycle. For a blob still staged (the failure path)
    /// the staged data is discarded.
    pub async fn release(&mut self) {
        if self.state != BlobState::Published {
            if let Err(e) = tokio::fs::remove_file(&self.staging).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.staging.display(), error = %e, "failed to discard staged blob");
                }
            }
        }
        self.state = BlobState::Released;
        debug!(path = %self.staging.display(), "released blob");
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        // An activation that errors out drops its blob without reaching
        // release; the staged data must not outlive the activation.
        if self.state == BlobState::Staged {
            let _ = std::fs::remove_file(&self.staging);
        }
    }
}
