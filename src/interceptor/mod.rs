//! Per-activation orchestration: turn link activations into downloads.
//!
//! The interceptor owns the full pipeline for one activation: derive the
//! filename from the href, fetch the resource from the configured endpoint,
//! stage the body as a [`Blob`], publish it into the save directory, and
//! release the staging resource on a later scheduler turn. Navigation is
//! always suppressed: an activation resolves to an interception outcome,
//! never to following the link.
//!
//! # Concurrency Model
//!
//! - Each activation runs in its own Tokio task
//! - A semaphore permit caps concurrent activations in batch mode
//! - Permits are released automatically when activations complete (RAII)
//! - Activations are independent and unordered relative to each other
//! - Activations deriving the same filename are serialized by a keyed
//!   in-flight guard; different filenames never contend
//!
//! # Example
//!
//! ```no_run
//! use linksave_core::config::Config;
//! use linksave_core::fetch::FetchClient;
//! use linksave_core::interceptor::Interceptor;
//! use linksave_core::page::scan_document;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     origin: "http://localhost:8082".to_string(),
//!     ..Config::default()
//! };
//! let interceptor = Interceptor::new(&config, FetchClient::new())?;
//! let scan = scan_document(r#"<a href="/files/q1.pdf">Q1</a>"#);
//! let stats = interceptor.intercept_all(&scan.anchors).await?;
//! println!("completed: {}, failed: {}", stats.completed(), stats.failed());
//! # Ok(())
//! # }
//! ```

mod inflight;

pub use inflight::InflightGuard;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::blob::{Blob, BlobError, SavedFile};
use crate::config::Config;
use crate::fetch::{FetchClient, FetchError};
use crate::page::{Anchor, is_interceptable};
use crate::savename::{self, NameError};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Error type for interceptor construction and batch runs.
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Failed to prepare the save or staging directory.
    #[error("failed to prepare directory {path}: {source}")]
    Io {
        /// The directory that could not be prepared.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Error type for a single activation.
#[derive(Debug, thiserror::Error)]
pub enum ClickError {
    /// Filename derivation failed (empty or unusable segment).
    #[error(transparent)]
    Name(#[from] NameError),

    /// The fetch failed (network, status, timeout, staging IO).
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Publishing the staged payload failed.
    #[error(transparent)]
    Blob(#[from] BlobError),
}

/// Outcome of a delegated activation.
#[derive(Debug)]
pub enum Activation {
    /// The href was a download link; navigation was suppressed and the
    /// resource was published.
    Intercepted(SavedFile),
    /// The href is not interceptable; the host environment keeps its
    /// default behavior.
    PassThrough {
        /// The href that passed through untouched.
        href: String,
    },
}

/// Statistics from a batch interception run.
///
/// Uses atomic counters for thread-safe updates from concurrent
/// activation tasks.
#[derive(Debug, Default)]
pub struct ClickStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl ClickStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successfully published activations.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of failed activations.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of activations processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Inner {
    client: FetchClient,
    origin: String,
    prefix: String,
    save_dir: PathBuf,
    staging_dir: PathBuf,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    inflight: InflightGuard,
}

/// Converts navigation activations into forced downloads.
///
/// Cloning is cheap; clones share the client, directories, semaphore and
/// in-flight guard.
#[derive(Debug, Clone)]
pub struct Interceptor {
    inner: Arc<Inner>,
}

impl Interceptor {
    /// Creates a new interceptor from a configuration and a fetch client.
    ///
    /// Ensures the save and staging directories exist.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptorError::InvalidConcurrency`] if the configured
    /// concurrency is outside 1-100, or [`InterceptorError::Io`] if a
    /// directory cannot be created.
    #[instrument(level = "debug", skip(config, client))]
    pub fn new(config: &Config, client: FetchClient) -> Result<Self, InterceptorError> {
        let concurrency = config.concurrency;
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(InterceptorError::InvalidConcurrency { value: concurrency });
        }

        let save_dir = config.save_dir.clone();
        let staging_dir = config.effective_staging_dir();
        for dir in [&save_dir, &staging_dir] {
            std::fs::create_dir_all(dir).map_err(|e| InterceptorError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }

        debug!(
            origin = %config.origin,
            prefix = %config.endpoint_prefix,
            save_dir = %save_dir.display(),
            concurrency,
            "creating interceptor"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                origin: config.origin.clone(),
                prefix: config.endpoint_prefix.clone(),
                save_dir,
                staging_dir,
                semaphore: Arc::new(Semaphore::new(concurrency)),
                concurrency,
                inflight: InflightGuard::new(),
            }),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    /// Builds the request target for a raw href segment: the configured
    /// origin, the endpoint prefix, and the segment, concatenated.
    #[must_use]
    pub fn request_target(&self, segment: &str) -> String {
        format!("{}{}{}", self.inner.origin, self.inner.prefix, segment)
    }

    /// Delegated capability check: is this href a download link this
    /// interceptor would take over?
    ///
    /// Applies to any href at activation time, independent of the scanned
    /// anchor set.
    #[must_use]
    pub fn matches(&self, href: &str) -> bool {
        is_interceptable(href)
    }

    /// Runs one activation through the full pipeline.
    ///
    /// Navigation is suppressed by construction: this either publishes a
    /// download or returns an error; the link target itself is never
    /// followed. The request goes to `{origin}{prefix}{segment}` where
    /// `segment` is the href's last `/`-separated segment, verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ClickError`] when filename derivation, the fetch, or the
    /// publish fails. A failed activation leaves no staged or published
    /// file behind.
    #[instrument(skip(self), fields(href = %href))]
    pub async fn click(&self, href: &str) -> Result<SavedFile, ClickError> {
        let segment = savename::last_segment(href)?;
        let save_name = savename::sanitize_save_name(segment)?;

        // Same-name activations run one at a time; see inflight module.
        let _guard = self.inner.inflight.acquire(&save_name).await;

        let target = self.request_target(segment);
        debug!(target = %target, save_name = %save_name, "intercepting activation");

        let mut blob = Blob::stage(&self.inner.staging_dir, &save_name);
        let bytes = self
            .inner
            .client
            .fetch_binary_to(&target, blob.staging_path())
            .await?;
        // A fetch error drops the blob here, discarding the staged data.

        let saved = blob.publish(&self.inner.save_dir, &save_name, bytes).await?;

        // Release strictly after publish, on a later scheduler turn, so the
        // rename has fully settled before the staging reference goes away.
        tokio::task::yield_now().await;
        blob.release().await;

        info!(path = %saved.path.display(), bytes, "activation published");
        Ok(saved)
    }

    /// Delegated entry point for an arbitrary href.
    ///
    /// Download links are intercepted exactly like bound anchors; anything
    /// else passes through to the host environment's default behavior.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`click`](Self::click) for intercepted
    /// hrefs.
    pub async fn handle_activation(&self, href: &str) -> Result<Activation, ClickError> {
        if !self.matches(href) {
            debug!(href = %href, "href passes through");
            return Ok(Activation::PassThrough {
                href: href.to_string(),
            });
        }
        Ok(Activation::Intercepted(self.click(href).await?))
    }

    /// Intercepts every bound anchor concurrently.
    ///
    /// Each anchor's activation runs in its own task; the semaphore caps
    /// how many run at once. Individual activation failures do NOT fail
    /// the batch; they are logged and counted in the stats.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptorError::SemaphoreClosed`] if the semaphore is
    /// closed while dispatching.
    #[instrument(skip(self, anchors), fields(anchor_count = anchors.len()))]
    pub async fn intercept_all(&self, anchors: &[Anchor]) -> Result<ClickStats, InterceptorError> {
        let stats = Arc::new(ClickStats::new());
        let mut handles = Vec::new();

        info!("starting batch interception");

        for anchor in anchors {
            let permit = self
                .inner
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| InterceptorError::SemaphoreClosed)?;

            let interceptor = self.clone();
            let stats = Arc::clone(&stats);
            let href = anchor.href.clone();

            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;

                match interceptor.click(&href).await {
                    Ok(saved) => {
                        info!(href = %href, path = %saved.path.display(), "activation completed");
                        stats.increment_completed();
                    }
                    Err(e) => {
                        warn!(href = %href, error = %e, "activation failed");
                        stats.increment_failed();
                    }
                }
            }));
        }

        for handle in handles {
            // Task panics are logged but don't fail the batch
            if let Err(e) = handle.await {
                warn!(error = %e, "activation task panicked");
            }
        }

        let completed = stats.completed();
        let failed = stats.failed();
        info!(
            completed,
            failed,
            total = completed + failed,
            "batch interception complete"
        );

        match Arc::try_unwrap(stats) {
            Ok(stats) => Ok(stats),
            Err(arc_stats) => {
                // All tasks are joined, so this shouldn't happen; rebuild
                // from the atomic values to stay graceful.
                let new_stats = ClickStats::new();
                new_stats
                    .completed
                    .store(arc_stats.completed(), Ordering::SeqCst);
                new_stats.failed.store(arc_stats.failed(), Ordering::SeqCst);
                Ok(new_stats)
            }
        }
    }
}
