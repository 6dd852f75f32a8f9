//! Linksave Core Library
//!
//! This library provides the core functionality for the linksave tool,
//! which intercepts the links of an HTML page and turns each activation
//! into a forced download: the linked resource is fetched as a binary
//! body, staged, and published into a save directory under a filename
//! derived from the link target, instead of following the navigation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`page`] - Anchor discovery from an HTML document snapshot
//! - [`savename`] - Filename derivation and the saved-name policy
//! - [`fetch`] - Binary HTTP client with streaming support
//! - [`blob`] - Staged payload lifecycle (stage, publish, release)
//! - [`interceptor`] - Per-activation orchestration and concurrency
//! - [`config`] - Runtime configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blob;
pub mod config;
pub mod fetch;
pub mod interceptor;
pub mod page;
pub mod savename;

// Re-export commonly used types
pub use blob::{Blob, BlobError, BlobState, SavedFile};
pub use config::{Config, ConfigError, DEFAULT_ENDPOINT_PREFIX};
pub use fetch::{FetchClient, FetchError};
pub use interceptor::{
    Activation, ClickError, ClickStats, DEFAULT_CONCURRENCY, Interceptor, InterceptorError,
};
pub use page::{Anchor, ScanResult, scan_document};
pub use savename::{NameError, last_segment, sanitize_save_name};
