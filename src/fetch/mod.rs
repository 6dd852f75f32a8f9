//! Binary HTTP fetching for intercepted activations.
//!
//! One activation issues one binary GET; the response body is streamed
//! into a staging file rather than buffered in memory. Failures surface
//! as structured errors; nothing is silently absorbed.
//!
//! # Example
//!
//! ```no_run
//! use linksave_core::fetch::FetchClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FetchClient::new();
//! let bytes = client
//!     .fetch_binary_to("https://example.com/upload/q1.pdf", Path::new("./q1.part"))
//!     .await?;
//! println!("fetched {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{CONNECT_TIMEOUT_SECS, FetchClient, READ_TIMEOUT_SECS};
pub use error::FetchError;
