//! Error types for the Whalesync workspace.
//!
//! This crate provides the foundation error types used by the other
//! whalesync crates.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use whalesync_error::{ConfigError, WhalesyncResult};
//!
//! fn read_settings() -> WhalesyncResult<String> {
//!     Err(ConfigError::new("settings file missing"))?
//! }
//!
//! match read_settings() {
//!     Ok(raw) => println!("Loaded: {}", raw),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod json;
mod patreon;
mod sync;

pub use config::ConfigError;
pub use error::{WhalesyncError, WhalesyncErrorKind, WhalesyncResult};
pub use json::JsonError;
pub use patreon::{PatreonError, PatreonErrorKind, PatreonResult};
pub use sync::{SyncError, SyncErrorKind, SyncResult};
