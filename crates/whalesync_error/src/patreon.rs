//! Patreon API error types.
//!
//! Covers the two calls the bot makes against Patreon: the OAuth token
//! refresh and the paginated pledge listing. Every variant aborts the
//! current reconciliation pass; none of them are fatal to the process.

use derive_getters::Getters;

/// Patreon error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum PatreonErrorKind {
    /// Token endpoint answered with a non-success status. The stored
    /// token pair is left untouched when this is raised.
    #[display("token refresh rejected with status {status}")]
    TokenRefresh {
        /// HTTP status returned by the token endpoint
        status: u16,
    },

    /// Pledge listing answered with a non-success status on some page.
    /// The partially accumulated backer set is discarded.
    #[display("pledge listing failed with status {status}")]
    PledgeFetch {
        /// HTTP status returned by the listing endpoint
        status: u16,
    },

    /// Request never produced a response (DNS, TLS, connection reset).
    #[display("transport failure: {_0}")]
    Transport(String),

    /// Response body did not match the expected JSON shape.
    #[display("malformed response body: {_0}")]
    Decode(String),
}

/// Patreon error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Patreon Error: {} at line {} in {}", kind, line, file)]
pub struct PatreonError {
    kind: PatreonErrorKind,
    line: u32,
    file: &'static str,
}

impl PatreonError {
    /// Create a new PatreonError with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use whalesync_error::{PatreonError, PatreonErrorKind};
    ///
    /// let err = PatreonError::new(PatreonErrorKind::TokenRefresh { status: 401 });
    /// assert_eq!(*err.kind(), PatreonErrorKind::TokenRefresh { status: 401 });
    /// ```
    #[track_caller]
    pub fn new(kind: PatreonErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for Patreon operations.
pub type PatreonResult<T> = Result<T, PatreonError>;
