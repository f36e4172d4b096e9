//! Top-level error wrapper types.

use crate::{ConfigError, JsonError, PatreonError, SyncError};

/// Union of every error the workspace can raise.
///
/// # Examples
///
/// ```
/// use whalesync_error::{WhalesyncError, ConfigError};
///
/// let cfg_err = ConfigError::new("settings file missing");
/// let err: WhalesyncError = cfg_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum WhalesyncErrorKind {
    /// Settings document error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Patreon token or pledge endpoint error
    #[from(PatreonError)]
    Patreon(PatreonError),
    /// Discord-side reconciliation error
    #[from(SyncError)]
    Sync(SyncError),
}

/// Whalesync error with kind discrimination.
///
/// # Examples
///
/// ```
/// use whalesync_error::{WhalesyncResult, SyncError, SyncErrorKind};
///
/// fn check_guild() -> WhalesyncResult<()> {
///     Err(SyncError::new(SyncErrorKind::GuildNotFound(1)))?
/// }
///
/// assert!(check_guild().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Whalesync Error: {}", _0)]
pub struct WhalesyncError(Box<WhalesyncErrorKind>);

impl WhalesyncError {
    /// Create a new error from a kind.
    pub fn new(kind: WhalesyncErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WhalesyncErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to WhalesyncErrorKind
impl<T> From<T> for WhalesyncError
where
    T: Into<WhalesyncErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Whalesync operations.
pub type WhalesyncResult<T> = std::result::Result<T, WhalesyncError>;
