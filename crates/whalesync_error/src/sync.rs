//! Reconciliation error types.
//!
//! Raised by the Discord-side sync pipeline: precondition checks before a
//! pass runs, gateway lookups, and individual role mutations. Precondition
//! and gateway variants abort the current pass; `RoleMutation` is isolated
//! to the member it names and never stops the rest of a pass.

use derive_getters::Getters;

/// Reconciliation error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum SyncErrorKind {
    /// Configured guild is not visible to the bot.
    #[display("guild {_0} not found")]
    GuildNotFound(u64),

    /// The bot's own member record is missing from the guild.
    #[display("bot is not a member of guild {_0}")]
    BotMemberMissing(u64),

    /// The bot lacks the manage-roles capability in the guild.
    #[display("missing permission to manage roles")]
    ManageRolesDenied,

    /// A required role ID does not resolve to a role in the guild.
    #[display("role {_0} not found")]
    RoleNotFound(u64),

    /// A single grant or revoke call failed for one member.
    #[display("role mutation failed for member {user_id}: {detail}")]
    RoleMutation {
        /// Member the mutation targeted
        user_id: u64,
        /// Underlying API failure
        detail: String,
    },

    /// Gateway or REST failure outside a role mutation.
    #[display("gateway error: {_0}")]
    Gateway(String),

    /// The pass exceeded its watchdog budget and was abandoned.
    #[display("pass timed out after {_0}s")]
    TickTimeout(u64),
}

/// Reconciliation error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Sync Error: {} at line {} in {}", kind, line, file)]
pub struct SyncError {
    kind: SyncErrorKind,
    line: u32,
    file: &'static str,
}

impl SyncError {
    /// Create a new SyncError with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use whalesync_error::{SyncError, SyncErrorKind};
    ///
    /// let err = SyncError::new(SyncErrorKind::ManageRolesDenied);
    /// assert_eq!(*err.kind(), SyncErrorKind::ManageRolesDenied);
    /// ```
    #[track_caller]
    pub fn new(kind: SyncErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;
