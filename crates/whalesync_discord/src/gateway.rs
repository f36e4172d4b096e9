//! The chat-platform collaborator boundary.
//!
//! Everything the sync logic needs from Discord goes through
//! [`GuildHost`]: lookups and membership enumeration on the read side,
//! role grant/revoke on the write side. Production uses the serenity
//! implementation in [`crate::SerenityHost`]; tests substitute an
//! in-memory guild.

use async_trait::async_trait;
use derive_getters::Getters;
use serenity::model::id::{GuildId, RoleId, UserId};
use whalesync_error::SyncResult;

/// A resolved guild member: identity plus the name used in log output.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, Getters)]
pub struct MemberHandle {
    /// Member identity
    user_id: UserId,
    /// Nickname, global name, or username, in that order of preference
    display_name: String,
}

/// Guild observation and role mutation operations.
///
/// Grant and revoke calls against the same guild must never run
/// concurrently; callers are required to await each mutation before
/// issuing the next.
#[async_trait]
pub trait GuildHost: Send + Sync {
    /// Whether the guild is visible to the bot.
    async fn guild_exists(&self, guild: GuildId) -> SyncResult<bool>;

    /// The bot's own member record in the guild, if it is a member.
    async fn bot_member(&self, guild: GuildId) -> SyncResult<Option<MemberHandle>>;

    /// Whether the bot may manage roles in the guild.
    async fn has_manage_roles(&self, guild: GuildId) -> SyncResult<bool>;

    /// Whether a role ID resolves to a role in the guild.
    async fn role_exists(&self, guild: GuildId, role: RoleId) -> SyncResult<bool>;

    /// Current holders of a role, as of the call.
    async fn role_members(&self, guild: GuildId, role: RoleId) -> SyncResult<Vec<MemberHandle>>;

    /// Resolve a user ID to a guild member, `None` if the user is not a
    /// current member.
    async fn resolve_member(&self, guild: GuildId, user: UserId)
    -> SyncResult<Option<MemberHandle>>;

    /// Grant a role to a member.
    async fn grant_role(&self, guild: GuildId, user: UserId, role: RoleId) -> SyncResult<()>;

    /// Revoke a role from a member.
    async fn revoke_role(&self, guild: GuildId, user: UserId, role: RoleId) -> SyncResult<()>;
}
