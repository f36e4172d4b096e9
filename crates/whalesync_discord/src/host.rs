//! Serenity-backed implementation of the guild boundary.
//!
//! Reads come from the gateway cache, which reflects guild state as of
//! the last gateway event. Mutations go through the REST client. The
//! cache only carries member lists when the `GUILD_MEMBERS` intent is
//! requested; the bot requests it at connect time.

use crate::gateway::{GuildHost, MemberHandle};
use async_trait::async_trait;
use serenity::client::Context;
use serenity::model::guild::{Guild, Member};
use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use whalesync_error::{SyncError, SyncErrorKind, SyncResult};

/// Guild boundary over a serenity gateway context.
#[derive(Clone)]
pub struct SerenityHost {
    ctx: Context,
}

impl SerenityHost {
    /// Wrap a gateway context handed out by an event callback.
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Run a closure against the cached guild.
    ///
    /// # Errors
    /// `GuildNotFound` when the guild is absent from the cache.
    fn with_guild<T>(&self, guild: GuildId, f: impl FnOnce(&Guild) -> T) -> SyncResult<T> {
        match self.ctx.cache.guild(guild) {
            Some(cached) => Ok(f(&cached)),
            None => Err(SyncError::new(SyncErrorKind::GuildNotFound(guild.get()))),
        }
    }

    fn bot_user_id(&self) -> UserId {
        self.ctx.cache.current_user().id
    }
}

fn handle_of(member: &Member) -> MemberHandle {
    MemberHandle::new(member.user.id, member.display_name().to_string())
}

// Effective permissions from the member's roles plus @everyone, which
// shares its ID with the guild.
fn member_permissions(guild: &Guild, member: &Member) -> Permissions {
    let everyone = RoleId::new(guild.id.get());
    let mut permissions = guild
        .roles
        .get(&everyone)
        .map_or(Permissions::empty(), |role| role.permissions);
    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            permissions |= role.permissions;
        }
    }
    permissions
}

#[async_trait]
impl GuildHost for SerenityHost {
    async fn guild_exists(&self, guild: GuildId) -> SyncResult<bool> {
        Ok(self.ctx.cache.guild(guild).is_some())
    }

    async fn bot_member(&self, guild: GuildId) -> SyncResult<Option<MemberHandle>> {
        let bot_id = self.bot_user_id();
        self.with_guild(guild, |g| g.members.get(&bot_id).map(handle_of))
    }

    async fn has_manage_roles(&self, guild: GuildId) -> SyncResult<bool> {
        let bot_id = self.bot_user_id();
        self.with_guild(guild, |g| {
            g.members.get(&bot_id).is_some_and(|member| {
                let permissions = member_permissions(g, member);
                permissions.contains(Permissions::ADMINISTRATOR)
                    || permissions.contains(Permissions::MANAGE_ROLES)
            })
        })
    }

    async fn role_exists(&self, guild: GuildId, role: RoleId) -> SyncResult<bool> {
        self.with_guild(guild, |g| g.roles.contains_key(&role))
    }

    async fn role_members(&self, guild: GuildId, role: RoleId) -> SyncResult<Vec<MemberHandle>> {
        self.with_guild(guild, |g| {
            g.members
                .values()
                .filter(|member| member.roles.contains(&role))
                .map(handle_of)
                .collect()
        })
    }

    async fn resolve_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> SyncResult<Option<MemberHandle>> {
        self.with_guild(guild, |g| g.members.get(&user).map(handle_of))
    }

    async fn grant_role(&self, guild: GuildId, user: UserId, role: RoleId) -> SyncResult<()> {
        self.ctx
            .http
            .add_member_role(guild, user, role, Some("whale role sync"))
            .await
            .map_err(|e| {
                SyncError::new(SyncErrorKind::RoleMutation {
                    user_id: user.get(),
                    detail: e.to_string(),
                })
            })
    }

    async fn revoke_role(&self, guild: GuildId, user: UserId, role: RoleId) -> SyncResult<()> {
        self.ctx
            .http
            .remove_member_role(guild, user, role, Some("whale role sync"))
            .await
            .map_err(|e| {
                SyncError::new(SyncErrorKind::RoleMutation {
                    user_id: user.get(),
                    detail: e.to_string(),
                })
            })
    }
}
