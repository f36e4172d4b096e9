//! One full reconciliation pass.
//!
//! Stage order is fixed: precondition gate, token rotation, backer
//! fetch, desired-set computation, diff, apply. Each stage's output
//! feeds the next; a failure in any stage before apply abandons the pass
//! with nothing mutated. The runner is built to live on a timer
//! indefinitely; nothing it returns should ever take the process down.

use crate::gateway::GuildHost;
use crate::reconciler::{self, ReconcileReport, RoleDiff};
use crate::resolver;
use serenity::model::id::{GuildId, RoleId};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use whalesync_core::{Settings, SettingsStore};
use whalesync_error::{ConfigError, SyncError, SyncErrorKind, WhalesyncResult};
use whalesync_patreon::PatreonClient;

/// What a single invocation of [`TickRunner::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The pass ran to completion; counts attached.
    Completed(ReconcileReport),
    /// A previous pass was still in flight; this invocation did nothing.
    Skipped,
}

/// Runs reconciliation passes against one guild.
///
/// Holds the only mutable state that survives between passes: the
/// settings store with its token pair. Overlap is prevented with an
/// in-flight flag; a pass invoked while another is running is skipped,
/// not queued.
pub struct TickRunner<H> {
    host: H,
    patreon: PatreonClient,
    store: Mutex<SettingsStore>,
    in_flight: AtomicBool,
}

// Identifiers the pass works against, parsed out of the settings
// document once per pass.
struct SyncTargets {
    guild: GuildId,
    whale_role: RoleId,
    twitch_role: RoleId,
    override_role: Option<RoleId>,
}

impl SyncTargets {
    fn from_settings(settings: &Settings) -> WhalesyncResult<Self> {
        Ok(Self {
            guild: GuildId::new(parse_snowflake("guildId", settings.guild_id())?),
            whale_role: RoleId::new(parse_snowflake("whaleRoleId", settings.whale_role_id())?),
            twitch_role: RoleId::new(parse_snowflake(
                "twitchSubRoleId",
                settings.twitch_sub_role_id(),
            )?),
            override_role: match settings.override_role_id() {
                Some(raw) => Some(RoleId::new(parse_snowflake("overrideRoleId", raw)?)),
                None => None,
            },
        })
    }
}

fn parse_snowflake(field: &str, value: &str) -> WhalesyncResult<u64> {
    match value.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ConfigError::new(format!("{field} is not a valid snowflake: {value:?}")).into()),
    }
}

impl<H: GuildHost> TickRunner<H> {
    /// Create a runner over a guild boundary, a Patreon client, and the
    /// settings store.
    pub fn new(host: H, patreon: PatreonClient, store: SettingsStore) -> Self {
        Self {
            host,
            patreon,
            store: Mutex::new(store),
            in_flight: AtomicBool::new(false),
        }
    }

    /// The guild boundary this runner works against.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run one reconciliation pass.
    ///
    /// Returns [`TickOutcome::Skipped`] without doing any work when a
    /// previous pass is still in flight. The whole pass runs under the
    /// configured watchdog budget; on expiry it is abandoned with a
    /// `TickTimeout` error and the in-flight flag is released.
    ///
    /// # Errors
    /// Any stage failure aborts this pass only; the runner stays usable
    /// for the next one.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> WhalesyncResult<TickOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(TickOutcome::Skipped);
        }

        let budget = self.store.lock().await.settings().tick_timeout();
        let result = tokio::time::timeout(budget, self.run_once()).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(outcome) => outcome.map(TickOutcome::Completed),
            Err(_) => Err(SyncError::new(SyncErrorKind::TickTimeout(budget.as_secs())).into()),
        }
    }

    async fn run_once(&self) -> WhalesyncResult<ReconcileReport> {
        // Snapshot configuration for the whole pass.
        let (targets, client_id, client_secret, refresh_token, mut access_token, campaign_id) = {
            let store = self.store.lock().await;
            let settings = store.settings();
            (
                SyncTargets::from_settings(settings)?,
                settings.patreon_client_id().clone(),
                settings.patreon_client_secret().clone(),
                settings.patreon_refresh_token().clone(),
                settings.patreon_access_token().clone(),
                settings.patreon_campaign_id().clone(),
            )
        };

        self.check_preconditions(&targets).await?;

        // Rotate the token pair before the first authenticated request.
        // Refresh tokens are single-use: the new pair must reach disk
        // before anything downstream depends on it. Deployments on a
        // long-lived access token configure no refresh token and skip
        // this stage.
        if !refresh_token.is_empty() {
            let pair = self
                .patreon
                .refresh_tokens(&client_id, &client_secret, &refresh_token)
                .await?;
            access_token = pair.access_token().clone();
            self.store.lock().await.replace_token_pair(pair)?;
        }

        let backers = self.patreon.fetch_backers(&access_token, &campaign_id).await?;

        let twitch_subs = self
            .host
            .role_members(targets.guild, targets.twitch_role)
            .await?;
        let resolved = resolver::resolve_backers(&self.host, targets.guild, &backers).await?;
        let overrides = match targets.override_role {
            Some(role) if self.host.role_exists(targets.guild, role).await? => {
                self.host.role_members(targets.guild, role).await?
            }
            Some(role) => {
                debug!(role = role.get(), "override role not present in guild");
                Vec::new()
            }
            None => Vec::new(),
        };

        let desired = resolver::desired_whales(twitch_subs, resolved, overrides);
        let holders = self
            .host
            .role_members(targets.guild, targets.whale_role)
            .await?;
        let diff = RoleDiff::compute(&desired, &holders);
        info!(
            desired = desired.len(),
            holders = holders.len(),
            to_add = diff.to_add().len(),
            to_remove = diff.to_remove().len(),
            "role diff computed"
        );

        Ok(reconciler::apply(&self.host, targets.guild, targets.whale_role, &diff).await)
    }

    // All preconditions are checked before the first Patreon request, so
    // a misconfigured guild never burns the single-use refresh token.
    async fn check_preconditions(&self, targets: &SyncTargets) -> WhalesyncResult<()> {
        let guild = targets.guild;

        if !self.host.guild_exists(guild).await? {
            return Err(SyncError::new(SyncErrorKind::GuildNotFound(guild.get())).into());
        }
        if self.host.bot_member(guild).await?.is_none() {
            return Err(SyncError::new(SyncErrorKind::BotMemberMissing(guild.get())).into());
        }
        if !self.host.has_manage_roles(guild).await? {
            return Err(SyncError::new(SyncErrorKind::ManageRolesDenied).into());
        }
        if !self.host.role_exists(guild, targets.whale_role).await? {
            return Err(
                SyncError::new(SyncErrorKind::RoleNotFound(targets.whale_role.get())).into(),
            );
        }
        if !self.host.role_exists(guild, targets.twitch_role).await? {
            return Err(
                SyncError::new(SyncErrorKind::RoleNotFound(targets.twitch_role.get())).into(),
            );
        }

        Ok(())
    }
}
