//! Discord bot client setup and lifecycle management.
//!
//! Owns the serenity client and starts the recurring reconciliation
//! scheduler once the gateway cache is primed. The scheduler's first
//! pass runs immediately, then one per configured interval, forever;
//! pass failures are logged and never escape the loop.

use crate::host::SerenityHost;
use crate::tick::{TickOutcome, TickRunner};
use async_trait::async_trait;
use serenity::Client;
use serenity::client::{Context, EventHandler};
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::GuildId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use whalesync_core::SettingsStore;
use whalesync_error::{SyncError, SyncErrorKind, SyncResult};
use whalesync_patreon::PatreonClient;

/// Discord client for the whale role sync bot.
pub struct WhalesyncBot {
    client: Client,
}

impl WhalesyncBot {
    /// Create a bot from a loaded settings store.
    ///
    /// # Errors
    /// Returns an error if the serenity client fails to initialize,
    /// e.g. on a malformed bot token.
    #[instrument(skip(store))]
    pub async fn new(store: SettingsStore) -> SyncResult<Self> {
        info!("initializing whalesync bot");

        let token = store.settings().login_token().clone();
        let intents = SyncHandler::intents();
        let handler = SyncHandler::new(store);

        debug!(?intents, "building serenity client");
        let client = Client::builder(&token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| {
                SyncError::new(SyncErrorKind::Gateway(format!(
                    "failed to build client: {e}"
                )))
            })?;

        Ok(Self { client })
    }

    /// Connect to the gateway and run until shut down.
    ///
    /// # Errors
    /// Returns an error if the gateway connection fails fatally.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SyncResult<()> {
        info!("starting gateway connection");
        self.client
            .start()
            .await
            .map_err(|e| SyncError::new(SyncErrorKind::Gateway(format!("client error: {e}"))))
    }
}

/// Event handler that launches the sync scheduler.
struct SyncHandler {
    // Handed to the runner on first cache_ready; None afterwards.
    store: std::sync::Mutex<Option<SettingsStore>>,
    scheduler_started: AtomicBool,
}

impl SyncHandler {
    fn new(store: SettingsStore) -> Self {
        Self {
            store: std::sync::Mutex::new(Some(store)),
            scheduler_started: AtomicBool::new(false),
        }
    }

    /// Gateway intents the sync needs: guild metadata plus member lists
    /// for role membership enumeration.
    fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS
    }
}

#[async_trait]
impl EventHandler for SyncHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "discord gateway ready");
    }

    // The scheduler starts here rather than in ready: the first pass
    // runs immediately and needs the member cache populated.
    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        debug!(guilds = guilds.len(), "gateway cache primed");

        // cache_ready fires again after reconnects; one scheduler is enough.
        if self.scheduler_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let store = match self.store.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(store) = store else {
            error!("settings store already consumed, scheduler not started");
            return;
        };

        // interval(Duration::ZERO) panics; a pass per minute is already
        // aggressive for this workload.
        let period = store.settings().sync_interval().max(Duration::from_secs(60));
        let runner = Arc::new(TickRunner::new(
            SerenityHost::new(ctx),
            PatreonClient::new(),
            store,
        ));

        info!(period_secs = period.as_secs(), "starting sync scheduler");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match runner.tick().await {
                    Ok(TickOutcome::Completed(report)) => info!(
                        granted = report.granted,
                        revoked = report.revoked,
                        failed = report.failed,
                        "sync pass complete"
                    ),
                    Ok(TickOutcome::Skipped) => {
                        warn!("previous sync pass still running, skipping this one");
                    }
                    Err(e) => error!(error = %e, "sync pass failed"),
                }
            }
        });
    }
}
