//! Whalesync keeps a Discord supporter role ("whale" role) in sync with
//! two external membership sources: an existing Twitch-subscriber role
//! and the campaign's active Patreon backers, plus an optional manually
//! managed override role.
//!
//! On a configurable interval the bot rotates its Patreon OAuth token
//! pair, walks the paginated pledge listing, unions the three sources
//! into the desired member set, diffs it against current role holders,
//! and applies the minimal grant/revoke sequence, one mutation at a
//! time, isolating per-member failures so a single bad call never
//! blocks the rest of a pass.
//!
//! This crate is a facade over the workspace:
//! - [`whalesync_core`]: the settings document and its store
//! - [`whalesync_patreon`]: OAuth refresh and pledge pagination
//! - [`whalesync_discord`]: the gateway boundary, reconciliation, and
//!   bot lifecycle
//! - [`whalesync_error`]: error types

#![warn(missing_docs)]

pub use whalesync_core::{Settings, SettingsStore, TokenPair};
pub use whalesync_discord::{
    DesiredWhaleSet, GuildHost, MemberHandle, ReconcileReport, RoleDiff, SerenityHost,
    TickOutcome, TickRunner, WhalesyncBot, desired_whales, resolve_backers,
};
pub use whalesync_error::{
    ConfigError, JsonError, PatreonError, PatreonErrorKind, PatreonResult, SyncError,
    SyncErrorKind, SyncResult, WhalesyncError, WhalesyncErrorKind, WhalesyncResult,
};
pub use whalesync_patreon::{BackerIdSet, PatreonClient};
