//! Discord integration for the Whalesync role reconciliation bot.
//!
//! One reconciliation pass ("tick") keeps the whale role aligned with
//! three membership sources: the Twitch-subscriber role, Patreon backers
//! with a linked Discord account, and an optional override role.
//!
//! # Architecture
//!
//! ## Boundary Layer
//! - **gateway**: the [`GuildHost`] trait, the only seam the sync logic
//!   uses to observe and mutate the guild
//! - **host**: [`SerenityHost`], the production implementation over the
//!   serenity gateway cache and HTTP client
//!
//! ## Sync Layer
//! - **resolver**: backer-ID resolution and the three-source union
//! - **reconciler**: desired-vs-current diff and sequential apply
//! - **tick**: one full pass with precondition gate, overlap guard, and
//!   watchdog
//!
//! ## Lifecycle Layer
//! - **client**: serenity client setup and the recurring scheduler

#![warn(missing_docs)]

mod client;
mod gateway;
mod host;
mod reconciler;
mod resolver;
mod tick;

pub use client::WhalesyncBot;
pub use gateway::{GuildHost, MemberHandle};
pub use host::SerenityHost;
pub use reconciler::{ReconcileReport, RoleDiff};
pub use resolver::{DesiredWhaleSet, desired_whales, resolve_backers};
pub use tick::{TickOutcome, TickRunner};
