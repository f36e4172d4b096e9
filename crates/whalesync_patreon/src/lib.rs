//! Patreon API integration for the Whalesync role reconciliation bot.
//!
//! Two calls, both made once per reconciliation pass:
//! - exchanging the stored refresh token for a new access/refresh pair
//!   against the OAuth token endpoint, and
//! - walking the paginated pledge listing for the configured campaign,
//!   projecting each backer to the Discord account linked to it.
//!
//! Both endpoints are constructor-injectable so tests can stand up a
//! local mock server; the defaults are the production Patreon URLs.

#![warn(missing_docs)]

mod client;
mod models;

pub use client::{BackerIdSet, PatreonClient};
pub use models::{
    DiscordConnection, IncludedRecord, PageLinks, PledgePage, RecordAttributes,
    SocialConnections, TokenResponse,
};
