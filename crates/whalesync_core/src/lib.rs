//! Core data types for the Whalesync role reconciliation bot.
//!
//! The only state the bot carries across reconciliation passes is the
//! settings document: credentials, guild and role identifiers, and the
//! Patreon OAuth token pair. This crate owns that document: its wire
//! format, its in-memory representation, and the store that rewrites it
//! on disk when the token pair rotates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod settings;

pub use settings::{Settings, SettingsStore, TokenPair};
