//! Settings document and persistence.
//!
//! The settings file is a single JSON document with camelCase keys. It is
//! read once at startup and rewritten in place whenever the Patreon token
//! pair rotates, keeping the 4-space indentation the document is
//! maintained with by hand.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use whalesync_error::{ConfigError, JsonError, WhalesyncResult};

fn default_sync_interval_minutes() -> u64 {
    30
}

fn default_tick_timeout_secs() -> u64 {
    300
}

/// Mutable bot configuration, mirroring the on-disk settings document.
///
/// Discord and Patreon identifiers are kept as the decimal strings they
/// appear as on the wire; they are parsed into typed IDs at the gateway
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Guild whose whale role is kept in sync
    guild_id: String,
    /// Role representing supporter status
    whale_role_id: String,
    /// Role already maintained for Twitch subscribers
    twitch_sub_role_id: String,
    /// Optional manually-assigned role whose holders are always included
    #[serde(default)]
    override_role_id: Option<String>,
    /// Discord bot token
    login_token: String,
    /// Patreon OAuth client ID
    patreon_client_id: String,
    /// Patreon OAuth client secret
    patreon_client_secret: String,
    /// Current Patreon access token
    patreon_access_token: String,
    /// Current Patreon refresh token. Empty or absent selects the
    /// long-lived access token deployment: no refresh is attempted.
    #[serde(default)]
    patreon_refresh_token: String,
    /// Campaign whose pledges are listed
    patreon_campaign_id: String,
    /// Minutes between reconciliation passes
    #[serde(default = "default_sync_interval_minutes")]
    sync_interval_minutes: u64,
    /// Watchdog budget for a single pass
    #[serde(default = "default_tick_timeout_secs")]
    tick_timeout_secs: u64,
}

impl Settings {
    /// Interval between reconciliation passes.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_minutes * 60)
    }

    /// Watchdog budget for a single pass.
    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout_secs)
    }

    /// Whether token refresh is configured for this deployment.
    pub fn refresh_enabled(&self) -> bool {
        !self.patreon_refresh_token.is_empty()
    }
}

/// An access/refresh token pair returned by the OAuth token endpoint.
///
/// The two tokens are only ever replaced together. Refresh tokens are
/// single-use, so losing the persisted update strands the process unable
/// to refresh again on the next pass.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, Getters)]
pub struct TokenPair {
    access_token: String,
    refresh_token: String,
}

/// Settings document bound to its on-disk location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load the settings document from disk.
    ///
    /// # Errors
    /// Returns a `ConfigError` if the file cannot be read or does not
    /// parse as a settings document.
    pub fn load(path: impl Into<PathBuf>) -> WhalesyncResult<Self> {
        let path = path.into();
        debug!(path = %path.display(), "loading settings");

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ConfigError::new(format!(
                "failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: Settings = serde_json::from_str(&raw).map_err(|e| {
            ConfigError::new(format!(
                "failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(path = %path.display(), "settings loaded");
        Ok(Self { path, settings })
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// On-disk location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the Patreon token pair and rewrite the document.
    ///
    /// Both fields are staged together; if the rewrite fails the previous
    /// pair is restored in memory so no caller can observe a half-updated
    /// pair.
    ///
    /// # Errors
    /// Surfaces the persistence failure unchanged.
    pub fn replace_token_pair(&mut self, pair: TokenPair) -> WhalesyncResult<()> {
        let previous = TokenPair::new(
            std::mem::replace(&mut self.settings.patreon_access_token, pair.access_token),
            std::mem::replace(&mut self.settings.patreon_refresh_token, pair.refresh_token),
        );

        if let Err(e) = self.persist() {
            self.settings.patreon_access_token = previous.access_token;
            self.settings.patreon_refresh_token = previous.refresh_token;
            return Err(e);
        }

        debug!("token pair rotated and persisted");
        Ok(())
    }

    /// Rewrite the settings document on disk.
    ///
    /// The document is written to a sibling temp file and renamed over
    /// the original, so a crash mid-write never truncates it.
    ///
    /// # Errors
    /// Returns a `ConfigError` if the write or rename fails; failures are
    /// surfaced, never swallowed.
    pub fn persist(&self) -> WhalesyncResult<()> {
        let body = to_pretty_json(&self.settings)?;
        let tmp = self.path.with_extension("tmp");

        std::fs::write(&tmp, &body).map_err(|e| {
            ConfigError::new(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            ConfigError::new(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

// The document is maintained by hand between runs, so the rewrite keeps
// its 4-space indentation instead of serde_json's 2-space default.
fn to_pretty_json(settings: &Settings) -> WhalesyncResult<String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    settings
        .serialize(&mut ser)
        .map_err(|e| JsonError::new(e.to_string()))?;
    String::from_utf8(buf)
        .map_err(|e| JsonError::new(e.to_string()))
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"{
    "guildId": "100",
    "whaleRoleId": "200",
    "twitchSubRoleId": "300",
    "overrideRoleId": "400",
    "loginToken": "discord-token",
    "patreonClientId": "client-id",
    "patreonClientSecret": "client-secret",
    "patreonAccessToken": "access-1",
    "patreonRefreshToken": "refresh-1",
    "patreonCampaignId": "500"
}"#;

    fn write_document(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("settings.json");
        std::fs::write(&path, DOCUMENT).unwrap();
        path
    }

    #[test]
    fn test_load_camel_case_document() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::load(write_document(&dir)).unwrap();

        let settings = store.settings();
        assert_eq!(settings.guild_id(), "100");
        assert_eq!(settings.whale_role_id(), "200");
        assert_eq!(settings.twitch_sub_role_id(), "300");
        assert_eq!(settings.override_role_id().as_deref(), Some("400"));
        assert_eq!(settings.patreon_access_token(), "access-1");
        assert_eq!(settings.patreon_refresh_token(), "refresh-1");
        assert!(settings.refresh_enabled());
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        // Document without override role, refresh token, or scheduling keys.
        let raw = DOCUMENT
            .replace("    \"overrideRoleId\": \"400\",\n", "")
            .replace("    \"patreonRefreshToken\": \"refresh-1\",\n", "");
        std::fs::write(&path, raw).unwrap();

        let store = SettingsStore::load(&path).unwrap();
        let settings = store.settings();
        assert_eq!(*settings.override_role_id(), None);
        assert!(!settings.refresh_enabled());
        assert_eq!(*settings.sync_interval_minutes(), 30);
        assert_eq!(settings.sync_interval(), Duration::from_secs(30 * 60));
        assert_eq!(settings.tick_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_persist_uses_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let path = write_document(&dir);
        let store = SettingsStore::load(&path).unwrap();

        store.persist().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("    \"guildId\": \"100\""));
        assert!(!written.contains("  \"guildId\""));
    }

    #[test]
    fn test_replace_token_pair_rewrites_both_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_document(&dir);
        let mut store = SettingsStore::load(&path).unwrap();

        store
            .replace_token_pair(TokenPair::new("access-2".into(), "refresh-2".into()))
            .unwrap();

        assert_eq!(store.settings().patreon_access_token(), "access-2");
        assert_eq!(store.settings().patreon_refresh_token(), "refresh-2");

        // The rewrite landed on disk, not just in memory.
        let reloaded = SettingsStore::load(&path).unwrap();
        assert_eq!(reloaded.settings().patreon_access_token(), "access-2");
        assert_eq!(reloaded.settings().patreon_refresh_token(), "refresh-2");
    }

    #[test]
    fn test_replace_token_pair_rolls_back_on_write_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_document(&dir);
        let mut store = SettingsStore::load(&path).unwrap();

        // Point the store somewhere unwritable before rotating.
        store.path = dir.path().join("missing").join("settings.json");

        let result =
            store.replace_token_pair(TokenPair::new("access-2".into(), "refresh-2".into()));
        assert!(result.is_err());

        // Neither half of the pair moved.
        assert_eq!(store.settings().patreon_access_token(), "access-1");
        assert_eq!(store.settings().patreon_refresh_token(), "refresh-1");

        // The original document is untouched.
        let on_disk = SettingsStore::load(&path).unwrap();
        assert_eq!(on_disk.settings().patreon_access_token(), "access-1");
        assert_eq!(on_disk.settings().patreon_refresh_token(), "refresh-1");
    }
}
