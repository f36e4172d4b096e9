//! Wire models for the Patreon token and pledge listing endpoints.
//!
//! The pledge listing side-loads related records in an `included` array;
//! only records of type `"user"` carry the social connection data the bot
//! cares about, so every nested field is optional with a serde default.
//! Records of other types deserialize into empty attributes and are
//! skipped by the projection.

use derive_getters::Getters;
use serde::Deserialize;
use whalesync_core::TokenPair;

/// Success body of the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct TokenResponse {
    /// Replacement access token
    access_token: String,
    /// Replacement refresh token; single-use, must be persisted
    refresh_token: String,
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        TokenPair::new(response.access_token, response.refresh_token)
    }
}

/// One page of the pledge listing.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct PledgePage {
    /// Side-loaded records of mixed type
    #[serde(default)]
    included: Vec<IncludedRecord>,
    /// Pagination links
    #[serde(default)]
    links: PageLinks,
}

impl PledgePage {
    /// URL of the next page, absent on the last page.
    pub fn next_url(&self) -> Option<&str> {
        self.links.next.as_deref()
    }
}

/// Pagination links attached to a listing page.
#[derive(Debug, Clone, Default, Deserialize, Getters)]
pub struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

/// A side-loaded record from the `included` array.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct IncludedRecord {
    /// Record type discriminator, e.g. `"user"` or `"reward"`
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: RecordAttributes,
}

impl IncludedRecord {
    /// The Discord account linked to a user record, when one exists.
    ///
    /// Returns `None` for non-user records and for patrons who never
    /// linked a Discord account.
    pub fn discord_user_id(&self) -> Option<&str> {
        if self.kind != "user" {
            return None;
        }
        self.attributes
            .social_connections
            .as_ref()?
            .discord
            .as_ref()?
            .user_id
            .as_deref()
    }
}

/// Attributes of a side-loaded record. Only user records populate these.
#[derive(Debug, Clone, Default, Deserialize, Getters)]
pub struct RecordAttributes {
    #[serde(default)]
    social_connections: Option<SocialConnections>,
}

/// External platform accounts a patron has linked.
#[derive(Debug, Clone, Default, Deserialize, Getters)]
pub struct SocialConnections {
    #[serde(default)]
    discord: Option<DiscordConnection>,
}

/// A linked Discord account.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct DiscordConnection {
    #[serde(default)]
    user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_projects_linked_account() {
        let record: IncludedRecord = serde_json::from_str(
            r#"{
                "type": "user",
                "attributes": {
                    "social_connections": {
                        "discord": { "user_id": "123" },
                        "twitter": null
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(record.discord_user_id(), Some("123"));
    }

    #[test]
    fn test_user_record_without_linked_account() {
        let record: IncludedRecord = serde_json::from_str(
            r#"{
                "type": "user",
                "attributes": { "social_connections": { "discord": null } }
            }"#,
        )
        .unwrap();

        assert_eq!(record.discord_user_id(), None);
    }

    #[test]
    fn test_non_user_record_is_skipped() {
        let record: IncludedRecord = serde_json::from_str(
            r#"{
                "type": "reward",
                "attributes": {
                    "social_connections": { "discord": { "user_id": "123" } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(record.discord_user_id(), None);
    }

    #[test]
    fn test_last_page_has_no_next_link() {
        let page: PledgePage =
            serde_json::from_str(r#"{ "included": [], "links": {} }"#).unwrap();
        assert_eq!(page.next_url(), None);

        let page: PledgePage = serde_json::from_str(r#"{ "included": [] }"#).unwrap();
        assert_eq!(page.next_url(), None);
    }
}
