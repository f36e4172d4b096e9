//! Patreon HTTP client.

use crate::models::{PledgePage, TokenResponse};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};
use whalesync_core::TokenPair;
use whalesync_error::{PatreonError, PatreonErrorKind, PatreonResult};

/// Deduplicated set of linked Discord user IDs, one per backer.
pub type BackerIdSet = BTreeSet<String>;

const TOKEN_URL: &str = "https://api.patreon.com/oauth2/token";
const API_BASE: &str = "https://www.patreon.com/api/oauth2/api";

/// Client for the Patreon token and pledge listing endpoints.
#[derive(Debug, Clone)]
pub struct PatreonClient {
    http: reqwest::Client,
    token_url: String,
    api_base: String,
}

impl Default for PatreonClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PatreonClient {
    /// Create a client against the production Patreon endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(TOKEN_URL, API_BASE)
    }

    /// Create a client against custom endpoints.
    pub fn with_endpoints(token_url: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            api_base: api_base.into(),
        }
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// Patreon rotates refresh tokens on every exchange, so the returned
    /// pair must be persisted before any downstream request uses it.
    ///
    /// # Errors
    /// `TokenRefresh` carrying the HTTP status on a non-success response;
    /// `Transport`/`Decode` when the request or body fails. All of them
    /// abort the current pass without touching stored state.
    #[instrument(skip(self, client_secret, refresh_token))]
    pub async fn refresh_tokens(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> PatreonResult<TokenPair> {
        debug!("refreshing oauth token pair");

        let response = self
            .http
            .post(&self.token_url)
            .query(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| PatreonError::new(PatreonErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PatreonError::new(PatreonErrorKind::TokenRefresh {
                status: status.as_u16(),
            }));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PatreonError::new(PatreonErrorKind::Decode(e.to_string())))?;

        info!("oauth token pair refreshed");
        Ok(body.into())
    }

    /// Walk the paginated pledge listing and collect linked Discord IDs.
    ///
    /// Pages are fetched in strict order; the next page's URL is only
    /// known from the previous page's `links.next`. Patrons without a
    /// linked Discord account contribute nothing.
    ///
    /// # Errors
    /// `PledgeFetch` carrying the HTTP status on a non-success page;
    /// `Transport`/`Decode` for request and body failures. A failure on
    /// any page discards the whole set: a partial backer list must never
    /// drive role removal.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_backers(
        &self,
        access_token: &str,
        campaign_id: &str,
    ) -> PatreonResult<BackerIdSet> {
        let mut backers = BackerIdSet::new();
        let mut next_url = Some(format!(
            "{}/campaigns/{}/pledges?include=patron.null",
            self.api_base, campaign_id
        ));
        let mut pages = 0usize;

        while let Some(url) = next_url {
            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| PatreonError::new(PatreonErrorKind::Transport(e.to_string())))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PatreonError::new(PatreonErrorKind::PledgeFetch {
                    status: status.as_u16(),
                }));
            }

            let page: PledgePage = response
                .json()
                .await
                .map_err(|e| PatreonError::new(PatreonErrorKind::Decode(e.to_string())))?;

            for record in page.included() {
                if let Some(id) = record.discord_user_id() {
                    backers.insert(id.to_owned());
                }
            }

            pages += 1;
            next_url = page.next_url().map(str::to_owned);
        }

        info!(backers = backers.len(), pages, "pledge listing walked");
        Ok(backers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_record(discord_id: &str) -> serde_json::Value {
        json!({
            "type": "user",
            "attributes": {
                "social_connections": { "discord": { "user_id": discord_id } }
            }
        })
    }

    #[tokio::test]
    async fn test_refresh_tokens_returns_new_pair() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(query_param("refresh_token", "refresh-1"))
            .and(query_param("client_id", "id"))
            .and(query_param("client_secret", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-2",
                "refresh_token": "refresh-2",
                "expires_in": 2678400
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            PatreonClient::with_endpoints(format!("{}/oauth2/token", server.uri()), server.uri());
        let pair = client
            .refresh_tokens("id", "secret", "refresh-1")
            .await
            .unwrap();

        assert_eq!(pair.access_token(), "access-2");
        assert_eq!(pair.refresh_token(), "refresh-2");
    }

    #[tokio::test]
    async fn test_refresh_tokens_surfaces_rejection_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client =
            PatreonClient::with_endpoints(format!("{}/oauth2/token", server.uri()), server.uri());
        let err = client
            .refresh_tokens("id", "secret", "refresh-1")
            .await
            .unwrap_err();

        assert_eq!(*err.kind(), PatreonErrorKind::TokenRefresh { status: 401 });
    }

    #[tokio::test]
    async fn test_fetch_backers_follows_next_link_then_stops() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/campaigns/500/pledges"))
            .and(query_param("include", "patron.null"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "included": [
                    user_record("11"),
                    { "type": "pledge", "attributes": {} },
                    { "type": "user", "attributes": { "social_connections": {} } }
                ],
                "links": { "next": format!("{}/page2", server.uri()) }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "included": [user_record("22"), user_record("11")],
                "links": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PatreonClient::with_endpoints("http://unused.invalid", server.uri());
        let backers = client.fetch_backers("access-1", "500").await.unwrap();

        // Two pages, exactly one request each (expectations verified on
        // drop), linked IDs deduplicated, unlinked records dropped.
        assert_eq!(
            backers,
            BackerIdSet::from(["11".to_string(), "22".to_string()])
        );
    }

    #[tokio::test]
    async fn test_fetch_backers_mid_pagination_failure_discards_set() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/campaigns/500/pledges"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "included": [user_record("11")],
                "links": { "next": format!("{}/page2", server.uri()) }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/page2"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = PatreonClient::with_endpoints("http://unused.invalid", server.uri());
        let err = client.fetch_backers("access-1", "500").await.unwrap_err();

        assert_eq!(*err.kind(), PatreonErrorKind::PledgeFetch { status: 502 });
    }

    #[tokio::test]
    async fn test_fetch_backers_transport_failure() {
        // Nothing is listening on this address.
        let client =
            PatreonClient::with_endpoints("http://unused.invalid", "http://127.0.0.1:1");
        let err = client.fetch_backers("access-1", "500").await.unwrap_err();

        assert!(matches!(err.kind(), PatreonErrorKind::Transport(_)));
    }
}
