//! Endpoint resolution: exchange a bearer token for a websocket URL.
//!
//! The session only depends on [`EndpointResolver`]; [`RtmConnectResolver`]
//! is the HTTP implementation used by the binary.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ResolveError;

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Upper bound on the whole `rtm.connect` exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in a [`ResolveError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// A validated `ws://` or `wss://` connection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    account: Option<Account>,
}

/// Identity reported alongside the endpoint, when the server provides it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub user_id: String,
    pub user_name: String,
    pub team_id: String,
    pub team_name: String,
    pub team_domain: String,
}

impl Endpoint {
    /// Parse and validate a websocket URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidUrl`] when the string is not a URL or
    /// its scheme is not `ws`/`wss`.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let url = Url::parse(raw).map_err(|e| ResolveError::InvalidUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ResolveError::InvalidUrl {
                url: raw.to_owned(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Ok(Self { url, account: None })
    }

    #[must_use]
    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Exchanges a credential for exactly one connection endpoint.
#[async_trait::async_trait]
pub trait EndpointResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the exchange fails for any reason; the
    /// session must not start in that case.
    async fn resolve(&self, credential: &str) -> Result<Endpoint, ResolveError>;
}

// =============================================================================
// HTTP RESOLVER
// =============================================================================

/// Resolver backed by the `rtm.connect` HTTP method.
pub struct RtmConnectResolver {
    http: reqwest::Client,
    base_url: String,
}

impl RtmConnectResolver {
    /// # Errors
    ///
    /// Returns [`ResolveError::HttpClientBuild`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str) -> Result<Self, ResolveError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::HttpClientBuild`] if the HTTP client cannot
    /// be constructed.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ResolveError::HttpClientBuild)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn connect_url(&self) -> String {
        format!("{}/rtm.connect", self.base_url)
    }
}

#[async_trait::async_trait]
impl EndpointResolver for RtmConnectResolver {
    async fn resolve(&self, credential: &str) -> Result<Endpoint, ResolveError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ResolveError::MissingCredential);
        }

        debug!(url = %self.connect_url(), "resolve: requesting endpoint");
        let response = self
            .http
            .get(self.connect_url())
            .query(&[
                ("token", credential),
                ("presence_sub", "1"),
                ("batch_presence_aware", "1"),
            ])
            .send()
            .await
            .map_err(redact)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(redact)?;
        let endpoint = parse_connect_response(status, &body)?;

        match endpoint.account() {
            Some(account) => info!(
                user = %account.user_name,
                team = %account.team_domain,
                "resolve: endpoint acquired"
            ),
            None => info!("resolve: endpoint acquired"),
        }
        Ok(endpoint)
    }
}

/// The request URL carries the credential in its query, so it must never
/// reach an error message.
fn redact(e: reqwest::Error) -> ResolveError {
    ResolveError::Request(e.without_url())
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "self")]
    identity: Option<ConnectIdentity>,
    #[serde(default)]
    team: Option<ConnectTeam>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectIdentity {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectTeam {
    id: String,
    name: String,
    domain: String,
}

/// Turn an `rtm.connect` HTTP response into an endpoint.
///
/// # Errors
///
/// Non-2xx status, unparseable body, `ok: false`, and a missing or invalid
/// `url` each map to their own [`ResolveError`] variant.
pub fn parse_connect_response(status: u16, body: &str) -> Result<Endpoint, ResolveError> {
    if !(200..300).contains(&status) {
        return Err(ResolveError::Status {
            status,
            body: truncate_body(body),
        });
    }

    let response: ConnectResponse = serde_json::from_str(body)?;
    if !response.ok {
        return Err(ResolveError::Rejected {
            error: response.error.unwrap_or_else(|| "unknown error".to_owned()),
        });
    }

    let url = response
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or(ResolveError::MissingUrl)?;
    let endpoint = Endpoint::parse(url.trim())?;

    if response.identity.is_none() && response.team.is_none() {
        return Ok(endpoint);
    }
    let identity = response.identity.unwrap_or_default();
    let team = response.team.unwrap_or_default();
    Ok(endpoint.with_account(Account {
        user_id: identity.id,
        user_name: identity.name,
        team_id: team.id,
        team_name: team.name,
        team_domain: team.domain,
    }))
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
