//! Netdisco inventory client: login and per-address node search.
//!
//! Every request carries a client-wide timeout. Login failures are errors;
//! lookup failures are logged and degrade to an unresolved [`LocationInfo`].
//! A token rejected with 401 is replaced by logging in again once, when
//! credentials are stored.

pub mod models;

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;

use crate::core::mac::MacAddress;
use crate::core::record::LocationInfo;
use crate::error::AppError;
use crate::settings::{ConfigContext, EnrichmentSettings};

const JSON: &str = "application/json";

/// Result of one node search request.
enum Search {
    Found(LocationInfo),
    Unauthorized,
}

/// Authenticated client for one inventory deployment.
pub struct EnrichmentClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    /// `(username, password)` for re-login, when stored.
    credentials: Option<(String, String)>,
    api_key: RwLock<String>,
    /// Serializes re-login so concurrent lookups log in once.
    relogin_lock: tokio::sync::Mutex<()>,
    token_store: Option<Arc<ConfigContext>>,
}

impl fmt::Debug for EnrichmentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("can_relogin", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl EnrichmentClient {
    /// Build a client from settings that already hold a token.
    ///
    /// A `Config` error here means "enrichment disabled": the caller proceeds
    /// vendor-only.
    pub fn from_settings(settings: &EnrichmentSettings, timeout: Duration) -> Result<Self, AppError> {
        if settings.base_url.trim().is_empty() {
            return Err(AppError::Config("Netdisco API URL is not configured".into()));
        }
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("Netdisco API key is not available".into()))?;

        Ok(Self {
            http: build_http(timeout)?,
            base_url: trim_base(&settings.base_url),
            timeout,
            credentials: settings
                .has_credentials()
                .then(|| (settings.username.clone(), settings.password.clone())),
            api_key: RwLock::new(api_key.to_string()),
            relogin_lock: tokio::sync::Mutex::new(()),
            token_store: None,
        })
    }

    /// Save tokens obtained by re-login into `config`.
    pub fn with_token_store(mut self, config: Arc<ConfigContext>) -> Self {
        self.token_store = Some(config);
        self
    }

    /// Log in with HTTP Basic credentials and return the API token.
    pub async fn authenticate(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<String, AppError> {
        let http = build_http(timeout)?;
        login(&http, &trim_base(base_url), username, password).await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token currently sent with lookups.
    pub fn api_key(&self) -> String {
        self.api_key.read().unwrap().clone()
    }

    /// Location of `address`. Never fails: any error yields an unresolved result.
    pub async fn lookup(&self, address: &MacAddress) -> LocationInfo {
        match self.try_lookup(address).await {
            Ok(info) => {
                tracing::debug!(mac = %address, resolved = info.is_resolved(), "Netdisco lookup finished");
                info
            }
            Err(e) => {
                tracing::warn!("Netdisco lookup for {address} failed: {e}");
                LocationInfo::unresolved()
            }
        }
    }

    async fn try_lookup(&self, address: &MacAddress) -> Result<LocationInfo, AppError> {
        let token = self.api_key();
        if let Search::Found(info) = self.search(address, &token).await? {
            return Ok(info);
        }

        let token = self.relogin(&token).await?;
        match self.search(address, &token).await? {
            Search::Found(info) => Ok(info),
            Search::Unauthorized => Err(AppError::Auth("Node search rejected a fresh API key".into())),
        }
    }

    async fn search(&self, address: &MacAddress, token: &str) -> Result<Search, AppError> {
        let url = format!("{}/api/v1/search/node?q={}", self.base_url, address.canonical());
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, JSON)
            .header(AUTHORIZATION, token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(Search::Unauthorized);
        }
        if !status.is_success() {
            return Err(AppError::Enrichment(format!("Node search returned HTTP {status}")));
        }
        let body: Value = response.json().await?;
        Ok(Search::Found(models::parse_node_search(&body)))
    }

    /// Replace the rejected token `stale` with a fresh one.
    ///
    /// When another lookup already replaced it, that token is reused.
    async fn relogin(&self, stale: &str) -> Result<String, AppError> {
        let (username, password) = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::Auth("API key rejected and no credentials are stored".into()))?;

        let _relogin = self.relogin_lock.lock().await;
        let current = self.api_key();
        if current != stale {
            return Ok(current);
        }

        tracing::info!("Netdisco API key rejected; logging in again");
        let fresh = login(&self.http, &self.base_url, username, password).await?;
        *self.api_key.write().unwrap() = fresh.clone();

        if let Some(config) = &self.token_store {
            let token = fresh.clone();
            if let Err(e) = config.update(move |s| s.enrichment.api_key = Some(token)) {
                tracing::warn!("Could not save the new Netdisco API key: {e}");
            }
        }
        Ok(fresh)
    }
}

async fn login(
    http: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<String, AppError> {
    let url = format!("{base_url}/login");
    let credentials = BASE64.encode(format!("{username}:{password}"));

    let response = http
        .post(&url)
        .header(ACCEPT, JSON)
        .header(AUTHORIZATION, format!("Basic {credentials}"))
        .send()
        .await
        .map_err(|e| AppError::Auth(format!("Login request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Auth(format!("Login rejected with HTTP {status}")));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| AppError::Auth(format!("Login response is not valid JSON: {e}")))?;

    let key = models::find_api_key(&body)
        .ok_or_else(|| AppError::Auth("API key not found in the response".into()))?;
    tracing::info!("Obtained Netdisco API key for {username}");
    Ok(key)
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Cannot build HTTP client: {e}")))
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
