//! Notation preference, Netdisco credentials and settings reload.

use crate::config;
use crate::core::mac::MacNotation;
use crate::enrichment::EnrichmentClient;
use crate::error::AppError;
use crate::settings::AppSettings;

use super::logic::{credentials_from_env, normalize_base_url, parse_notation, validate_credentials};
use super::state::AppState;

// ---- Notation ----

pub fn set_notation(state: &AppState, text: &str) -> Result<MacNotation, AppError> {
    let notation = parse_notation(text)?;
    state.config.update(|s| s.notation = notation)?;
    tracing::info!("MAC notation set to {}", notation.label());
    Ok(notation)
}

pub fn get_notation(state: &AppState) -> MacNotation {
    state.config.notation()
}

// ---- Netdisco ----

/// Validate, log in, and persist the URL, credentials and token.
///
/// Nothing is saved unless the login succeeds.
pub async fn configure_enrichment(
    state: &AppState,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<(), AppError> {
    let base_url = normalize_base_url(base_url)?;
    validate_credentials(username, password)?;

    let api_key = EnrichmentClient::authenticate(&base_url, username, password, state.http_timeout).await?;

    state.config.update(|s| {
        s.enrichment.base_url = base_url.clone();
        s.enrichment.username = username.trim().to_string();
        s.enrichment.password = password.to_string();
        s.enrichment.api_key = Some(api_key);
    })?;
    tracing::info!("Netdisco configured at {base_url}");
    Ok(())
}

/// Log in at startup so a token left over from an earlier session is replaced.
///
/// Without stored credentials the stored token, if any, is kept as is.
/// Returns whether a token is available afterwards.
pub async fn ensure_api_key(state: &AppState) -> Result<bool, AppError> {
    let settings = state.config.enrichment();
    if !settings.has_credentials() {
        return Ok(settings.is_ready());
    }

    let api_key = EnrichmentClient::authenticate(
        &settings.base_url,
        &settings.username,
        &settings.password,
        state.http_timeout,
    )
    .await?;
    state.config.update(|s| s.enrichment.api_key = Some(api_key))?;
    Ok(true)
}

/// Configure Netdisco from `MACCLIP_NETDISCO_*` when all three are set.
///
/// Returns false when the environment does not provide credentials.
pub async fn apply_env_credentials(state: &AppState) -> Result<bool, AppError> {
    let keys = [
        config::ENV_NETDISCO_URL,
        config::ENV_NETDISCO_USERNAME,
        config::ENV_NETDISCO_PASSWORD,
    ];
    let Some(creds) = credentials_from_env(|k| std::env::var(k).ok(), keys) else {
        return Ok(false);
    };
    configure_enrichment(state, &creds.base_url, &creds.username, &creds.password).await?;
    Ok(true)
}

pub fn reload_settings(state: &AppState) -> Result<AppSettings, AppError> {
    state.config.reload()
}

/// Lookups will be issued for the next run.
pub fn enrichment_enabled(state: &AppState) -> bool {
    state.config.enrichment().is_ready()
}
