//! Pure validation functions extracted from the command handlers.
//!
//! These take plain parameters (no shared state) and can be unit-tested
//! without a runtime or a clipboard.

use crate::core::mac::{MacAddress, MacNotation};
use crate::error::AppError;

/// Netdisco credentials taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCredentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// Trim, require an http(s) scheme and a host, drop trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(AppError::InvalidInput("Netdisco API URL is empty".into()));
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Netdisco API URL '{url}' must start with http:// or https://"))
        })?;
    if rest.is_empty() || rest.starts_with('/') || rest.contains(char::is_whitespace) {
        return Err(AppError::InvalidInput(format!("Netdisco API URL '{url}' has no valid host")));
    }
    Ok(url.to_string())
}

/// Username must be non-blank; password must be non-empty.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(AppError::InvalidInput("Username is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("Password is required".into()));
    }
    Ok(())
}

pub fn parse_notation(text: &str) -> Result<MacNotation, AppError> {
    text.parse()
}

/// Address typed by the user, in any notation or as bare hex.
pub fn parse_address(text: &str) -> Result<MacAddress, AppError> {
    MacAddress::parse(text.trim())
}

/// Credentials when all three variables are set and non-empty.
pub fn credentials_from_env<F>(get: F, keys: [&str; 3]) -> Option<EnvCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let [url, user, pass] = keys.map(|k| get(k).filter(|v| !v.trim().is_empty()));
    Some(EnvCredentials {
        base_url: url?,
        username: user?,
        password: pass?,
    })
}
