//! `SettingsStore` implementation over the settings table.

use std::path::PathBuf;

use crate::error::AppError;
use crate::settings::{AppSettings, EnrichmentSettings, SettingsStore};

use super::Database;

const KEY_MAC_FORMAT: &str = "mac_format";
const KEY_API_URL: &str = "netdisco_api_url";
const KEY_USERNAME: &str = "netdisco_username";
const KEY_PASSWORD: &str = "netdisco_password";
const KEY_API_KEY: &str = "netdisco_api_key";
const KEY_VENDOR_DATASET: &str = "vendor_dataset";

impl SettingsStore for Database {
    fn load(&self) -> Result<AppSettings, AppError> {
        let notation = match self.get_setting(KEY_MAC_FORMAT)? {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored MAC format: {e}");
                Default::default()
            }),
            None => Default::default(),
        };

        Ok(AppSettings {
            notation,
            enrichment: EnrichmentSettings {
                base_url: self.get_setting(KEY_API_URL)?.unwrap_or_default(),
                username: self.get_setting(KEY_USERNAME)?.unwrap_or_default(),
                password: self.get_setting(KEY_PASSWORD)?.unwrap_or_default(),
                api_key: self.get_setting(KEY_API_KEY)?.filter(|k| !k.is_empty()),
            },
            vendor_dataset: self.get_setting(KEY_VENDOR_DATASET)?.map(PathBuf::from),
        })
    }

    fn save(&self, settings: &AppSettings) -> Result<(), AppError> {
        let vendor_dataset = settings
            .vendor_dataset
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let e = &settings.enrichment;

        self.write_settings(&[
            (KEY_MAC_FORMAT, Some(settings.notation.as_str())),
            (KEY_API_URL, Some(e.base_url.as_str())),
            (KEY_USERNAME, Some(e.username.as_str())),
            (KEY_PASSWORD, Some(e.password.as_str())),
            (KEY_API_KEY, e.api_key.as_deref()),
            (KEY_VENDOR_DATASET, vendor_dataset.as_deref()),
        ])?;
        Ok(())
    }
}
