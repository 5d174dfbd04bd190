//! Explicit configuration context shared by the pipeline and the host commands.
//!
//! `ConfigContext` owns the current [`AppSettings`] and a generation counter.
//! Every change goes through [`ConfigContext::update`] or
//! [`ConfigContext::reload`], both of which bump the generation so consumers
//! (the pipeline's enrichment client) know to rebuild.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::config;
use crate::core::mac::MacNotation;
use crate::error::AppError;

/// Inventory (Netdisco) connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    pub base_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Token returned by the last successful login.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl EnrichmentSettings {
    /// URL and credentials are all present.
    pub fn has_credentials(&self) -> bool {
        !self.base_url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    /// URL and token are present, so lookups can be issued.
    pub fn is_ready(&self) -> bool {
        !self.base_url.is_empty() && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Everything the user can configure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub notation: MacNotation,
    pub enrichment: EnrichmentSettings,
    /// Replaces the bundled vendor dataset when set.
    pub vendor_dataset: Option<PathBuf>,
}

impl AppSettings {
    /// Apply `MACCLIP_*` environment overrides for fields that need no network.
    ///
    /// Credentials are handled by the host commands since they require a login.
    pub fn apply_env_overrides(&mut self) -> Result<(), AppError> {
        if let Ok(value) = std::env::var(config::ENV_NOTATION) {
            self.notation = value.parse()?;
        }
        if let Ok(value) = std::env::var(config::ENV_VENDOR_FILE) {
            if !value.trim().is_empty() {
                self.vendor_dataset = Some(PathBuf::from(value));
            }
        }
        Ok(())
    }
}

/// Persistence for [`AppSettings`].
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<AppSettings, AppError>;
    fn save(&self, settings: &AppSettings) -> Result<(), AppError>;
}

/// Non-persistent store used when the settings database is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<AppSettings>,
}

impl MemoryStore {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<AppSettings, AppError> {
        Ok(self.settings.lock().unwrap().clone())
    }

    fn save(&self, settings: &AppSettings) -> Result<(), AppError> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

/// Current settings plus the store they came from.
pub struct ConfigContext {
    store: Arc<dyn SettingsStore>,
    current: RwLock<AppSettings>,
    generation: AtomicU64,
}

impl ConfigContext {
    /// Load settings from `store`.
    pub fn new(store: Arc<dyn SettingsStore>) -> Result<Self, AppError> {
        let current = store.load()?;
        Ok(Self {
            store,
            current: RwLock::new(current),
            generation: AtomicU64::new(0),
        })
    }

    /// Context over an in-memory store seeded with `settings`.
    pub fn in_memory(settings: AppSettings) -> Self {
        Self {
            current: RwLock::new(settings.clone()),
            store: Arc::new(MemoryStore::new(settings)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> AppSettings {
        self.current.read().unwrap().clone()
    }

    pub fn notation(&self) -> MacNotation {
        self.current.read().unwrap().notation
    }

    pub fn enrichment(&self) -> EnrichmentSettings {
        self.current.read().unwrap().enrichment.clone()
    }

    /// Incremented on every update or reload.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Apply `change`, persist the result, and bump the generation.
    ///
    /// The in-memory settings are only replaced once the store accepted them.
    pub fn update<F>(&self, change: F) -> Result<AppSettings, AppError>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut guard = self.current.write().unwrap();
        let mut next = guard.clone();
        change(&mut next);
        self.store.save(&next)?;
        *guard = next.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(next)
    }

    /// Re-read settings from the store.
    pub fn reload(&self) -> Result<AppSettings, AppError> {
        let fresh = self.store.load()?;
        *self.current.write().unwrap() = fresh.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);
        tracing::info!("Settings reloaded");
        Ok(fresh)
    }
}
