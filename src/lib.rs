pub mod clipboard;
pub mod commands;
pub mod config;
pub mod core;
pub mod db;
pub mod display;
pub mod enrichment;
pub mod error;
pub mod services;
pub mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use commands::AppState;
use crate::core::pipeline::RunBoard;
use crate::core::vendor::VendorTable;
use display::{DisplaySink, LogDisplay};
use settings::{ConfigContext, MemoryStore, SettingsStore};

/// Run the clipboard monitor until Ctrl-C.
///
/// Fails only on startup errors: no clipboard, unusable vendor dataset, or an
/// invalid environment override.
pub fn run() -> anyhow::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in macclip: {info}");
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config::DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Arc::new(ConfigContext::new(open_settings_store()).context("Failed to load settings")?);

    let mut settings = config.snapshot();
    settings
        .apply_env_overrides()
        .context("Invalid environment override")?;
    if settings != config.snapshot() {
        config.update(|s| *s = settings)?;
    }

    let settings = config.snapshot();
    let installed = app_data_dir().map(|dir| dir.join(config::VENDOR_FILE_NAME));
    let vendors = VendorTable::resolve(settings.vendor_dataset.as_deref(), installed.as_deref())
        .context("Vendor dataset unavailable")?;

    let state = AppState::new(config, Arc::new(RunBoard::new()), Arc::new(vendors));
    let display: Arc<dyn DisplaySink> = Arc::new(LogDisplay);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(serve(state, display))
}

async fn serve(state: AppState, display: Arc<dyn DisplaySink>) -> anyhow::Result<()> {
    let env_login = match commands::system::apply_env_credentials(&state).await {
        Ok(applied) => applied,
        Err(e) => {
            tracing::warn!("Netdisco environment credentials rejected: {e}");
            false
        }
    };
    if env_login {
        tracing::info!("Netdisco configured from environment");
    } else {
        match commands::system::ensure_api_key(&state).await {
            Ok(true) => {}
            Ok(false) => tracing::info!("Netdisco not configured; vendor lookup only"),
            Err(e) => {
                tracing::warn!("Netdisco login failed: {e}");
                display.notify("Netdisco Login Failed", &e.to_string());
            }
        }
    }

    let services = services::BackgroundServices::start(&state, Arc::clone(&display))
        .context("Failed to start clipboard monitoring")?;
    display.notify(
        "MAC Address Monitor",
        &format!(
            "Watching the clipboard ({})",
            commands::system::get_notation(&state).label()
        ),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");
    services.shutdown().await;

    if let Ok(path) = std::env::var(config::ENV_EXPORT_CSV) {
        if let Err(e) = commands::records::export_records(&state, Path::new(&path)) {
            tracing::warn!("CSV export skipped: {e}");
        }
    }
    Ok(())
}

/// SQLite settings under the user data directory, or memory if that fails.
fn open_settings_store() -> Arc<dyn SettingsStore> {
    match open_database() {
        Ok(database) => Arc::new(database),
        Err(e) => {
            tracing::warn!("Settings database unavailable ({e:#}); settings will not persist");
            Arc::new(MemoryStore::default())
        }
    }
}

fn open_database() -> anyhow::Result<db::Database> {
    let app_data_dir = app_data_dir().context("No user data directory")?;
    std::fs::create_dir_all(&app_data_dir)?;
    let db_path = app_data_dir.join(config::SETTINGS_DB_FILE);
    let database = db::Database::open(&db_path)?;
    tracing::info!("Database opened at {}", db_path.display());
    Ok(database)
}

fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(config::APP_DIR_NAME))
}
