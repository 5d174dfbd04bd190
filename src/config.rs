//! Centralized runtime constants for macclip.
//!
//! All tunable intervals, timeouts, and names are collected here so they can
//! be found and adjusted in a single place rather than scattered across modules.

/// Interval at which the clipboard watcher samples the clipboard for changes (milliseconds).
pub const CLIPBOARD_POLL_INTERVAL_MS: u64 = 250;

/// Timeout applied to every request against the inventory service (seconds).
pub const ENRICHMENT_TIMEOUT_SECS: u64 = 10;

/// Capacity of the watcher → pipeline event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Folder created under the user data directory.
pub const APP_DIR_NAME: &str = "MACAddressMonitor";

/// SQLite file holding persisted settings.
pub const SETTINGS_DB_FILE: &str = "macclip.db";

/// Wireshark `manuf` export picked up from the data folder when present.
pub const VENDOR_FILE_NAME: &str = "manuf.txt";

/// Default tracing filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "macclip=info,macclip_lib=info";

/// Line separator used when the reformatted addresses are written back.
#[cfg(target_os = "windows")]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(target_os = "windows"))]
pub const LINE_ENDING: &str = "\n";

// ---- Environment overrides applied at startup ----

pub const ENV_NOTATION: &str = "MACCLIP_NOTATION";
pub const ENV_NETDISCO_URL: &str = "MACCLIP_NETDISCO_URL";
pub const ENV_NETDISCO_USERNAME: &str = "MACCLIP_NETDISCO_USERNAME";
pub const ENV_NETDISCO_PASSWORD: &str = "MACCLIP_NETDISCO_PASSWORD";
pub const ENV_VENDOR_FILE: &str = "MACCLIP_VENDOR_FILE";
/// When set, the last published run is exported to this CSV path on shutdown.
pub const ENV_EXPORT_CSV: &str = "MACCLIP_EXPORT_CSV";
