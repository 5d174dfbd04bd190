//! Unified error type for the clipboard pipeline and the host command surface.
//!
//! `AppError` is returned by every fallible public operation. It serializes as
//! `{ "kind": "...", "message": "..." }` so a UI host can programmatically
//! distinguish error categories.

use serde::ser::SerializeStruct;

/// Application-level error.
///
/// Each variant maps to a distinct failure domain. Per-item failures (vendor
/// misses, enrichment misses) never surface as an `AppError`; they degrade to
/// "Unknown" / unresolved at the component boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The system clipboard could not be opened, read or written.
    #[error("{0}")]
    Clipboard(String),

    /// Missing or invalid configuration (inventory URL, credentials, token).
    #[error("{0}")]
    Config(String),

    /// Login against the inventory service failed.
    #[error("{0}")]
    Auth(String),

    /// A request to the inventory service failed as a whole.
    #[error("{0}")]
    Enrichment(String),

    /// The vendor prefix dataset is missing, unreadable or empty.
    #[error("{0}")]
    VendorData(String),

    /// Errors originating from SQLite / settings persistence.
    #[error("{0}")]
    Database(String),

    /// I/O and OS-level errors (filesystem, export files).
    #[error("{0}")]
    Io(String),

    /// Invalid or missing user input.
    #[error("{0}")]
    InvalidInput(String),
}

impl AppError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Clipboard(_) => "Clipboard",
            AppError::Config(_) => "Config",
            AppError::Auth(_) => "Auth",
            AppError::Enrichment(_) => "Enrichment",
            AppError::VendorData(_) => "VendorData",
            AppError::Database(_) => "Database",
            AppError::Io(_) => "Io",
            AppError::InvalidInput(_) => "InvalidInput",
        }
    }
}

/// Custom Serialize: produces `{ "kind": "Variant", "message": "..." }` for the host.
impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

// ---- From implementations for ergonomic error conversion ----

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(format!("{err:#}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Enrichment(format!("request timed out: {err}"))
        } else {
            AppError::Enrichment(err.to_string())
        }
    }
}

impl From<arboard::Error> for AppError {
    fn from(err: arboard::Error) -> Self {
        AppError::Clipboard(format!("Clipboard error: {err}"))
    }
}
