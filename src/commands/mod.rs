//! Host command handlers, organized by functional domain.
//!
//! - `records`: displayed records, CSV export, ad-hoc vendor lookup
//! - `system`: notation, Netdisco credentials, settings reload
//! - `logic`: Pure validation functions (unit-testable)
//! - `state`: Shared `AppState` definition
//!
//! Handlers are plain functions over `&AppState` so any host (tray, CLI,
//! webview) can call them.

mod logic;
pub mod records;
mod state;
pub mod system;

pub use state::AppState;
