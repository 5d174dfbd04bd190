//! Shared application state handed to every command.

use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::core::pipeline::RunBoard;
use crate::core::vendor::VendorTable;
use crate::settings::ConfigContext;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigContext>,
    /// Latest published run, shared with the pipeline.
    pub board: Arc<RunBoard>,
    pub vendors: Arc<VendorTable>,
    /// Timeout for login requests issued by commands.
    pub http_timeout: Duration,
}

impl AppState {
    pub fn new(config: Arc<ConfigContext>, board: Arc<RunBoard>, vendors: Arc<VendorTable>) -> Self {
        Self {
            config,
            board,
            vendors,
            http_timeout: Duration::from_secs(config::ENRICHMENT_TIMEOUT_SECS),
        }
    }
}
