//! Background service lifecycle management.
//!
//! `BackgroundServices` owns the clipboard watcher thread and the pipeline
//! task, starting them in dependency order and providing clean shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clipboard::watcher::ClipboardWatcher;
use crate::clipboard::{ClipboardAccess, SystemClipboard};
use crate::commands::AppState;
use crate::config;
use crate::core::pipeline::Pipeline;
use crate::display::DisplaySink;
use crate::error::AppError;

/// Running watcher and pipeline.
///
/// Started in dependency order:
/// 1. Pipeline task (event consumer, owns its own clipboard handle)
/// 2. Clipboard watcher thread (event producer)
pub struct BackgroundServices {
    watcher: Option<ClipboardWatcher>,
    pipeline: Option<JoinHandle<()>>,
}

impl BackgroundServices {
    /// Start against the system clipboard. Must be called inside a tokio runtime.
    pub fn start(state: &AppState, display: Arc<dyn DisplaySink>) -> Result<Self, AppError> {
        Self::start_with(
            SystemClipboard::new()?,
            SystemClipboard::new()?,
            state,
            display,
            Duration::from_millis(config::CLIPBOARD_POLL_INTERVAL_MS),
        )
    }

    /// Start with explicit clipboard handles for the watcher and the pipeline.
    pub fn start_with<W, P>(
        watch: W,
        pipeline_clipboard: P,
        state: &AppState,
        display: Arc<dyn DisplaySink>,
        poll_interval: Duration,
    ) -> Result<Self, AppError>
    where
        W: ClipboardAccess + 'static,
        P: ClipboardAccess + 'static,
    {
        let (tx, rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);

        // 1. Pipeline first so no event is sent into a channel nobody drains.
        let pipeline = Pipeline::new(
            Box::new(pipeline_clipboard),
            Arc::clone(&state.vendors),
            Arc::clone(&state.config),
            Arc::clone(&state.board),
            display,
        )
        .with_enrichment_timeout(state.http_timeout);
        let pipeline = tokio::spawn(pipeline.run(rx));

        // 2. Watcher: dropping `tx` on failure stops the pipeline task.
        let watcher = match ClipboardWatcher::start(watch, poll_interval, tx) {
            Ok(watcher) => watcher,
            Err(e) => {
                pipeline.abort();
                return Err(e);
            }
        };

        Ok(Self {
            watcher: Some(watcher),
            pipeline: Some(pipeline),
        })
    }

    /// Stop the watcher, then let the pipeline drain and finish enrichment.
    pub async fn shutdown(mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            // Joining sleeps up to one poll interval.
            let joined = tokio::task::spawn_blocking(move || watcher.stop()).await;
            if let Err(e) = joined {
                tracing::warn!("Clipboard watcher shutdown failed: {e}");
            }
        }
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.await {
                tracing::warn!("Pipeline task ended abnormally: {e}");
            }
        }
        tracing::info!("Background services stopped");
    }
}
