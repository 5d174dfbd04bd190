//! Clipboard change detection.
//!
//! A dedicated thread samples the clipboard every
//! [`CLIPBOARD_POLL_INTERVAL_MS`](crate::config::CLIPBOARD_POLL_INTERVAL_MS)
//! and sends one [`ClipboardEvent`] per observed change. The event carries no
//! content: the pipeline re-reads the clipboard itself.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use super::ClipboardAccess;
use crate::error::AppError;

/// "The clipboard changed." Sent once per observed update.
#[derive(Debug, Clone, Copy)]
pub struct ClipboardEvent {
    pub observed_at: Instant,
}

/// Tracks the last seen clipboard content by fingerprint.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<u64>,
}

impl ChangeDetector {
    /// Detector primed with the current content, which is not a change.
    pub fn primed(content: Option<&str>) -> Self {
        Self {
            last: content.map(fingerprint),
        }
    }

    /// Record `content`; true if it differs from the previous observation.
    pub fn observe(&mut self, content: Option<&str>) -> bool {
        let next = content.map(fingerprint);
        if next == self.last {
            return false;
        }
        self.last = next;
        true
    }
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Owns the watcher thread. Dropping it stops the thread and releases the
/// clipboard handle.
pub struct ClipboardWatcher {
    shutdown: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ClipboardWatcher {
    /// Start watching through `source`.
    ///
    /// The initial read primes change detection; failing it (or failing to
    /// spawn the thread) is a startup error.
    pub fn start<C>(
        mut source: C,
        interval: Duration,
        events: mpsc::Sender<ClipboardEvent>,
    ) -> Result<Self, AppError>
    where
        C: ClipboardAccess + 'static,
    {
        let initial = source.read_text()?;
        let mut detector = ChangeDetector::primed(initial.as_deref());

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let thread = std::thread::Builder::new()
            .name("clipboard-watcher".into())
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    std::thread::sleep(interval);

                    let content = match source.read_text() {
                        Ok(content) => content,
                        Err(e) => {
                            tracing::trace!("Clipboard busy, retrying next tick: {e}");
                            continue;
                        }
                    };
                    if !detector.observe(content.as_deref()) {
                        continue;
                    }

                    let event = ClipboardEvent {
                        observed_at: Instant::now(),
                    };
                    if events.blocking_send(event).is_err() {
                        tracing::debug!("Clipboard event receiver closed; watcher exiting");
                        break;
                    }
                }
            })
            .map_err(|e| AppError::Clipboard(format!("Failed to spawn clipboard watcher: {e}")))?;

        tracing::info!("Clipboard watcher started ({}ms interval)", interval.as_millis());
        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    /// Ask the thread to exit and wait for it.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Clipboard watcher thread panicked");
            }
            tracing::info!("Clipboard watcher stopped");
        }
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
