//! Access to the shared system clipboard.
//!
//! - [`ClipboardAccess`]: read/write text; the pipeline and the watcher only
//!   talk to the clipboard through this trait.
//! - [`SystemClipboard`]: `arboard`-backed implementation. Each call opens
//!   and closes the OS clipboard internally, so access is never left open on
//!   an error path.
//! - [`watcher`]: change detection feeding the pipeline.

pub mod watcher;

use crate::error::AppError;

/// Text access to a clipboard.
///
/// `read_text` returns `Ok(None)` when the clipboard holds no text (an image,
/// files, or nothing). Errors mean the clipboard was busy or unavailable and
/// the caller should skip this operation.
pub trait ClipboardAccess: Send {
    fn read_text(&mut self) -> Result<Option<String>, AppError>;
    fn write_text(&mut self, text: &str) -> Result<(), AppError>;
}

/// The operating system clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    /// Connect to the system clipboard. Fails when no clipboard is reachable
    /// (e.g. no display server).
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl ClipboardAccess for SystemClipboard {
    fn read_text(&mut self) -> Result<Option<String>, AppError> {
        clipboard_text(self.inner.get_text())
    }

    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        Ok(self.inner.set_text(text)?)
    }
}

/// Non-text and empty content read as `None`.
fn clipboard_text(result: Result<String, arboard::Error>) -> Result<Option<String>, AppError> {
    match result {
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        other => Ok(Some(other?).filter(|text| !text.is_empty())),
    }
}

/// Shared in-memory clipboard for tests. Clones see the same content.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemoryClipboard {
    state: std::sync::Arc<std::sync::Mutex<MemoryClipboardState>>,
}

#[cfg(test)]
#[derive(Default)]
struct MemoryClipboardState {
    text: Option<String>,
    writes: Vec<String>,
    busy: bool,
}

#[cfg(test)]
impl MemoryClipboard {
    pub(crate) fn with_text(text: &str) -> Self {
        let clipboard = Self::default();
        clipboard.set(text);
        clipboard
    }

    /// Simulate another application copying `text`.
    pub(crate) fn set(&self, text: &str) {
        self.state.lock().unwrap().text = Some(text.to_string());
    }

    pub(crate) fn text(&self) -> Option<String> {
        self.state.lock().unwrap().text.clone()
    }

    /// Texts written through `ClipboardAccess::write_text`.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.state.lock().unwrap().busy = busy;
    }
}

#[cfg(test)]
impl ClipboardAccess for MemoryClipboard {
    fn read_text(&mut self) -> Result<Option<String>, AppError> {
        let state = self.state.lock().unwrap();
        if state.busy {
            return Err(AppError::Clipboard("clipboard is occupied".into()));
        }
        Ok(state.text.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if state.busy {
            return Err(AppError::Clipboard("clipboard is occupied".into()));
        }
        state.text = Some(text.to_string());
        state.writes.push(text.to_string());
        Ok(())
    }
}
