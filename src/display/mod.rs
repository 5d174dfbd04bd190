//! Display collaborator: where finished runs and passive notifications go.
//!
//! The core never depends on a UI toolkit. A host implements [`DisplaySink`];
//! the binary uses [`LogDisplay`], which writes everything through `tracing`.

use std::path::Path;

use crate::core::record::{LocationInfo, MacAddressRecord};
use crate::error::AppError;

pub const CSV_HEADER: &str = "MacAddress,Vendor,AssociatedIP,SwitchHostname,SwitchIP,SwitchPort";

/// Receives the records of each completed run and user-facing notices.
pub trait DisplaySink: Send + Sync {
    /// Replace the displayed records.
    ///
    /// May read the run board, but must not publish to it.
    fn populate(&self, records: &[MacAddressRecord]);

    /// Passive notification (tray balloon, toast, log line).
    fn notify(&self, title: &str, message: &str);
}

/// Sink that logs runs and notices.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn populate(&self, records: &[MacAddressRecord]) {
        for r in records {
            tracing::info!(
                "{}  {}  ip={} switch={} port={}",
                r.rendered_text,
                r.vendor,
                LocationInfo::display(&r.location.ip_address),
                LocationInfo::display(&r.location.switch_hostname),
                LocationInfo::display(&r.location.switch_port),
            );
        }
    }

    fn notify(&self, title: &str, message: &str) {
        tracing::info!("[{title}] {message}");
    }
}

// ---- CSV export ----

/// Render `records` as CSV, header first, one line per record.
pub fn export_csv(records: &[MacAddressRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in records {
        let loc = &r.location;
        let fields = [
            r.rendered_text.as_str(),
            r.vendor.as_str(),
            LocationInfo::display(&loc.ip_address),
            LocationInfo::display(&loc.switch_hostname),
            LocationInfo::display(&loc.switch_ip),
            LocationInfo::display(&loc.switch_port),
        ];
        let line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Write the CSV export to `path`. Returns the number of records written.
pub fn write_csv(path: &Path, records: &[MacAddressRecord]) -> Result<usize, AppError> {
    std::fs::write(path, export_csv(records))
        .map_err(|e| AppError::Io(format!("Cannot write {}: {e}", path.display())))?;
    tracing::info!("Exported {} record(s) to {}", records.len(), path.display());
    Ok(records.len())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Sink that keeps everything it receives, for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingDisplay {
    pub populated: std::sync::Mutex<Vec<Vec<MacAddressRecord>>>,
    pub notices: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingDisplay {
    pub(crate) fn last(&self) -> Option<Vec<MacAddressRecord>> {
        self.populated.lock().unwrap().last().cloned()
    }

    pub(crate) fn populate_count(&self) -> usize {
        self.populated.lock().unwrap().len()
    }

    pub(crate) fn notice_titles(&self) -> Vec<String> {
        self.notices.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[cfg(test)]
impl DisplaySink for RecordingDisplay {
    fn populate(&self, records: &[MacAddressRecord]) {
        self.populated.lock().unwrap().push(records.to_vec());
    }

    fn notify(&self, title: &str, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
