//! Records produced by one pass of the clipboard pipeline.

use serde::Serialize;

use crate::core::mac::{MacAddress, MacNotation};

/// Display value for a location field the inventory service did not resolve.
pub const UNRESOLVED: &str = "Unresolved";

/// Network location reported by the inventory service.
///
/// Every field is independent: a response with IPs but no sightings still
/// resolves the IP fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationInfo {
    pub ip_address: Option<String>,
    pub router_ip: Option<String>,
    pub switch_hostname: Option<String>,
    pub switch_ip: Option<String>,
    pub switch_port: Option<String>,
}

impl LocationInfo {
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// True if at least one field was populated.
    pub fn is_resolved(&self) -> bool {
        [
            &self.ip_address,
            &self.router_ip,
            &self.switch_hostname,
            &self.switch_ip,
            &self.switch_port,
        ]
        .iter()
        .any(|f| f.is_some())
    }

    /// Field value or [`UNRESOLVED`].
    pub fn display(field: &Option<String>) -> &str {
        field.as_deref().unwrap_or(UNRESOLVED)
    }
}

/// One recognized address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacAddressRecord {
    /// The trimmed clipboard line as it was copied.
    pub raw_text: String,
    pub address: MacAddress,
    /// `address` rendered in the notation active when the run was built.
    pub rendered_text: String,
    pub vendor: String,
    pub location: LocationInfo,
}

impl MacAddressRecord {
    pub fn new(raw_text: &str, address: MacAddress, notation: MacNotation, vendor: &str) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            address,
            rendered_text: address.render(notation),
            vendor: vendor.to_string(),
            location: LocationInfo::unresolved(),
        }
    }

    /// True when formatting changed the text the user copied.
    pub fn is_reformatted(&self) -> bool {
        self.rendered_text != self.raw_text
    }
}

/// The records extracted from one clipboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRun {
    pub id: u64,
    pub records: Vec<MacAddressRecord>,
    /// Any record's rendering differs from what was copied.
    pub needs_rewrite: bool,
}

impl PipelineRun {
    pub fn new(id: u64, records: Vec<MacAddressRecord>) -> Self {
        let needs_rewrite = records.iter().any(MacAddressRecord::is_reformatted);
        Self {
            id,
            records,
            needs_rewrite,
        }
    }

    /// Rendered addresses joined with `line_ending`, as written back to the clipboard.
    pub fn rewritten_text(&self, line_ending: &str) -> String {
        self.records
            .iter()
            .map(|r| r.rendered_text.as_str())
            .collect::<Vec<_>>()
            .join(line_ending)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
