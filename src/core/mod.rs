//! Core logic: address parsing and rendering, vendor lookup, pipeline runs.
//!
//! - [`mac`]: notation-independent addresses and the line parser
//! - [`vendor`]: prefix table with longest-prefix-first lookup
//! - [`record`]: per-address records and the runs that group them
//! - [`pipeline`]: loop guard, run board and the clipboard pipeline

pub mod mac;
pub mod pipeline;
pub mod record;
pub mod vendor;

pub use mac::{MacAddress, MacNotation};
pub use pipeline::{Pipeline, RunBoard, RunOutcome};
pub use record::{LocationInfo, MacAddressRecord, PipelineRun};
pub use vendor::VendorTable;
