//! Displayed records, CSV export and manual vendor lookup.

use std::path::Path;

use crate::core::record::MacAddressRecord;
use crate::display;
use crate::error::AppError;

use super::logic::parse_address;
use super::state::AppState;

/// Records of the most recent run.
pub fn get_records(state: &AppState) -> Vec<MacAddressRecord> {
    state.board.latest_records()
}

/// Export the displayed records as CSV. Returns the number of records written.
pub fn export_records(state: &AppState, path: &Path) -> Result<usize, AppError> {
    let records = state.board.latest_records();
    if records.is_empty() {
        return Err(AppError::InvalidInput("There are no records to export".into()));
    }
    display::write_csv(path, &records)
}

/// Vendor for a typed address.
pub fn lookup_vendor(state: &AppState, text: &str) -> Result<String, AppError> {
    let address = parse_address(text)?;
    Ok(state.vendors.lookup(&address).to_string())
}
