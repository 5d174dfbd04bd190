//! Vendor prefix table built from a Wireshark `manuf`-style dataset.
//!
//! The table is immutable after load. Lookups try the most specific prefix
//! length first (36-bit, then 28-bit, then 24-bit OUI) against a single map.

use std::collections::HashMap;
use std::path::Path;

use crate::core::mac::{canonicalize, MacAddress};
use crate::error::AppError;

/// Returned when no prefix matches.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Prefix lengths in hex digits, tried in order.
const PREFIX_LENGTHS: [usize; 3] = [9, 7, 6];

/// Dataset compiled into the binary.
const BUNDLED_DATASET: &str = include_str!("../../data/manuf.txt");

/// Prefix → vendor full name.
#[derive(Debug, Default)]
pub struct VendorTable {
    entries: HashMap<String, String>,
}

impl VendorTable {
    /// Parse tab-separated `prefix\tshort\tfull[...]` records.
    ///
    /// Blank lines, `#` comments, records with fewer than three fields and
    /// prefixes that do not reduce to 6, 7 or 9 hex digits are skipped.
    /// Later records override earlier ones for the same key.
    pub fn load(dataset: &str) -> Self {
        let mut entries = HashMap::new();
        let mut skipped = 0usize;

        for line in dataset.lines() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').filter(|f| !f.is_empty()).collect();
            if fields.len() < 3 {
                skipped += 1;
                continue;
            }
            match prefix_key(fields[0].trim()) {
                Some(key) => {
                    entries.insert(key, fields[2].trim().to_string());
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {skipped} malformed vendor records");
        }
        Self { entries }
    }

    /// Load the dataset bundled with the binary.
    pub fn bundled() -> Result<Self, AppError> {
        Self::non_empty(Self::load(BUNDLED_DATASET), "bundled dataset")
    }

    /// Load a user-supplied dataset file. Unreadable or empty files are errors.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::VendorData(format!("Cannot read vendor dataset {}: {e}", path.display()))
        })?;
        Self::non_empty(Self::load(&text), &path.display().to_string())
    }

    /// Pick the dataset: the configured override, else a `manuf` file
    /// installed in the data directory, else the bundled one.
    ///
    /// A broken override is an error. A broken installed file is skipped.
    pub fn resolve(override_path: Option<&Path>, installed: Option<&Path>) -> Result<Self, AppError> {
        let table = match (override_path, installed) {
            (Some(path), _) => Self::from_path(path)?,
            (None, Some(path)) if path.is_file() => Self::from_path(path).or_else(|e| {
                tracing::warn!("Ignoring installed vendor dataset: {e}");
                Self::bundled()
            })?,
            _ => Self::bundled()?,
        };
        tracing::info!("Loaded {} vendor prefixes", table.len());
        Ok(table)
    }

    fn non_empty(table: Self, source: &str) -> Result<Self, AppError> {
        if table.is_empty() {
            return Err(AppError::VendorData(format!(
                "Vendor dataset {source} contains no usable records"
            )));
        }
        Ok(table)
    }

    /// Vendor for an address, or [`UNKNOWN_VENDOR`].
    pub fn lookup(&self, mac: &MacAddress) -> &str {
        self.lookup_canonical(&mac.canonical())
    }

    /// Vendor for canonical (or canonicalizable) address text.
    pub fn lookup_canonical(&self, address: &str) -> &str {
        let canonical = canonicalize(address);
        PREFIX_LENGTHS
            .iter()
            .find_map(|&len| canonical.get(..len).and_then(|prefix| self.entries.get(prefix)))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_VENDOR)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical map key for a dataset prefix field.
///
/// Handles the `/bits` suffix of extended registrations, e.g.
/// `00:1B:C5:00:00:00/36` → `001BC5000`.
fn prefix_key(field: &str) -> Option<String> {
    let (prefix, mask) = match field.split_once('/') {
        Some((prefix, bits)) => (prefix, Some(bits.trim().parse::<usize>().ok()?)),
        None => (field, None),
    };
    let canonical = canonicalize(prefix);
    if !canonical.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let key = match mask {
        Some(bits) if bits % 4 == 0 && bits / 4 <= canonical.len() => canonical[..bits / 4].to_string(),
        Some(_) => return None,
        None => canonical,
    };
    PREFIX_LENGTHS.contains(&key.len()).then_some(key)
}
