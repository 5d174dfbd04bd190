//! MAC address recognition, canonicalization and rendering.
//!
//! Recognized notations (case-insensitive, whole line):
//! - six pairs separated by `:` or `-` (`AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff`)
//! - three quads separated by `.` (`AABB.CCDD.EEFF`)
//!
//! The canonical form is 12 uppercase hex digits with no separators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Textual rendering of a canonical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacNotation {
    /// Dot-grouped quads: `AABB.CCDD.EEFF`
    #[default]
    Cisco,
    /// Colon-separated pairs: `AA:BB:CC:DD:EE:FF`
    Colon,
    /// Hyphen-separated pairs: `AA-BB-CC-DD-EE-FF`
    Hyphen,
}

impl MacNotation {
    pub const ALL: [MacNotation; 3] = [MacNotation::Cisco, MacNotation::Colon, MacNotation::Hyphen];

    /// Stable identifier used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cisco => "cisco",
            Self::Colon => "colon",
            Self::Hyphen => "hyphen",
        }
    }

    /// Human-readable label for menus and notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cisco => "Cisco Notation",
            Self::Colon => "Colon Separated",
            Self::Hyphen => "Hyphen Separated",
        }
    }

    /// Digits per group and the separator between groups.
    fn grouping(self) -> (usize, char) {
        match self {
            Self::Cisco => (4, '.'),
            Self::Colon => (2, ':'),
            Self::Hyphen => (2, '-'),
        }
    }
}

impl fmt::Display for MacNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MacNotation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cisco" | "dot" | "cisconotation" | "cisco notation" => Ok(Self::Cisco),
            "colon" | "colonseparated" | "colon separated" => Ok(Self::Colon),
            "hyphen" | "dash" | "hyphenseparated" | "hyphen separated" => Ok(Self::Hyphen),
            other => Err(AppError::InvalidInput(format!(
                "Unknown MAC notation '{other}' (expected cisco, colon or hyphen)"
            ))),
        }
    }
}

/// A 48-bit hardware address. Equality is by value, independent of notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Parse any token whose canonical form is exactly 12 hex digits.
    ///
    /// This is looser than [`is_mac_address`]: separators are simply stripped,
    /// so it also accepts bare hex. Use the recognizer to decide *whether* a
    /// clipboard line is an address, and this to obtain its value.
    pub fn parse(token: &str) -> Result<Self, AppError> {
        let canonical = canonicalize(token);
        if canonical.len() != 12 || !canonical.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::InvalidInput(format!(
                "'{token}' is not a 12-digit hardware address"
            )));
        }
        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&canonical[i * 2..i * 2 + 2], 16)
                .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// 12 uppercase hex digits, no separators.
    pub fn canonical(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Render in the given notation.
    pub fn render(&self, notation: MacNotation) -> String {
        render(&self.canonical(), notation)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for MacAddress {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.canonical())
    }
}

/// Strip `.`, `:` and `-` and upper-case. Shared with vendor prefix keys.
pub fn canonicalize(token: &str) -> String {
    token
        .chars()
        .filter(|c| !matches!(c, '.' | ':' | '-'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Group canonical digits per notation. Input must be canonical.
pub fn render(canonical: &str, notation: MacNotation) -> String {
    let (group, sep) = notation.grouping();
    let mut out = String::with_capacity(canonical.len() + canonical.len() / group);
    for (i, c) in canonical.chars().enumerate() {
        if i > 0 && i % group == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// True when the whole (already trimmed) line is a MAC address in a
/// recognized notation.
pub fn is_mac_address(line: &str) -> bool {
    let b = line.as_bytes();
    match b.len() {
        // XX?XX?XX?XX?XX?XX where ? is ':' or '-'
        17 => b.iter().enumerate().all(|(i, &c)| {
            if i % 3 == 2 {
                c == b':' || c == b'-'
            } else {
                c.is_ascii_hexdigit()
            }
        }),
        // XXXX.XXXX.XXXX
        14 => b.iter().enumerate().all(|(i, &c)| {
            if i == 4 || i == 9 {
                c == b'.'
            } else {
                c.is_ascii_hexdigit()
            }
        }),
        _ => false,
    }
}

/// Split clipboard text into lines and keep the trimmed ones that are MAC
/// addresses, in original order. Duplicates are kept.
pub fn extract_mac_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty() && is_mac_address(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [&str; 4] = ["AABBCCDDEEFF", "000000000000", "FFFFFFFFFFFF", "0123456789AB"];

    #[test]
    fn test_parser_accepts_supported_notations() {
        assert!(is_mac_address("AA:BB:CC:DD:EE:FF"));
        assert!(is_mac_address("aa-bb-cc-dd-ee-ff"));
        assert!(is_mac_address("AABB.CCDD.EEFF"));
        assert!(is_mac_address("aabb.ccdd.eeff"));
        // Colons and hyphens may be mixed within one token.
        assert!(is_mac_address("AA:BB-CC:DD-EE:FF"));
        assert_eq!(
            MacAddress::parse("AA:BB-CC:DD-EE:FF").unwrap().canonical(),
            "AABBCCDDEEFF"
        );
    }

    #[test]
    fn test_parser_rejects_malformed_tokens() {
        assert!(!is_mac_address("AA:BB:CC:DD:EE"));
        assert!(!is_mac_address("AABBCCDDEEFF"));
        assert!(!is_mac_address("GG:BB:CC:DD:EE:FF"));
        assert!(!is_mac_address("AABB:CCDD:EEFF"));
        assert!(!is_mac_address("AA.BB.CC.DD.EE.FF"));
        assert!(!is_mac_address(""));
    }

    #[test]
    fn test_parser_is_anchored_to_whole_line() {
        assert!(!is_mac_address("mac AA:BB:CC:DD:EE:FF"));
        assert!(!is_mac_address("AA:BB:CC:DD:EE:FF port 3"));
        assert!(!is_mac_address("AA:BB:CC:DD:EE:FF0"));
    }

    #[test]
    fn test_extract_keeps_order_trims_and_keeps_duplicates() {
        let text = "header\r\n  aa-bb-cc-dd-ee-ff \r\nnot a mac\n0011.2233.4455\r\r\naa-bb-cc-dd-ee-ff\n";
        assert_eq!(
            extract_mac_lines(text),
            vec!["aa-bb-cc-dd-ee-ff", "0011.2233.4455", "aa-bb-cc-dd-ee-ff"]
        );
    }

    #[test]
    fn test_extract_from_text_without_addresses() {
        assert!(extract_mac_lines("hello\nworld").is_empty());
        assert!(extract_mac_lines("").is_empty());
    }

    #[test]
    fn test_canonicalize_strips_separators_and_uppercases() {
        assert_eq!(canonicalize("aa-bb-cc-dd-ee-ff"), "AABBCCDDEEFF");
        assert_eq!(canonicalize("aabb.ccdd.eeff"), "AABBCCDDEEFF");
        assert_eq!(canonicalize("00:1b:c5"), "001BC5");
    }

    #[test]
    fn test_render_each_notation() {
        assert_eq!(render("AABBCCDDEEFF", MacNotation::Colon), "AA:BB:CC:DD:EE:FF");
        assert_eq!(render("AABBCCDDEEFF", MacNotation::Hyphen), "AA-BB-CC-DD-EE-FF");
        assert_eq!(render("AABBCCDDEEFF", MacNotation::Cisco), "AABB.CCDD.EEFF");
    }

    #[test]
    fn test_render_then_canonicalize_is_identity() {
        for sample in SAMPLES {
            for notation in MacNotation::ALL {
                assert_eq!(canonicalize(&render(sample, notation)), sample, "{notation:?}");
            }
        }
    }

    #[test]
    fn test_render_lengths_and_separator_positions() {
        for sample in SAMPLES {
            let colon = render(sample, MacNotation::Colon);
            assert_eq!(colon.len(), 17);
            assert!([2, 5, 8, 11, 14].iter().all(|&i| colon.as_bytes()[i] == b':'));

            let hyphen = render(sample, MacNotation::Hyphen);
            assert_eq!(hyphen.len(), 17);
            assert!([2, 5, 8, 11, 14].iter().all(|&i| hyphen.as_bytes()[i] == b'-'));

            let cisco = render(sample, MacNotation::Cisco);
            assert_eq!(cisco.len(), 14);
            assert_eq!(cisco.as_bytes()[4], b'.');
            assert_eq!(cisco.as_bytes()[9], b'.');
        }
    }

    #[test]
    fn test_rendered_output_is_recognized() {
        for notation in MacNotation::ALL {
            assert!(is_mac_address(&render("0123456789AB", notation)));
        }
    }

    #[test]
    fn test_mac_address_parse_and_canonical() {
        let mac = MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(mac.canonical(), "AABBCCDDEEFF");
        assert_eq!(mac.bytes(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(mac, MacAddress::parse("AABB.CCDD.EEFF").unwrap());
        assert_eq!(mac.render(MacNotation::Hyphen), "AA-BB-CC-DD-EE-FF");
    }

    #[test]
    fn test_mac_address_parse_rejects_wrong_length_or_digits() {
        assert_eq!(MacAddress::parse("AA:BB:CC").unwrap_err().kind(), "InvalidInput");
        assert!(MacAddress::parse("ZZBBCCDDEEFF").is_err());
    }

    #[test]
    fn test_mac_address_serializes_as_canonical_string() {
        let mac = MacAddress::from_bytes([0, 0x1b, 0xc5, 1, 2, 3]);
        assert_eq!(serde_json::to_value(mac).unwrap(), "001BC5010203");
    }

    #[test]
    fn test_notation_from_str_and_roundtrip_names() {
        assert_eq!("Colon".parse::<MacNotation>().unwrap(), MacNotation::Colon);
        assert_eq!(" dot ".parse::<MacNotation>().unwrap(), MacNotation::Cisco);
        assert_eq!("hyphen".parse::<MacNotation>().unwrap(), MacNotation::Hyphen);
        for notation in MacNotation::ALL {
            assert_eq!(notation.as_str().parse::<MacNotation>().unwrap(), notation);
        }
        assert_eq!("slash".parse::<MacNotation>().unwrap_err().kind(), "InvalidInput");
    }

    #[test]
    fn test_default_notation_is_cisco() {
        assert_eq!(MacNotation::default(), MacNotation::Cisco);
    }
}
