//! Pure normalization helpers shared by both source readers
//!
//! Everything here is side-effect-free; per-record validation failures come
//! back as `MigrateError::Validation` and are caught at the per-entity
//! boundary by the callers.

use crate::error::{MigrateError, Result};
use crate::model::{DeviceClass, HardwareProfile, LorawanVersion};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Width of a normalized DevAddr in hex characters.
pub const DEVADDR_WIDTH: usize = 8;
/// Width of a normalized JoinEUI/AppEUI in hex characters.
pub const EUI_WIDTH: usize = 16;
/// Width of a normalized 128-bit key in hex characters.
pub const KEY_WIDTH: usize = 32;

/// Normalize a hex field: validate, left-pad with zeros to `width`, uppercase.
///
/// Normalization is idempotent: an already-normalized value passes through
/// unchanged.
pub fn normalize_hex(value: &str, width: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MigrateError::validation("empty hex value"));
    }
    if trimmed.len() > width {
        return Err(MigrateError::Validation(format!(
            "hex value {trimmed:?} longer than {width} characters"
        )));
    }
    if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MigrateError::Validation(format!(
            "invalid hex value {trimmed:?}"
        )));
    }
    Ok(format!("{:0>width$}", trimmed.to_uppercase(), width = width))
}

/// Parse a `major.minor.patch` MAC-version string and map it to a protocol
/// generation: minor 0 is LoRaWAN 1.0.x, any other minor is 1.1.x.
pub fn parse_mac_version(mac_version: &str) -> Result<LorawanVersion> {
    let mut parts = mac_version.trim().split('.');
    let major = parts.next().and_then(|p| p.parse::<u8>().ok());
    let minor = parts.next().and_then(|p| p.parse::<u8>().ok());

    match (major, minor) {
        (Some(_), Some(0)) => Ok(LorawanVersion::V1_0),
        (Some(_), Some(_)) => Ok(LorawanVersion::V1_1),
        _ => Err(MigrateError::Validation(format!(
            "unable to parse macVersion {mac_version:?}"
        ))),
    }
}

/// Resolve the RX window policy.
///
/// `"AUTO"` maps to window 0; an explicit numeric value is kept; anything
/// else falls back to window 2 for class C devices and window 1 otherwise.
pub fn rx_window(raw: Option<&str>, class: DeviceClass) -> u8 {
    match raw.map(str::trim) {
        Some("AUTO") => 0,
        Some(value) => match value.parse::<u8>() {
            Ok(n) => n,
            Err(_) => default_rx_window(class),
        },
        None => default_rx_window(class),
    }
}

fn default_rx_window(class: DeviceClass) -> u8 {
    if class == DeviceClass::C {
        2
    } else {
        1
    }
}

/// Convert the source's "last downlink counter used" into the destination's
/// "next downlink counter to use": 0 stays 0 (no downlink sent yet), any
/// other value is incremented by one. The destination rejects the first
/// downlink otherwise.
pub fn next_downlink_counter(last_used: u32) -> u32 {
    if last_used == 0 {
        0
    } else {
        last_used + 1
    }
}

/// Maximum device title length accepted by the destination.
const TITLE_MAX: usize = 50;

/// Truncate a title of 50 characters or more down to 50, preserving the
/// original as the description.
pub fn truncate_title(title: String) -> (String, Option<String>) {
    if title.chars().count() >= TITLE_MAX {
        let truncated: String = title.chars().take(TITLE_MAX).collect();
        tracing::warn!("Title {title:?} hits the {TITLE_MAX}-character limit, truncated");
        (truncated, Some(title))
    } else {
        (title, None)
    }
}

/// Map a source region identifier to the destination channel-plan code.
/// Unmapped regions translate to `None`; the gateway is created without one.
pub fn translate_region(region: &str) -> Option<&'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        HashMap::from([
            ("AS923", "AS923"),
            ("AU915", "AU915-928"),
            ("CN470", "CN470-510"),
            ("EU433", "EU433"),
            ("CN779", "CN779-787"),
            ("IN865", "IN865-867"),
            ("EU868", "EU863-870"),
            ("KR920", "KR920-923"),
            ("RU864", "RU864-870"),
            ("US915", "US902-928"),
        ])
    });
    table.get(region.trim()).copied()
}

struct KnownModel {
    brand: &'static str,
    pattern: &'static str,
    profile: fn() -> HardwareProfile,
}

// Ordered: first match wins.
const KNOWN_MODELS: &[KnownModel] = &[
    // Kerlink iFemtocell (OS V4.x.x incl Evolution)
    KnownModel {
        brand: "KERLINK",
        pattern: r"iFemtoCell",
        profile: || HardwareProfile {
            base: "kerlink".to_string(),
            bus: "SPI".to_string(),
            card: String::new(),
            concentrator: "kerlink_femtocell".to_string(),
            model: "evolution".to_string(),
        },
    },
    // Kerlink iStation
    KnownModel {
        brand: "KERLINK",
        pattern: r"iStation",
        profile: || HardwareProfile {
            base: "kerlink".to_string(),
            bus: "SPI".to_string(),
            card: String::new(),
            concentrator: "kerlink_femtocell".to_string(),
            model: "istation".to_string(),
        },
    },
    // Kerlink iBTS
    KnownModel {
        brand: "KERLINK",
        pattern: r"iBts",
        profile: || HardwareProfile {
            base: "kerlink".to_string(),
            bus: "SPI".to_string(),
            card: String::new(),
            concentrator: "kerlink_ibts_v2_61".to_string(),
            model: "ibts".to_string(),
        },
    },
];

fn model_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        KNOWN_MODELS
            .iter()
            .map(|m| Regex::new(m.pattern).expect("known-model pattern is valid"))
            .collect()
    })
}

/// Infer the hardware profile of a gateway from its brand name and free-text
/// description. An unknown model is a per-gateway translation error.
pub fn infer_hardware(brand: &str, description: &str) -> Result<HardwareProfile> {
    let patterns = model_patterns();
    for (model, pattern) in KNOWN_MODELS.iter().zip(patterns.iter()) {
        if model.brand == brand && pattern.is_match(description) {
            return Ok((model.profile)());
        }
    }
    Err(MigrateError::Validation(format!(
        "unknown gateway model {brand} {description}"
    )))
}

/// Hardware profile used for every ChirpStack gateway: they run Basics
/// Station and the concentrator model is not exported.
pub fn basics_station_profile() -> HardwareProfile {
    HardwareProfile {
        base: "basics-station".to_string(),
        bus: "SPI".to_string(),
        card: String::new(),
        concentrator: "SX130x".to_string(),
        model: "semtech".to_string(),
    }
}

/// Derive a colon-separated MAC-48 from a gateway EUI-64.
///
/// Most gateways build their EUI by inserting FFFE in the middle of the
/// ethernet MAC; collapse that back out. Otherwise fall back to the first
/// six bytes.
pub fn eui_to_mac(eui: &str) -> Result<String> {
    let normalized = normalize_hex(eui, EUI_WIDTH)?;
    let bytes: Vec<&str> = (0..8).map(|i| &normalized[i * 2..i * 2 + 2]).collect();

    let mac: Vec<&str> = if &normalized[6..10] == "FFFE" {
        vec![bytes[0], bytes[1], bytes[2], bytes[5], bytes[6], bytes[7]]
    } else {
        bytes[..6].to_vec()
    };

    Ok(mac.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_normalization_pads_and_uppercases() {
        assert_eq!(normalize_hex("1a2b", 8).unwrap(), "00001A2B");
    }

    #[test]
    fn hex_normalization_is_idempotent() {
        let key = "00001A2B00001A2B00001A2B00001A2B";
        assert_eq!(normalize_hex(key, KEY_WIDTH).unwrap(), key);
    }

    #[test]
    fn hex_normalization_rejects_garbage() {
        assert!(normalize_hex("xyz", 8).is_err());
        assert!(normalize_hex("", 8).is_err());
        assert!(normalize_hex("112233445566778899", EUI_WIDTH).is_err());
    }

    #[test]
    fn mac_version_maps_minor_to_generation() {
        assert_eq!(parse_mac_version("1.0.3").unwrap(), LorawanVersion::V1_0);
        assert_eq!(parse_mac_version("1.1.1").unwrap(), LorawanVersion::V1_1);
    }

    #[test]
    fn malformed_mac_version_is_an_error() {
        assert!(parse_mac_version("banana").is_err());
        assert!(parse_mac_version("1").is_err());
    }

    #[test]
    fn rx_window_defaults_by_class() {
        assert_eq!(rx_window(None, DeviceClass::C), 2);
        assert_eq!(rx_window(None, DeviceClass::A), 1);
        assert_eq!(rx_window(Some("AUTO"), DeviceClass::C), 0);
        assert_eq!(rx_window(Some("AUTO"), DeviceClass::A), 0);
        assert_eq!(rx_window(Some("2"), DeviceClass::A), 2);
    }

    #[test]
    fn downlink_counter_points_to_next_frame() {
        assert_eq!(next_downlink_counter(0), 0);
        assert_eq!(next_downlink_counter(41), 42);
    }

    #[test]
    fn long_title_is_truncated_and_preserved() {
        let original = "x".repeat(60);
        let (title, description) = truncate_title(original.clone());
        assert_eq!(title.len(), 50);
        assert_eq!(description.as_deref(), Some(original.as_str()));
    }

    #[test]
    fn exactly_fifty_chars_still_preserves_the_description() {
        let original = "y".repeat(50);
        let (title, description) = truncate_title(original.clone());
        assert_eq!(title, original);
        assert_eq!(description.as_deref(), Some(original.as_str()));
    }

    #[test]
    fn short_title_is_untouched() {
        let (title, description) = truncate_title("sensor-1".to_string());
        assert_eq!(title, "sensor-1");
        assert!(description.is_none());
    }

    #[test]
    fn region_table_maps_known_codes() {
        assert_eq!(translate_region("EU868"), Some("EU863-870"));
        assert_eq!(translate_region("US915"), Some("US902-928"));
        assert_eq!(translate_region("MOON1"), None);
    }

    #[test]
    fn hardware_inference_first_match_wins() {
        let profile = infer_hardware("KERLINK", "Wirnet iFemtoCell evolution").unwrap();
        assert_eq!(profile.model, "evolution");

        let profile = infer_hardware("KERLINK", "Wirnet iBts compact").unwrap();
        assert_eq!(profile.concentrator, "kerlink_ibts_v2_61");
    }

    #[test]
    fn unknown_model_is_an_error() {
        assert!(infer_hardware("ACME", "Wirnet iFemtoCell").is_err());
        assert!(infer_hardware("KERLINK", "TurboGateway 9000").is_err());
    }

    #[test]
    fn eui_with_embedded_fffe_collapses_to_mac() {
        assert_eq!(
            eui_to_mac("0016C0FFFE1A2B3C").unwrap(),
            "00:16:C0:1A:2B:3C"
        );
    }

    #[test]
    fn eui_without_fffe_uses_leading_bytes() {
        assert_eq!(
            eui_to_mac("0102030405060708").unwrap(),
            "01:02:03:04:05:06"
        );
    }
}
