//! Shared serde deserializers for loosely-typed CSV cells
//!
//! Legacy exports type every cell as a string. These helpers coerce at the
//! deserialization boundary:
//! - `""` and `"null"` → `None`
//! - `"true"` / `"false"` (and `"1"` / `"0"`) → bool
//! - numeric strings → numbers
//!
//! Hex identity fields (EUIs, addresses, session keys) must NOT use the
//! numeric helpers; they stay plain strings.

use serde::{Deserialize, Deserializer};

fn is_absent(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}

/// `""`/`"null"` → `None`, anything else kept as a string.
pub fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.filter(|v| !is_absent(v)))
}

/// Boolean from a CSV cell: `"true"`/`"false"`, `"1"`/`"0"` (case-insensitive).
/// Absent cells deserialize to `false`.
pub fn de_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        None => Ok(false),
        Some(v) if is_absent(&v) => Ok(false),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean cell: {other:?}"
            ))),
        },
    }
}

/// Tri-state boolean: absent cells stay `None` so the caller picks the
/// default, unlike [`de_bool`] which hardcodes `false`.
pub fn de_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(v) if is_absent(&v) => Ok(None),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean cell: {other:?}"
            ))),
        },
    }
}

/// Optional unsigned number from a CSV cell.
pub fn de_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(v) if is_absent(&v) => Ok(None),
        Some(v) => v
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid number cell {v:?}: {e}"))),
    }
}

/// Optional float from a CSV cell.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(v) if is_absent(&v) => Ok(None),
        Some(v) => v
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid number cell {v:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "super::de_bool", default)]
        enabled: bool,
        #[serde(deserialize_with = "super::de_opt_u32", default)]
        count: Option<u32>,
        #[serde(deserialize_with = "super::de_opt_string", default)]
        note: Option<String>,
    }

    fn parse(csv: &str) -> Row {
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        reader.deserialize().next().unwrap().unwrap()
    }

    #[test]
    fn coerces_bool_and_number_cells() {
        let row = parse("enabled,count,note\ntrue,41,hello");
        assert!(row.enabled);
        assert_eq!(row.count, Some(41));
        assert_eq!(row.note.as_deref(), Some("hello"));
    }

    #[test]
    fn empty_and_null_cells_are_absent() {
        let row = parse("enabled,count,note\n,null,");
        assert!(!row.enabled);
        assert_eq!(row.count, None);
        assert_eq!(row.note, None);
    }
}
