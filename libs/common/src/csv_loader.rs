//! CSV loading helpers
//!
//! Export files from the legacy platform are flat CSV tables. Loading is
//! typed: each row deserializes into a provider-native record struct, with
//! cell coercion handled by the deserializers in [`crate::serde_helpers`].

use anyhow::{Context, Result};
use csv::Reader;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, warn};

/// Load a CSV file and deserialize every row into a typed record.
///
/// A malformed row aborts the load: a partially-read export would silently
/// under-migrate.
pub fn load_csv_typed<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    debug!("Loading CSV file: {:?}", path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

    let mut reader = Reader::from_reader(file);
    let mut records = Vec::new();

    for (line_number, result) in reader.deserialize().enumerate() {
        let record: T = result.with_context(|| {
            format!(
                "Failed to deserialize CSV record from: {:?} (line {})",
                path,
                line_number + 2
            )
        })?;
        records.push(record);
    }

    debug!("Loaded {} records from CSV: {:?}", records.len(), path);
    Ok(records)
}

/// Load a CSV file that may legitimately be absent.
///
/// A missing file means that resource kind was simply not exported; the
/// migration continues with an empty set so partial exports still import.
pub fn load_csv_optional<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        warn!("File {:?} not found: records will not be imported", path);
        return Ok(Vec::new());
    }

    load_csv_typed(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: u32,
        name: String,
    }

    #[test]
    fn loads_typed_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name\n1,alpha\n2,beta").unwrap();

        let rows: Vec<Row> = load_csv_typed(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].name, "beta");
    }

    #[test]
    fn missing_file_is_empty_not_error() {
        let rows: Vec<Row> = load_csv_optional("/nonexistent/devices.csv").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn malformed_row_fails_the_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name\nnot-a-number,alpha").unwrap();

        let result: Result<Vec<Row>> = load_csv_typed(file.path());
        assert!(result.is_err());
    }
}
