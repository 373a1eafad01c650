//! Kerlink WMC source: reads the CSV export of a WMC instance.
//!
//! The export is a directory of CSV files. Every file may be absent: a
//! missing resource file means that kind is not imported, and the grouping
//! files (`clusters.csv`, `fleets.csv`) are reconstructed from the resource
//! rows when they are not part of the export.

mod clusters;
mod fleets;
mod records;

use crate::error::Result;
use crate::model::{Application, Network};
use common::load_csv_optional;
use std::path::{Path, PathBuf};
use tracing::info;

const DEVICES_FILE: &str = "devices.csv";
const CLUSTERS_FILE: &str = "clusters.csv";
const PUSH_CONFIGURATIONS_FILE: &str = "pushConfigurations.csv";
const GATEWAYS_FILE: &str = "gateways.csv";
const FLEETS_FILE: &str = "fleets.csv";

/// Reads a WMC CSV export directory.
pub struct CsvSourceReader {
    data_dir: PathBuf,
    customer_id: Option<i64>,
}

impl CsvSourceReader {
    pub fn new(data_dir: impl Into<PathBuf>, customer_id: Option<i64>) -> Self {
        Self {
            data_dir: data_dir.into(),
            customer_id,
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Load clusters with their devices and push configurations and translate
    /// them into applications. A malformed row in any present file aborts the
    /// load; translation failures only skip the affected record.
    pub fn load_applications(&self) -> Result<Vec<Application>> {
        info!("Loading WMC export from {}", self.data_dir.display());

        let devices = load(&self.path(DEVICES_FILE))?;
        let push_configurations = load_csv_optional(&self.path(PUSH_CONFIGURATIONS_FILE))
            .map_err(to_io_error)?;
        let clusters = load_csv_optional(&self.path(CLUSTERS_FILE)).map_err(to_io_error)?;

        let applications =
            clusters::build_applications(devices, push_configurations, clusters);
        info!(
            "Loaded {} application(s) with {} device(s)",
            applications.len(),
            applications.iter().map(|a| a.devices.len()).sum::<usize>()
        );
        Ok(applications)
    }

    /// Load fleets with their gateways and translate them into networks,
    /// applying the customer filter when configured.
    pub fn load_networks(&self) -> Result<Vec<Network>> {
        let gateways = load(&self.path(GATEWAYS_FILE))?;
        let fleets = load_csv_optional(&self.path(FLEETS_FILE)).map_err(to_io_error)?;

        let networks = fleets::build_networks(gateways, fleets, self.customer_id);
        info!(
            "Loaded {} network(s) with {} gateway(s)",
            networks.len(),
            networks.iter().map(|n| n.gateways.len()).sum::<usize>()
        );
        Ok(networks)
    }
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    load_csv_optional(path).map_err(to_io_error)
}

fn to_io_error(err: anyhow::Error) -> crate::error::MigrateError {
    crate::error::MigrateError::Io(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn reads_a_minimal_export() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "devices.csv",
            "clusterId,clusterName,devEui,name,classType,macVersion,adrEnabled,activation,appEui,appKey,fcntDown,fcntUp,rx1Delay,rxWindows,dev_addr,NwkSKey,AppSKey\n\
             7,Farm,1a2b3c4d5e6f7081,soil-probe,A,1.0.3,true,OTAA,70b3d57ed0000000,2b7e151628aed2a6abf7158809cf4f3c,0,12,1,AUTO,,,\n",
        );

        let reader = CsvSourceReader::new(dir.path(), None);
        let apps = reader.load_applications().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Farm");
        assert_eq!(apps[0].devices[0].rx_window, 0);
        assert!(apps[0].outputs.is_empty());
    }

    #[test]
    fn missing_export_directory_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let reader = CsvSourceReader::new(dir.path().join("nope"), None);
        assert!(reader.load_applications().unwrap().is_empty());
        assert!(reader.load_networks().unwrap().is_empty());
    }

    #[test]
    fn malformed_row_aborts_the_load() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "devices.csv",
            "clusterId,devEui,classType,macVersion,activation\nnot-a-number,aa,A,1.0.3,OTAA\n",
        );
        let reader = CsvSourceReader::new(dir.path(), None);
        assert!(reader.load_applications().is_err());
    }
}
