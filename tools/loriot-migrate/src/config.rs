//! Configuration: defaults < YAML file < `LM_*` environment < CLI flags.
//!
//! The source provider is selected by presence: a `chirpstack` section means
//! the gRPC reader, otherwise the Kerlink CSV reader runs against
//! `kerlink.data_dir`. Environment variables use `__` for nesting, e.g.
//! `LM_LORIOT__URL`, `LM_CHIRPSTACK__API_TOKEN`.

use crate::error::{MigrateError, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ChirpStack gRPC source parameters. Presence of this section selects the
/// ChirpStack provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpstackConfig {
    /// gRPC endpoint, e.g. `http://chirpstack.example.com:8080`
    pub url: String,
    /// API token, sent as a bearer credential on every call
    pub api_token: String,
    /// Tenant whose resources are migrated
    #[serde(default)]
    pub tenant_id: String,
}

/// Kerlink WMC CSV source parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KerlinkConfig {
    /// Directory holding the CSV export
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Keep only fleets owned by this WMC customer
    #[serde(default)]
    pub customer_id: Option<i64>,
}

impl Default for KerlinkConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            customer_id: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// LORIOT destination parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoriotConfig {
    /// Server root, e.g. `https://eu1.loriot.io`
    #[serde(default)]
    pub url: String,
    /// Value of the Authorization header (`Bearer <token>` or a session key)
    #[serde(default)]
    pub auth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateConfig {
    #[serde(default)]
    pub chirpstack: Option<ChirpstackConfig>,
    #[serde(default)]
    pub kerlink: KerlinkConfig,
    #[serde(default)]
    pub loriot: LoriotConfig,
    /// Delete previously migrated resources before importing
    #[serde(default)]
    pub clean: bool,
    /// Run the import phase
    #[serde(default = "default_true")]
    pub import: bool,
    /// Applications/networks imported in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            chirpstack: None,
            kerlink: KerlinkConfig::default(),
            loriot: LoriotConfig::default(),
            clean: false,
            import: true,
            concurrency: default_concurrency(),
        }
    }
}

impl MigrateConfig {
    /// Human-readable name of the selected source provider.
    pub fn provider(&self) -> &'static str {
        if self.chirpstack.is_some() {
            "ChirpStack (gRPC)"
        } else {
            "Kerlink WMC (CSV)"
        }
    }

    fn validate(self) -> Result<Self> {
        if self.loriot.url.is_empty() {
            return Err(MigrateError::config(
                "loriot.url is not set (LM_LORIOT__URL)",
            ));
        }
        if self.loriot.auth.is_empty() {
            return Err(MigrateError::config(
                "loriot.auth is not set (LM_LORIOT__AUTH)",
            ));
        }
        if let Some(chirpstack) = &self.chirpstack {
            if chirpstack.url.is_empty() || chirpstack.api_token.is_empty() {
                return Err(MigrateError::config(
                    "chirpstack.url and chirpstack.api_token must both be set",
                ));
            }
        }
        Ok(self)
    }
}

/// Load and validate the configuration.
pub fn load_config(path: Option<&Path>) -> Result<MigrateConfig> {
    let mut figment = Figment::new().merge(Serialized::defaults(MigrateConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    let config: MigrateConfig = figment
        .merge(Env::prefixed("LM_").split("__"))
        .extract()
        .map_err(|e| MigrateError::config(e.to_string()))?;
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml_config(content: &str) -> MigrateConfig {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(Some(file.path())).unwrap()
    }

    #[test]
    fn kerlink_is_the_default_provider() {
        let config = yaml_config(
            "loriot:\n  url: https://eu1.loriot.io\n  auth: Bearer token\n",
        );
        assert_eq!(config.provider(), "Kerlink WMC (CSV)");
        assert_eq!(config.kerlink.data_dir, PathBuf::from("./data"));
        assert!(config.import);
        assert!(!config.clean);
    }

    #[test]
    fn chirpstack_section_selects_the_grpc_provider() {
        let config = yaml_config(
            "loriot:\n  url: https://eu1.loriot.io\n  auth: t\n\
             chirpstack:\n  url: http://localhost:8080\n  api_token: secret\n",
        );
        assert_eq!(config.provider(), "ChirpStack (gRPC)");
    }

    #[test]
    fn missing_destination_is_a_config_error() {
        let result = load_config(None);
        assert!(matches!(result, Err(MigrateError::Config(_))));
    }
}
