//! LORIOT destination: REST client, import engine and cleaner.
//!
//! The sync engine talks to [`LoriotApi`]; the reqwest-backed client lives in
//! [`client`] and tests substitute an in-memory one.

pub mod clean;
pub mod client;
pub mod import;
#[cfg(test)]
mod testing;

use crate::error::Result;
use crate::model::{Application, Device, Gateway, Network, Output};
use async_trait::async_trait;
use std::fmt;

pub use clean::{clean_applications, clean_networks};
pub use client::LoriotClient;
pub use import::{import_applications, import_networks, ImportSummary};

/// Numeric id of a destination resource. The API renders ids as uppercase
/// hex in paths, so `Display` does too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Existing destination application, as returned by the listing endpoint.
#[derive(Debug, Clone)]
pub struct ApplicationSummary {
    pub id: ResourceId,
    pub name: String,
}

/// Existing destination network.
#[derive(Debug, Clone)]
pub struct NetworkSummary {
    pub id: ResourceId,
    pub name: String,
}

/// Existing destination gateway inside a network.
#[derive(Debug, Clone)]
pub struct GatewaySummary {
    pub id: String,
    pub mac: String,
}

/// The subset of the LORIOT network-management API the migration uses.
///
/// Deletions report whether the resource existed: `Ok(false)` is "already
/// gone", which both the upsert path and the cleaner treat as success.
#[async_trait]
pub trait LoriotApi {
    async fn find_application(&self, name: &str) -> Result<Option<ResourceId>>;
    async fn create_application(&self, name: &str, capacity: usize) -> Result<ResourceId>;
    async fn delete_application(&self, app: ResourceId) -> Result<()>;
    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>>;
    async fn application_device_count(&self, app: ResourceId) -> Result<u64>;

    async fn create_output(&self, app: ResourceId, output: &Output) -> Result<()>;

    async fn create_device(&self, app: ResourceId, device: &Device) -> Result<()>;
    async fn delete_device(&self, app: ResourceId, dev_eui: &str) -> Result<bool>;
    async fn list_device_euis(&self, app: ResourceId) -> Result<Vec<String>>;

    async fn find_network(&self, name: &str) -> Result<Option<ResourceId>>;
    async fn create_network(&self, name: &str) -> Result<ResourceId>;
    async fn delete_network(&self, net: ResourceId) -> Result<()>;
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;
    async fn network_gateway_count(&self, net: ResourceId) -> Result<u64>;

    async fn create_gateway(&self, net: ResourceId, gateway: &Gateway) -> Result<()>;
    async fn delete_gateway(&self, net: ResourceId, gateway_id: &str) -> Result<bool>;
    async fn list_gateways(&self, net: ResourceId) -> Result<Vec<GatewaySummary>>;
}

/// Everything a migration run pushes to the destination.
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    pub applications: Vec<Application>,
    pub networks: Vec<Network>,
}
