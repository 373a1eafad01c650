//! In-memory [`LoriotApi`] used by the engine tests.

use super::{
    ApplicationSummary, GatewaySummary, LoriotApi, NetworkSummary, ResourceId,
};
use crate::error::{MigrateError, Result};
use crate::model::{Device, Gateway, Output};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct AppState {
    name: String,
    devices: BTreeSet<String>,
    outputs: u64,
}

#[derive(Default)]
struct NetState {
    name: String,
    // gateway id -> MAC
    gateways: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    applications: BTreeMap<u64, AppState>,
    networks: BTreeMap<u64, NetState>,
    failing_devices: HashSet<String>,
    failing_applications: HashSet<String>,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory destination. Interior mutability because the trait takes `&self`.
#[derive(Default)]
pub struct FakeLoriot {
    state: Mutex<State>,
}

impl FakeLoriot {
    pub fn fail_device_creation(&self, dev_eui: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_devices
            .insert(dev_eui.to_string());
    }

    pub fn fail_application_creation(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_applications
            .insert(name.to_string());
    }

    /// Seed an already-present application, as if a previous run created it.
    pub fn seed_application(&self, name: &str, dev_euis: &[&str]) -> ResourceId {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.applications.insert(
            id,
            AppState {
                name: name.to_string(),
                devices: dev_euis.iter().map(|e| e.to_string()).collect(),
                outputs: 0,
            },
        );
        ResourceId(id)
    }

    pub fn seed_network(&self, name: &str, macs: &[&str]) -> ResourceId {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        let gateways = macs
            .iter()
            .enumerate()
            .map(|(i, mac)| (format!("gw-{id}-{i}"), mac.to_string()))
            .collect();
        state.networks.insert(
            id,
            NetState {
                name: name.to_string(),
                gateways,
            },
        );
        ResourceId(id)
    }

    pub fn application_count(&self) -> usize {
        self.state.lock().unwrap().applications.len()
    }

    pub fn application_exists(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .applications
            .values()
            .any(|a| a.name == name)
    }

    pub fn device_count(&self, app_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .applications
            .values()
            .find(|a| a.name == app_name)
            .map_or(0, |a| a.devices.len())
    }

    pub fn network_exists(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .networks
            .values()
            .any(|n| n.name == name)
    }

    pub fn gateway_count(&self, net_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .networks
            .values()
            .find(|n| n.name == net_name)
            .map_or(0, |n| n.gateways.len())
    }
}

fn missing<T>(what: &str) -> Result<T> {
    Err(MigrateError::transport(format!("{what}: 404")))
}

#[async_trait]
impl LoriotApi for FakeLoriot {
    async fn find_application(&self, name: &str) -> Result<Option<ResourceId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .applications
            .iter()
            .find(|(_, a)| a.name == name)
            .map(|(id, _)| ResourceId(*id)))
    }

    async fn create_application(&self, name: &str, _capacity: usize) -> Result<ResourceId> {
        let mut state = self.state.lock().unwrap();
        if state.failing_applications.contains(name) {
            return Err(MigrateError::transport("create application: 400"));
        }
        let id = state.allocate();
        state.applications.insert(
            id,
            AppState {
                name: name.to_string(),
                ..AppState::default()
            },
        );
        Ok(ResourceId(id))
    }

    async fn delete_application(&self, app: ResourceId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.applications.remove(&app.0) {
            Some(_) => Ok(()),
            None => missing("delete application"),
        }
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .applications
            .iter()
            .map(|(id, a)| ApplicationSummary {
                id: ResourceId(*id),
                name: a.name.clone(),
            })
            .collect())
    }

    async fn application_device_count(&self, app: ResourceId) -> Result<u64> {
        let state = self.state.lock().unwrap();
        match state.applications.get(&app.0) {
            Some(a) => Ok(a.devices.len() as u64),
            None => missing("get application"),
        }
    }

    async fn create_output(&self, app: ResourceId, _output: &Output) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.applications.get_mut(&app.0) {
            Some(a) => {
                a.outputs += 1;
                Ok(())
            }
            None => missing("create output"),
        }
    }

    async fn create_device(&self, app: ResourceId, device: &Device) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_devices.contains(&device.dev_eui) {
            return Err(MigrateError::transport("create device: 400"));
        }
        match state.applications.get_mut(&app.0) {
            Some(a) => {
                a.devices.insert(device.dev_eui.clone());
                Ok(())
            }
            None => missing("create device"),
        }
    }

    async fn delete_device(&self, app: ResourceId, dev_eui: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.applications.get_mut(&app.0) {
            Some(a) => Ok(a.devices.remove(dev_eui)),
            None => missing("delete device"),
        }
    }

    async fn list_device_euis(&self, app: ResourceId) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        match state.applications.get(&app.0) {
            Some(a) => Ok(a.devices.iter().cloned().collect()),
            None => missing("list devices"),
        }
    }

    async fn find_network(&self, name: &str) -> Result<Option<ResourceId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .networks
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| ResourceId(*id)))
    }

    async fn create_network(&self, name: &str) -> Result<ResourceId> {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.networks.insert(
            id,
            NetState {
                name: name.to_string(),
                ..NetState::default()
            },
        );
        Ok(ResourceId(id))
    }

    async fn delete_network(&self, net: ResourceId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.networks.remove(&net.0) {
            Some(_) => Ok(()),
            None => missing("delete network"),
        }
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .networks
            .iter()
            .map(|(id, n)| NetworkSummary {
                id: ResourceId(*id),
                name: n.name.clone(),
            })
            .collect())
    }

    async fn network_gateway_count(&self, net: ResourceId) -> Result<u64> {
        let state = self.state.lock().unwrap();
        match state.networks.get(&net.0) {
            Some(n) => Ok(n.gateways.len() as u64),
            None => missing("get network"),
        }
    }

    async fn create_gateway(&self, net: ResourceId, gateway: &Gateway) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.networks.get_mut(&net.0) {
            Some(n) => {
                let id = format!("gw-{}-{}", net.0, n.gateways.len());
                n.gateways.insert(id, gateway.mac.clone());
                Ok(())
            }
            None => missing("create gateway"),
        }
    }

    async fn delete_gateway(&self, net: ResourceId, gateway_id: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.networks.get_mut(&net.0) {
            Some(n) => Ok(n.gateways.remove(gateway_id).is_some()),
            None => missing("delete gateway"),
        }
    }

    async fn list_gateways(&self, net: ResourceId) -> Result<Vec<GatewaySummary>> {
        let state = self.state.lock().unwrap();
        match state.networks.get(&net.0) {
            Some(n) => Ok(n
                .gateways
                .iter()
                .map(|(id, mac)| GatewaySummary {
                    id: id.clone(),
                    mac: mac.clone(),
                })
                .collect()),
            None => missing("list gateways"),
        }
    }
}
