//! ChirpStack API seam.
//!
//! The reader in [`super`] talks to this trait, not to tonic directly; the
//! gRPC implementation lives in [`super::grpc`] and tests substitute an
//! in-memory one.

use crate::error::Result;
use async_trait::async_trait;

/// One page of a paginated listing, with the server-reported grand total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct ApplicationItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DeviceItem {
    pub dev_eui: String,
}

#[derive(Debug, Clone)]
pub struct DeviceDetail {
    pub dev_eui: String,
    pub name: String,
    pub description: String,
    pub device_profile_id: String,
    pub join_eui: String,
}

#[derive(Debug, Clone)]
pub struct ActivationDetail {
    pub dev_addr: String,
    pub app_s_key: String,
    pub nwk_s_enc_key: String,
    pub f_cnt_up: u32,
    pub n_f_cnt_down: u32,
}

#[derive(Debug, Clone)]
pub struct KeysDetail {
    pub nwk_key: String,
    pub app_key: String,
}

#[derive(Debug, Clone)]
pub struct ProfileDetail {
    pub mac_version_index: i32,
    pub supports_otaa: bool,
    pub supports_class_c: bool,
}

#[derive(Debug, Clone)]
pub struct HttpIntegrationDetail {
    pub event_endpoint_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayItem {
    pub gateway_id: String,
    pub name: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The subset of the ChirpStack v4 API the migration reads.
///
/// `get_activation` and `get_keys` return `None` for "not present": a device
/// that never joined has no activation, and an ABP device has no root keys.
#[async_trait]
pub trait ChirpstackApi {
    async fn list_applications(&mut self, limit: u32, offset: u32)
        -> Result<Page<ApplicationItem>>;

    async fn list_devices(
        &mut self,
        application_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<DeviceItem>>;

    async fn get_device(&mut self, dev_eui: &str) -> Result<DeviceDetail>;

    async fn get_activation(&mut self, dev_eui: &str) -> Result<Option<ActivationDetail>>;

    async fn get_keys(&mut self, dev_eui: &str) -> Result<Option<KeysDetail>>;

    async fn get_device_profile(&mut self, id: &str) -> Result<ProfileDetail>;

    async fn get_http_integration(
        &mut self,
        application_id: &str,
    ) -> Result<Option<HttpIntegrationDetail>>;

    async fn list_gateways(&mut self, limit: u32, offset: u32) -> Result<Page<GatewayItem>>;
}
