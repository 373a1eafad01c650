//! Hand-maintained subset of the ChirpStack v4 `api` protobuf package.
//!
//! Only the messages and RPCs this tool calls are defined; tags match the
//! upstream `.proto` files so the wire format is identical. Unused fields are
//! omitted, which protobuf tolerates by design.

use prost::Message;
use std::collections::HashMap;
use tonic::codegen::http;
use tonic::transport::Channel;

// ---------------------------------------------------------------------------
// ApplicationService
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct ListApplicationsRequest {
    #[prost(uint32, tag = "1")]
    pub limit: u32,
    #[prost(uint32, tag = "2")]
    pub offset: u32,
    #[prost(string, tag = "3")]
    pub search: String,
    #[prost(string, tag = "4")]
    pub tenant_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ApplicationListItem {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub description: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ListApplicationsResponse {
    #[prost(uint32, tag = "1")]
    pub total_count: u32,
    #[prost(message, repeated, tag = "2")]
    pub result: Vec<ApplicationListItem>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetHttpIntegrationRequest {
    #[prost(string, tag = "1")]
    pub application_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct HttpIntegration {
    #[prost(string, tag = "1")]
    pub application_id: String,
    #[prost(map = "string, string", tag = "2")]
    pub headers: HashMap<String, String>,
    #[prost(string, tag = "4")]
    pub event_endpoint_url: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetHttpIntegrationResponse {
    #[prost(message, optional, tag = "1")]
    pub integration: Option<HttpIntegration>,
}

// ---------------------------------------------------------------------------
// DeviceService
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct ListDevicesRequest {
    #[prost(uint32, tag = "1")]
    pub limit: u32,
    #[prost(uint32, tag = "2")]
    pub offset: u32,
    #[prost(string, tag = "3")]
    pub search: String,
    #[prost(string, tag = "4")]
    pub application_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeviceListItem {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
    #[prost(string, tag = "5")]
    pub name: String,
    #[prost(string, tag = "6")]
    pub description: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ListDevicesResponse {
    #[prost(uint32, tag = "1")]
    pub total_count: u32,
    #[prost(message, repeated, tag = "2")]
    pub result: Vec<DeviceListItem>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceRequest {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Device {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub application_id: String,
    #[prost(string, tag = "5")]
    pub device_profile_id: String,
    #[prost(string, tag = "10")]
    pub join_eui: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceResponse {
    #[prost(message, optional, tag = "1")]
    pub device: Option<Device>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceActivationRequest {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeviceActivation {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
    #[prost(string, tag = "2")]
    pub dev_addr: String,
    #[prost(string, tag = "3")]
    pub app_s_key: String,
    #[prost(string, tag = "4")]
    pub nwk_s_enc_key: String,
    #[prost(string, tag = "5")]
    pub s_nwk_s_int_key: String,
    #[prost(string, tag = "6")]
    pub f_nwk_s_int_key: String,
    #[prost(uint32, tag = "7")]
    pub f_cnt_up: u32,
    #[prost(uint32, tag = "8")]
    pub n_f_cnt_down: u32,
    #[prost(uint32, tag = "9")]
    pub a_f_cnt_down: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceActivationResponse {
    #[prost(message, optional, tag = "1")]
    pub device_activation: Option<DeviceActivation>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceKeysRequest {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeviceKeys {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
    #[prost(string, tag = "2")]
    pub nwk_key: String,
    #[prost(string, tag = "3")]
    pub app_key: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceKeysResponse {
    #[prost(message, optional, tag = "1")]
    pub device_keys: Option<DeviceKeys>,
}

// ---------------------------------------------------------------------------
// DeviceProfileService
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MacVersion {
    Lorawan100 = 0,
    Lorawan101 = 1,
    Lorawan102 = 2,
    Lorawan103 = 3,
    Lorawan104 = 4,
    Lorawan110 = 5,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceProfileRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeviceProfile {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub tenant_id: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(enumeration = "MacVersion", tag = "5")]
    pub mac_version: i32,
    #[prost(bool, tag = "13")]
    pub supports_otaa: bool,
    #[prost(bool, tag = "14")]
    pub supports_class_b: bool,
    #[prost(bool, tag = "15")]
    pub supports_class_c: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetDeviceProfileResponse {
    #[prost(message, optional, tag = "1")]
    pub device_profile: Option<DeviceProfile>,
}

// ---------------------------------------------------------------------------
// GatewayService
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct ListGatewaysRequest {
    #[prost(uint32, tag = "1")]
    pub limit: u32,
    #[prost(uint32, tag = "2")]
    pub offset: u32,
    #[prost(string, tag = "3")]
    pub search: String,
    #[prost(string, tag = "4")]
    pub tenant_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Location {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "2")]
    pub longitude: f64,
    #[prost(double, tag = "3")]
    pub altitude: f64,
}

#[derive(Clone, PartialEq, Message)]
pub struct GatewayListItem {
    #[prost(string, tag = "1")]
    pub tenant_id: String,
    #[prost(string, tag = "2")]
    pub gateway_id: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(message, optional, tag = "5")]
    pub location: Option<Location>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ListGatewaysResponse {
    #[prost(uint32, tag = "1")]
    pub total_count: u32,
    #[prost(message, repeated, tag = "2")]
    pub result: Vec<GatewayListItem>,
}

// ---------------------------------------------------------------------------
// Service clients
// ---------------------------------------------------------------------------

macro_rules! unary {
    ($self:ident, $request:ident, $path:literal) => {{
        $self
            .inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {e}")))?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static($path);
        $self.inner.unary($request, path, codec).await
    }};
}

#[derive(Debug, Clone)]
pub struct ApplicationServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl ApplicationServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn list(
        &mut self,
        request: tonic::Request<ListApplicationsRequest>,
    ) -> Result<tonic::Response<ListApplicationsResponse>, tonic::Status> {
        unary!(self, request, "/api.ApplicationService/List")
    }

    pub async fn get_http_integration(
        &mut self,
        request: tonic::Request<GetHttpIntegrationRequest>,
    ) -> Result<tonic::Response<GetHttpIntegrationResponse>, tonic::Status> {
        unary!(self, request, "/api.ApplicationService/GetHttpIntegration")
    }
}

#[derive(Debug, Clone)]
pub struct DeviceServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl DeviceServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn list(
        &mut self,
        request: tonic::Request<ListDevicesRequest>,
    ) -> Result<tonic::Response<ListDevicesResponse>, tonic::Status> {
        unary!(self, request, "/api.DeviceService/List")
    }

    pub async fn get(
        &mut self,
        request: tonic::Request<GetDeviceRequest>,
    ) -> Result<tonic::Response<GetDeviceResponse>, tonic::Status> {
        unary!(self, request, "/api.DeviceService/Get")
    }

    pub async fn get_activation(
        &mut self,
        request: tonic::Request<GetDeviceActivationRequest>,
    ) -> Result<tonic::Response<GetDeviceActivationResponse>, tonic::Status> {
        unary!(self, request, "/api.DeviceService/GetActivation")
    }

    pub async fn get_keys(
        &mut self,
        request: tonic::Request<GetDeviceKeysRequest>,
    ) -> Result<tonic::Response<GetDeviceKeysResponse>, tonic::Status> {
        unary!(self, request, "/api.DeviceService/GetKeys")
    }
}

#[derive(Debug, Clone)]
pub struct DeviceProfileServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl DeviceProfileServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn get(
        &mut self,
        request: tonic::Request<GetDeviceProfileRequest>,
    ) -> Result<tonic::Response<GetDeviceProfileResponse>, tonic::Status> {
        unary!(self, request, "/api.DeviceProfileService/Get")
    }
}

#[derive(Debug, Clone)]
pub struct GatewayServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl GatewayServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn list(
        &mut self,
        request: tonic::Request<ListGatewaysRequest>,
    ) -> Result<tonic::Response<ListGatewaysResponse>, tonic::Status> {
        unary!(self, request, "/api.GatewayService/List")
    }
}
