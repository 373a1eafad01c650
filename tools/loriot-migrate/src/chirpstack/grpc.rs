//! tonic-backed implementation of [`ChirpstackApi`].
//!
//! One channel, four service clients, one bearer token attached to every
//! request. `NotFound` from GetKeys/GetActivation is data, not failure: it
//! identifies ABP devices and never-joined devices.

use super::api::{
    ActivationDetail, ApplicationItem, ChirpstackApi, DeviceDetail, DeviceItem, GatewayItem,
    HttpIntegrationDetail, KeysDetail, Page, ProfileDetail,
};
use super::proto;
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::Channel;
use tonic::{Code, Request};

pub struct ChirpstackGrpc {
    applications: proto::ApplicationServiceClient,
    devices: proto::DeviceServiceClient,
    profiles: proto::DeviceProfileServiceClient,
    gateways: proto::GatewayServiceClient,
    authorization: MetadataValue<Ascii>,
    tenant_id: String,
}

impl ChirpstackGrpc {
    /// Connect to the ChirpStack gRPC endpoint.
    pub async fn connect(url: &str, api_token: &str, tenant_id: &str) -> Result<Self> {
        let authorization: MetadataValue<Ascii> = format!("Bearer {api_token}")
            .parse()
            .map_err(|_| MigrateError::config("API token is not valid ASCII"))?;

        let channel = Channel::from_shared(url.to_string())
            .map_err(|e| MigrateError::config(format!("invalid ChirpStack url {url:?}: {e}")))?
            .connect()
            .await?;

        Ok(Self {
            applications: proto::ApplicationServiceClient::new(channel.clone()),
            devices: proto::DeviceServiceClient::new(channel.clone()),
            profiles: proto::DeviceProfileServiceClient::new(channel.clone()),
            gateways: proto::GatewayServiceClient::new(channel),
            authorization,
            tenant_id: tenant_id.to_string(),
        })
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request
            .metadata_mut()
            .insert("authorization", self.authorization.clone());
        request
    }
}

/// Map `NotFound` to `None`, everything else to a transport error.
fn optional<T>(result: std::result::Result<T, tonic::Status>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(status) if status.code() == Code::NotFound => Ok(None),
        Err(status) => Err(status.into()),
    }
}

#[async_trait]
impl ChirpstackApi for ChirpstackGrpc {
    async fn list_applications(
        &mut self,
        limit: u32,
        offset: u32,
    ) -> Result<Page<ApplicationItem>> {
        let request = self.request(proto::ListApplicationsRequest {
            limit,
            offset,
            search: String::new(),
            tenant_id: self.tenant_id.clone(),
        });
        let response = self.applications.list(request).await?.into_inner();
        Ok(Page {
            total: response.total_count,
            items: response
                .result
                .into_iter()
                .map(|a| ApplicationItem {
                    id: a.id,
                    name: a.name,
                })
                .collect(),
        })
    }

    async fn list_devices(
        &mut self,
        application_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<DeviceItem>> {
        let request = self.request(proto::ListDevicesRequest {
            limit,
            offset,
            search: String::new(),
            application_id: application_id.to_string(),
        });
        let response = self.devices.list(request).await?.into_inner();
        Ok(Page {
            total: response.total_count,
            items: response
                .result
                .into_iter()
                .map(|d| DeviceItem { dev_eui: d.dev_eui })
                .collect(),
        })
    }

    async fn get_device(&mut self, dev_eui: &str) -> Result<DeviceDetail> {
        let request = self.request(proto::GetDeviceRequest {
            dev_eui: dev_eui.to_string(),
        });
        let response = self.devices.get(request).await?.into_inner();
        let device = response.device.ok_or_else(|| {
            MigrateError::protocol(format!("GetDevice response for {dev_eui} has no device"))
        })?;
        Ok(DeviceDetail {
            dev_eui: device.dev_eui,
            name: device.name,
            description: device.description,
            device_profile_id: device.device_profile_id,
            join_eui: device.join_eui,
        })
    }

    async fn get_activation(&mut self, dev_eui: &str) -> Result<Option<ActivationDetail>> {
        let request = self.request(proto::GetDeviceActivationRequest {
            dev_eui: dev_eui.to_string(),
        });
        let response = optional(self.devices.get_activation(request).await)?;
        Ok(response
            .map(tonic::Response::into_inner)
            .and_then(|r| r.device_activation)
            .map(|a| ActivationDetail {
                dev_addr: a.dev_addr,
                app_s_key: a.app_s_key,
                nwk_s_enc_key: a.nwk_s_enc_key,
                f_cnt_up: a.f_cnt_up,
                n_f_cnt_down: a.n_f_cnt_down,
            }))
    }

    async fn get_keys(&mut self, dev_eui: &str) -> Result<Option<KeysDetail>> {
        let request = self.request(proto::GetDeviceKeysRequest {
            dev_eui: dev_eui.to_string(),
        });
        let response = optional(self.devices.get_keys(request).await)?;
        Ok(response
            .map(tonic::Response::into_inner)
            .and_then(|r| r.device_keys)
            .map(|k| KeysDetail {
                nwk_key: k.nwk_key,
                app_key: k.app_key,
            }))
    }

    async fn get_device_profile(&mut self, id: &str) -> Result<ProfileDetail> {
        let request = self.request(proto::GetDeviceProfileRequest { id: id.to_string() });
        let response = self.profiles.get(request).await?.into_inner();
        let profile = response.device_profile.ok_or_else(|| {
            MigrateError::protocol(format!(
                "GetDeviceProfile response for {id} has no profile"
            ))
        })?;
        Ok(ProfileDetail {
            mac_version_index: profile.mac_version,
            supports_otaa: profile.supports_otaa,
            supports_class_c: profile.supports_class_c,
        })
    }

    async fn get_http_integration(
        &mut self,
        application_id: &str,
    ) -> Result<Option<HttpIntegrationDetail>> {
        let request = self.request(proto::GetHttpIntegrationRequest {
            application_id: application_id.to_string(),
        });
        let response = optional(self.applications.get_http_integration(request).await)?;
        Ok(response
            .map(tonic::Response::into_inner)
            .and_then(|r| r.integration)
            .map(|i| HttpIntegrationDetail {
                event_endpoint_url: i.event_endpoint_url,
            }))
    }

    async fn list_gateways(&mut self, limit: u32, offset: u32) -> Result<Page<GatewayItem>> {
        let request = self.request(proto::ListGatewaysRequest {
            limit,
            offset,
            search: String::new(),
            tenant_id: self.tenant_id.clone(),
        });
        let response = self.gateways.list(request).await?.into_inner();
        Ok(Page {
            total: response.total_count,
            items: response
                .result
                .into_iter()
                .map(|g| GatewayItem {
                    latitude: g.location.as_ref().map(|l| l.latitude),
                    longitude: g.location.as_ref().map(|l| l.longitude),
                    gateway_id: g.gateway_id,
                    name: g.name,
                    description: g.description,
                })
                .collect(),
        })
    }
}
