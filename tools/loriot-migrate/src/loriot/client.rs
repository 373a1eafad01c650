//! reqwest-backed [`LoriotApi`] implementation.
//!
//! Listings use `page`/`perPage` pagination and are collected against the
//! server-reported `total`. An empty page while more items are owed is a
//! protocol error: continuing would silently under-count and the cleaner
//! could delete a non-empty application.

use super::{ApplicationSummary, GatewaySummary, LoriotApi, NetworkSummary, ResourceId};
use crate::error::{MigrateError, Result};
use crate::model::{Device, Gateway, Output};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const DEFAULT_PAGE_SIZE: u64 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LoriotClient {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
    page_size: u64,
}

impl LoriotClient {
    /// `base_url` is the server root, e.g. `https://eu1.loriot.io`;
    /// `auth` is the value of the Authorization header (`Bearer <token>` or
    /// a session key).
    pub fn new(base_url: &str, auth: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: auth.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    #[cfg(test)]
    fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MigrateError::transport(format!("{what}: {status} {body}")))
    }

    async fn get_json(&self, path_and_query: &str, what: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path_and_query))
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        Ok(Self::check(response, what).await?.json().await?)
    }

    async fn post_json(&self, path: &str, body: &Value, what: &str) -> Result<Value> {
        let response = self
            .http
            .post(self.url(path))
            .header(AUTHORIZATION, &self.authorization)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response, what).await?.json().await?)
    }

    /// DELETE that reports whether the resource existed; 404 means it was
    /// already gone.
    async fn delete(&self, path: &str, what: &str) -> Result<bool> {
        let response = self
            .http
            .delete(self.url(path))
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response, what).await?;
        Ok(true)
    }

    /// Collect every item of a paginated listing; `field` names the array in
    /// each page.
    async fn get_paginated(&self, path: &str, field: &str) -> Result<Vec<Value>> {
        let mut items: Vec<Value> = Vec::new();
        let mut page: u64 = 1;
        // enters the loop; replaced by the reported total after page one
        let mut total = self.page_size;

        while (items.len() as u64) < total {
            let query = format!("{path}?page={page}&perPage={}", self.page_size);
            let data = self.get_json(&query, path).await?;

            total = data["total"].as_u64().ok_or_else(|| {
                MigrateError::protocol(format!("{path}: response has no total"))
            })?;
            let page_items = data[field].as_array().ok_or_else(|| {
                MigrateError::protocol(format!("{path}: response has no {field}"))
            })?;

            if page_items.is_empty() {
                if page <= total / self.page_size {
                    return Err(MigrateError::protocol(format!(
                        "{path}: page {page} came back empty while total is {total}"
                    )));
                }
                break;
            }

            items.extend(page_items.iter().cloned());
            page += 1;
        }

        debug!("GET {path}: {} item(s)", items.len());
        Ok(items)
    }
}

fn id_of(value: &Value, what: &str) -> Result<ResourceId> {
    value["_id"]
        .as_u64()
        .map(ResourceId)
        .ok_or_else(|| MigrateError::protocol(format!("{what}: response has no _id")))
}

#[async_trait]
impl LoriotApi for LoriotClient {
    async fn find_application(&self, name: &str) -> Result<Option<ResourceId>> {
        let data = self
            .get_json(
                &format!("/1/nwk/apps?filter=name~{name}&page=1&perPage={}", self.page_size),
                "find application",
            )
            .await?;
        let apps = data["apps"]
            .as_array()
            .ok_or_else(|| MigrateError::protocol("application listing has no apps"))?;
        // the filter matches substrings; insist on the exact name
        for app in apps {
            if app["name"].as_str() == Some(name) {
                return Ok(Some(id_of(app, "find application")?));
            }
        }
        Ok(None)
    }

    async fn create_application(&self, name: &str, capacity: usize) -> Result<ResourceId> {
        let body = json!({
            "title": name,
            "capacity": capacity.max(1),
            "visibility": "private",
            "mcastdevlimit": 0,
        });
        let data = self
            .post_json("/1/nwk/apps", &body, "create application")
            .await?;
        id_of(&data, "create application")
    }

    async fn delete_application(&self, app: ResourceId) -> Result<()> {
        self.delete(&format!("/1/nwk/app/{app}"), "delete application")
            .await?;
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>> {
        let items = self.get_paginated("/1/nwk/apps", "apps").await?;
        items
            .iter()
            .map(|app| {
                Ok(ApplicationSummary {
                    id: id_of(app, "list applications")?,
                    name: app["name"].as_str().unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    async fn application_device_count(&self, app: ResourceId) -> Result<u64> {
        let data = self
            .get_json(&format!("/1/nwk/app/{app}"), "get application")
            .await?;
        data["devices"]
            .as_u64()
            .ok_or_else(|| MigrateError::protocol("application has no device count"))
    }

    async fn create_output(&self, app: ResourceId, output: &Output) -> Result<()> {
        let body = serde_json::to_value(output)?;
        self.post_json(&format!("/1/nwk/app/{app}/outputs"), &body, "create output")
            .await?;
        Ok(())
    }

    async fn create_device(&self, app: ResourceId, device: &Device) -> Result<()> {
        let body = serde_json::to_value(device)?;
        self.post_json(
            &format!("/1/nwk/app/{app}/devices/{}", device.activation),
            &body,
            "create device",
        )
        .await?;
        Ok(())
    }

    async fn delete_device(&self, app: ResourceId, dev_eui: &str) -> Result<bool> {
        self.delete(
            &format!("/1/nwk/app/{app}/device/{dev_eui}"),
            "delete device",
        )
        .await
    }

    async fn list_device_euis(&self, app: ResourceId) -> Result<Vec<String>> {
        let items = self
            .get_paginated(&format!("/1/nwk/app/{app}/devices"), "devices")
            .await?;
        Ok(items
            .iter()
            .filter_map(|d| d["_id"].as_str().or_else(|| d["deveui"].as_str()))
            .map(str::to_string)
            .collect())
    }

    async fn find_network(&self, name: &str) -> Result<Option<ResourceId>> {
        // the networks endpoint has no name filter; scan the listing
        Ok(self
            .list_networks()
            .await?
            .into_iter()
            .find(|n| n.name == name)
            .map(|n| n.id))
    }

    async fn create_network(&self, name: &str) -> Result<ResourceId> {
        let body = json!({
            "name": name,
            "visibility": "private",
        });
        let data = self
            .post_json("/1/nwk/networks", &body, "create network")
            .await?;
        id_of(&data, "create network")
    }

    async fn delete_network(&self, net: ResourceId) -> Result<()> {
        self.delete(&format!("/1/nwk/network/{net}"), "delete network")
            .await?;
        Ok(())
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let items = self.get_paginated("/1/nwk/networks", "networks").await?;
        items
            .iter()
            .map(|net| {
                Ok(NetworkSummary {
                    id: id_of(net, "list networks")?,
                    name: net["name"].as_str().unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    async fn network_gateway_count(&self, net: ResourceId) -> Result<u64> {
        let data = self
            .get_json(&format!("/1/nwk/network/{net}"), "get network")
            .await?;
        data["gateways"]
            .as_u64()
            .ok_or_else(|| MigrateError::protocol("network has no gateway count"))
    }

    async fn create_gateway(&self, net: ResourceId, gateway: &Gateway) -> Result<()> {
        let body = serde_json::to_value(gateway)?;
        self.post_json(
            &format!("/1/nwk/network/{net}/gateways"),
            &body,
            "create gateway",
        )
        .await?;
        Ok(())
    }

    async fn delete_gateway(&self, net: ResourceId, gateway_id: &str) -> Result<bool> {
        self.delete(
            &format!("/1/nwk/network/{net}/gateway/{gateway_id}"),
            "delete gateway",
        )
        .await
    }

    async fn list_gateways(&self, net: ResourceId) -> Result<Vec<GatewaySummary>> {
        let items = self
            .get_paginated(&format!("/1/nwk/network/{net}/gateways"), "gateways")
            .await?;
        Ok(items
            .iter()
            .filter_map(|g| {
                let id = g["_id"].as_str()?.to_string();
                let mac = g["MAC"].as_str().unwrap_or_default().to_string();
                Some(GatewaySummary { id, mac })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> LoriotClient {
        LoriotClient::new(&server.uri(), "Bearer test-token").unwrap()
    }

    #[tokio::test]
    async fn find_application_requires_an_exact_name_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/nwk/apps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 2,
                "apps": [
                    { "_id": 0xBEEFu64, "name": "Farm extended" },
                    { "_id": 0xCAFEu64, "name": "Farm" },
                ]
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let id = client.find_application("Farm").await.unwrap();
        assert_eq!(id, Some(ResourceId(0xCAFE)));

        let missing = client.find_application("Orchard").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn deleting_an_absent_device_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/1/nwk/app/CAFE/device/1A2B3C4D5E6F7081"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let existed = client
            .delete_device(ResourceId(0xCAFE), "1A2B3C4D5E6F7081")
            .await
            .unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    async fn listing_walks_every_page_once() {
        let server = MockServer::start().await;
        let apps = |range: std::ops::Range<u64>| -> Vec<Value> {
            range
                .map(|i| serde_json::json!({ "_id": i + 1, "name": format!("app-{i}") }))
                .collect()
        };

        for (page, items) in [(1u64, apps(0..10)), (2, apps(10..20)), (3, apps(20..25))] {
            Mock::given(method("GET"))
                .and(path("/1/nwk/apps"))
                .and(query_param("page", page.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "total": 25,
                    "apps": items,
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client(&server).await.with_page_size(10);
        let listed = client.list_applications().await.unwrap();
        assert_eq!(listed.len(), 25);
        assert_eq!(listed[24].name, "app-24");
    }

    #[tokio::test]
    async fn empty_page_inside_the_range_is_a_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/nwk/apps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 25,
                "apps": [],
            })))
            .mount(&server)
            .await;

        let client = client(&server).await.with_page_size(10);
        let err = client.list_applications().await.unwrap_err();
        assert!(matches!(err, MigrateError::Protocol(_)));
    }

    #[tokio::test]
    async fn device_creation_targets_the_activation_endpoint() {
        use crate::model::{ActivationMode, DeviceClass, LorawanVersion};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/nwk/app/CAFE/devices/OTAA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let device = Device {
            title: "sensor".to_string(),
            description: None,
            dev_eui: "1A2B3C4D5E6F7081".to_string(),
            device_class: DeviceClass::A,
            lorawan_version: LorawanVersion::V1_0,
            activation: ActivationMode::Otaa,
            app_key: Some("0".repeat(32)),
            join_eui: Some("0".repeat(16)),
            dev_addr: None,
            nwk_s_key: None,
            app_s_key: None,
            adr_enabled: true,
            rx_window: 1,
            rx1_delay: 1,
            seqno: 0,
            seqdn: 0,
            seqq: 0,
        };

        let client = client(&server).await;
        client
            .create_device(ResourceId(0xCAFE), &device)
            .await
            .unwrap();
    }
}
