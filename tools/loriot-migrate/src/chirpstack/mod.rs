//! ChirpStack v4 source: reads applications, devices and gateways over gRPC.
//!
//! Listings are paginated with a fixed page size and terminated against the
//! server-reported total. Each listed device is enriched with three extra
//! calls (detail, activation, root keys) plus a cached device-profile lookup
//! before translation.

pub mod api;
mod grpc;
mod proto;

use crate::error::{MigrateError, Result};
use crate::model::{
    ActivationMode, Application, Device, DeviceClass, Gateway, Location, LorawanVersion, Network,
    Output,
};
use crate::translate::{
    basics_station_profile, eui_to_mac, next_downlink_counter, normalize_hex, rx_window,
    translate_region, truncate_title, DEVADDR_WIDTH, EUI_WIDTH, KEY_WIDTH,
};
use api::{
    ActivationDetail, ChirpstackApi, DeviceDetail, GatewayItem, KeysDetail, ProfileDetail,
};
use std::collections::HashMap;
use tracing::{info, warn};

pub use grpc::ChirpstackGrpc;

/// Page size for every paginated listing.
const PAGE_LIMIT: u32 = 10;

/// ChirpStack exposes no per-gateway channel plan over the listing API.
const DEFAULT_REGION: &str = "EU868";

// Fallback position when a gateway has no location.
const DEFAULT_LATITUDE: f64 = 46.8076885;
const DEFAULT_LONGITUDE: f64 = 7.100528;

/// Reads a ChirpStack instance through a [`ChirpstackApi`] implementation.
pub struct GrpcSourceReader<A> {
    api: A,
    profile_cache: HashMap<String, ProfileDetail>,
}

impl<A: ChirpstackApi + Send> GrpcSourceReader<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            profile_cache: HashMap::new(),
        }
    }

    /// Load every application with its devices and HTTP integration.
    pub async fn load_applications(&mut self) -> Result<Vec<Application>> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.api.list_applications(PAGE_LIMIT, offset).await?;
            let total = page.total as usize;
            let received = page.items.len();
            items.extend(page.items);
            if items.len() >= total {
                break;
            }
            if received == 0 {
                return Err(MigrateError::protocol(format!(
                    "application listing returned an empty page at offset {offset} \
                     while total is {total}"
                )));
            }
            offset += PAGE_LIMIT;
        }
        info!("Found {} application(s)", items.len());

        let mut applications = Vec::new();
        for item in items {
            let devices = self.load_devices(&item.id, &item.name).await?;
            let outputs = self.load_outputs(&item.id).await?;
            applications.push(Application {
                name: item.name,
                outputs,
                devices,
            });
        }
        Ok(applications)
    }

    async fn load_devices(&mut self, application_id: &str, app_name: &str) -> Result<Vec<Device>> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .api
                .list_devices(application_id, PAGE_LIMIT, offset)
                .await?;
            let total = page.total as usize;
            let received = page.items.len();
            items.extend(page.items);
            if items.len() >= total {
                break;
            }
            if received == 0 {
                return Err(MigrateError::protocol(format!(
                    "device listing for {application_id} returned an empty page at \
                     offset {offset} while total is {total}"
                )));
            }
            offset += PAGE_LIMIT;
        }

        let mut devices = Vec::new();
        for item in items {
            match self.enrich_and_translate(&item.dev_eui).await {
                Ok(device) => devices.push(device),
                Err(err) => warn!(
                    "[{}][DEV][{}] Skipping device: {}",
                    app_name, item.dev_eui, err
                ),
            }
        }
        Ok(devices)
    }

    async fn enrich_and_translate(&mut self, dev_eui: &str) -> Result<Device> {
        let detail = self.api.get_device(dev_eui).await?;
        let activation = self.api.get_activation(dev_eui).await?;
        let keys = self.api.get_keys(dev_eui).await?;

        let profile = match self.profile_cache.get(&detail.device_profile_id) {
            Some(profile) => profile.clone(),
            None => {
                let profile = self.api.get_device_profile(&detail.device_profile_id).await?;
                self.profile_cache
                    .insert(detail.device_profile_id.clone(), profile.clone());
                profile
            }
        };

        translate_device(&detail, activation.as_ref(), keys.as_ref(), &profile)
    }

    async fn load_outputs(&mut self, application_id: &str) -> Result<Vec<Output>> {
        let integration = self.api.get_http_integration(application_id).await?;
        Ok(integration
            .filter(|i| !i.event_endpoint_url.is_empty())
            .map(|i| Output::HttpPush {
                name: "HTTP".to_string(),
                url: i.event_endpoint_url,
            })
            .into_iter()
            .collect())
    }

    /// Load all gateways into a single network named after the source.
    pub async fn load_networks(&mut self) -> Result<Vec<Network>> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.api.list_gateways(PAGE_LIMIT, offset).await?;
            let total = page.total as usize;
            let received = page.items.len();
            items.extend(page.items);
            if items.len() >= total {
                break;
            }
            if received == 0 {
                return Err(MigrateError::protocol(format!(
                    "gateway listing returned an empty page at offset {offset} \
                     while total is {total}"
                )));
            }
            offset += PAGE_LIMIT;
        }

        let mut gateways = Vec::new();
        for item in &items {
            match translate_gateway(item) {
                Ok(gateway) => gateways.push(gateway),
                Err(err) => warn!(
                    "[Chirpstack][GW][{}] Skipping gateway: {}",
                    item.gateway_id, err
                ),
            }
        }
        info!("Loaded {} gateway(s)", gateways.len());

        Ok(vec![Network {
            name: "Chirpstack".to_string(),
            gateways,
        }])
    }
}

fn translate_device(
    detail: &DeviceDetail,
    activation: Option<&ActivationDetail>,
    keys: Option<&KeysDetail>,
    profile: &ProfileDetail,
) -> Result<Device> {
    let device_class = if profile.supports_class_c {
        DeviceClass::C
    } else {
        DeviceClass::A
    };
    let lorawan_version = mac_version_from_index(profile.mac_version_index)?;
    let activation_mode = if profile.supports_otaa {
        ActivationMode::Otaa
    } else {
        ActivationMode::Abp
    };

    let dev_eui = normalize_hex(&detail.dev_eui, EUI_WIDTH)?;

    let (app_key, join_eui, dev_addr, nwk_s_key, app_s_key) = match activation_mode {
        ActivationMode::Otaa => {
            // LoRaWAN 1.0 stores the single root key in nwk_key.
            let root_key = keys
                .map(|k| if k.nwk_key.is_empty() { &k.app_key } else { &k.nwk_key })
                .filter(|k| !k.is_empty())
                .ok_or_else(|| MigrateError::validation("OTAA device without root key"))?;
            if detail.join_eui.is_empty() {
                return Err(MigrateError::validation("OTAA device without joinEui"));
            }
            (
                Some(normalize_hex(root_key, KEY_WIDTH)?),
                Some(normalize_hex(&detail.join_eui, EUI_WIDTH)?),
                None,
                None,
                None,
            )
        }
        ActivationMode::Abp => {
            let activation = activation
                .ok_or_else(|| MigrateError::validation("ABP device without activation"))?;
            (
                None,
                None,
                Some(normalize_hex(&activation.dev_addr, DEVADDR_WIDTH)?),
                Some(normalize_hex(&activation.nwk_s_enc_key, KEY_WIDTH)?),
                if activation.app_s_key.is_empty() {
                    None
                } else {
                    Some(normalize_hex(&activation.app_s_key, KEY_WIDTH)?)
                },
            )
        }
    };

    let raw_title = if detail.name.is_empty() {
        dev_eui.clone()
    } else {
        detail.name.clone()
    };
    let (title, truncated) = truncate_title(raw_title);
    let description = truncated.or_else(|| {
        if detail.description.is_empty() {
            None
        } else {
            Some(detail.description.clone())
        }
    });

    Ok(Device {
        title,
        description,
        dev_eui,
        device_class,
        lorawan_version,
        activation: activation_mode,
        app_key,
        join_eui,
        dev_addr,
        nwk_s_key,
        app_s_key,
        adr_enabled: true,
        rx_window: rx_window(None, device_class),
        rx1_delay: 1,
        seqno: activation.map_or(0, |a| a.f_cnt_up),
        seqdn: next_downlink_counter(activation.map_or(0, |a| a.n_f_cnt_down)),
        seqq: 0,
    })
}

/// ChirpStack encodes the MAC version as an enum index: 0..=4 are the 1.0.x
/// releases, 5 is 1.1.0.
fn mac_version_from_index(index: i32) -> Result<LorawanVersion> {
    match index {
        0..=4 => Ok(LorawanVersion::V1_0),
        5 => Ok(LorawanVersion::V1_1),
        other => Err(MigrateError::Validation(format!(
            "unknown macVersion index {other}"
        ))),
    }
}

fn translate_gateway(item: &GatewayItem) -> Result<Gateway> {
    let custom_eui = normalize_hex(&item.gateway_id, EUI_WIDTH)?;
    let mac = eui_to_mac(&item.gateway_id)?;

    let raw_title = if item.name.is_empty() {
        custom_eui.clone()
    } else {
        item.name.clone()
    };
    let (title, truncated) = truncate_title(raw_title);
    let notes = truncated.or_else(|| {
        if item.description.is_empty() {
            None
        } else {
            Some(item.description.clone())
        }
    });

    Ok(Gateway {
        title,
        notes,
        custom_eui: Some(custom_eui),
        mac,
        region: translate_region(DEFAULT_REGION).map(str::to_string),
        location: Location {
            lat: item.latitude.unwrap_or(DEFAULT_LATITUDE),
            lon: item.longitude.unwrap_or(DEFAULT_LONGITUDE),
        },
        hardware: basics_station_profile(),
    })
}
