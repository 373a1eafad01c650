//! Provider-native CSV records for the Kerlink WMC export
//!
//! Every cell arrives as a string; coercion happens here through the shared
//! deserializers. Hex identity fields (EUIs, DevAddr, keys) deliberately stay
//! strings so a value like `1e240` is never turned into a number.

use common::serde_helpers::{de_bool, de_opt_bool, de_opt_f64, de_opt_string, de_opt_u32};
use serde::Deserialize;

/// Row of `devices.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct KerlinkDeviceRecord {
    #[serde(rename = "clusterId")]
    pub cluster_id: i64,
    #[serde(rename = "clusterName", deserialize_with = "de_opt_string", default)]
    pub cluster_name: Option<String>,
    #[serde(rename = "devEui")]
    pub dev_eui: String,
    #[serde(deserialize_with = "de_opt_string", default)]
    pub name: Option<String>,
    #[serde(rename = "classType")]
    pub class_type: String,
    #[serde(rename = "macVersion")]
    pub mac_version: String,
    #[serde(rename = "adrEnabled", deserialize_with = "de_opt_bool", default)]
    pub adr_enabled: Option<bool>,
    pub activation: String,
    #[serde(rename = "appEui", deserialize_with = "de_opt_string", default)]
    pub app_eui: Option<String>,
    #[serde(rename = "appKey", deserialize_with = "de_opt_string", default)]
    pub app_key: Option<String>,
    #[serde(rename = "fcntDown", deserialize_with = "de_opt_u32", default)]
    pub fcnt_down: Option<u32>,
    #[serde(rename = "fcntUp", deserialize_with = "de_opt_u32", default)]
    pub fcnt_up: Option<u32>,
    #[serde(rename = "rx1Delay", deserialize_with = "de_opt_u32", default)]
    pub rx1_delay: Option<u32>,
    #[serde(rename = "rxWindows", deserialize_with = "de_opt_string", default)]
    pub rx_windows: Option<String>,
    #[serde(rename = "dev_addr", deserialize_with = "de_opt_string", default)]
    pub dev_addr: Option<String>,
    #[serde(rename = "NwkSKey", deserialize_with = "de_opt_string", default)]
    pub nwk_s_key: Option<String>,
    #[serde(rename = "AppSKey", deserialize_with = "de_opt_string", default)]
    pub app_s_key: Option<String>,
}

/// Row of `pushConfigurations.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct KerlinkPushConfigurationRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "msgDetailLevel")]
    pub msg_detail_level: String,

    // HTTP / WebSocket
    #[serde(deserialize_with = "de_opt_string", default)]
    pub url: Option<String>,
    #[serde(deserialize_with = "de_opt_string", default)]
    pub user: Option<String>,
    #[serde(deserialize_with = "de_opt_string", default)]
    pub password: Option<String>,
    /// JSON-encoded list of `{key, value}` pairs.
    #[serde(deserialize_with = "de_opt_string", default)]
    pub headers: Option<String>,
    #[serde(rename = "httpDataUpRoute", deserialize_with = "de_opt_string", default)]
    pub http_data_up_route: Option<String>,
    #[serde(
        rename = "httpDataDownEventRoute",
        deserialize_with = "de_opt_string",
        default
    )]
    pub http_data_down_event_route: Option<String>,

    // MQTT
    #[serde(rename = "mqttHost", deserialize_with = "de_opt_string", default)]
    pub mqtt_host: Option<String>,
    #[serde(rename = "mqttPort", deserialize_with = "de_opt_u32", default)]
    pub mqtt_port: Option<u32>,
    #[serde(rename = "mqttTlsEnabled", deserialize_with = "de_bool", default)]
    pub mqtt_tls_enabled: bool,
    #[serde(rename = "mqttClientId", deserialize_with = "de_opt_string", default)]
    pub mqtt_client_id: Option<String>,
    #[serde(
        rename = "mqttConnectionTimeout",
        deserialize_with = "de_opt_u32",
        default
    )]
    pub mqtt_connection_timeout: Option<u32>,
    #[serde(rename = "mqttKeepAlive", deserialize_with = "de_opt_u32", default)]
    pub mqtt_keep_alive: Option<u32>,
    #[serde(rename = "mqttCleanSession", deserialize_with = "de_bool", default)]
    pub mqtt_clean_session: bool,
    #[serde(rename = "mqttQoS", deserialize_with = "de_opt_u32", default)]
    pub mqtt_qos: Option<u32>,
    #[serde(rename = "mqttDataUpTopic", deserialize_with = "de_opt_string", default)]
    pub mqtt_data_up_topic: Option<String>,
    #[serde(
        rename = "mqttDataDownEventTopic",
        deserialize_with = "de_opt_string",
        default
    )]
    pub mqtt_data_down_event_topic: Option<String>,
    #[serde(rename = "mqttWillTopic", deserialize_with = "de_opt_string", default)]
    pub mqtt_will_topic: Option<String>,
    #[serde(rename = "mqttWillPayload", deserialize_with = "de_opt_string", default)]
    pub mqtt_will_payload: Option<String>,
    #[serde(rename = "mqttWillQoS", deserialize_with = "de_opt_u32", default)]
    pub mqtt_will_qos: Option<u32>,
}

/// Row of `clusters.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct KerlinkClusterRecord {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "de_bool", default)]
    pub hexa: bool,
    /// JSON-encoded reference: `{"id": .., "links": [..]}`.
    #[serde(
        rename = "pushConfiguration",
        deserialize_with = "de_opt_string",
        default
    )]
    pub push_configuration: Option<String>,
}

/// Embedded JSON reference inside the cluster row.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfigurationRef {
    pub id: i64,
}

/// Row of `fleets.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct KerlinkFleetRecord {
    pub id: i64,
    pub name: String,
    /// JSON-encoded customer: `{"id": .., "name": ..}`.
    #[serde(deserialize_with = "de_opt_string", default)]
    pub customer: Option<String>,
}

/// Embedded JSON customer inside the fleet row.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRef {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Row of `gateways.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct KerlinkGatewayRecord {
    #[serde(rename = "eth0MAC", deserialize_with = "de_opt_string", default)]
    pub eth0_mac: Option<String>,
    pub eui: String,
    #[serde(rename = "fleetId")]
    pub fleet_id: i64,
    #[serde(rename = "fleetName", deserialize_with = "de_opt_string", default)]
    pub fleet_name: Option<String>,
    pub name: String,
    #[serde(rename = "brandName", deserialize_with = "de_opt_string", default)]
    pub brand_name: Option<String>,
    #[serde(deserialize_with = "de_opt_string", default)]
    pub region: Option<String>,
    #[serde(deserialize_with = "de_opt_string", default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    pub longitude: Option<f64>,
}
