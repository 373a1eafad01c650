//! Canonical intermediate model
//!
//! Both source readers translate their provider-native records into these
//! types; the sync engine consumes them and nothing else. Serde renames
//! produce exactly the LORIOT request bodies, so a translated entity can be
//! POSTed as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A LORIOT application together with the outputs and devices it owns.
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub name: String,
    pub outputs: Vec<Output>,
    pub devices: Vec<Device>,
}

/// Device class; only A and C exist on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceClass {
    A,
    C,
}

/// LoRaWAN protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LorawanVersion {
    #[serde(rename = "v1.0")]
    V1_0,
    #[serde(rename = "v1.1")]
    V1_1,
}

/// Activation mode; selects the device-creation endpoint on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivationMode {
    #[serde(rename = "OTAA")]
    Otaa,
    #[serde(rename = "ABP")]
    Abp,
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationMode::Otaa => write!(f, "OTAA"),
            ActivationMode::Abp => write!(f, "ABP"),
        }
    }
}

/// A device in destination shape.
///
/// Invariants are enforced at translation time: OTAA devices carry
/// `join_eui` + `app_key`, ABP devices carry `dev_addr` + `nwk_s_key`.
/// All hex fields are already normalized (left-zero-padded, uppercase).
/// `seqdn` is the NEXT downlink counter the destination will use, i.e. the
/// source's last-used value incremented by one when nonzero.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "deveui")]
    pub dev_eui: String,
    #[serde(rename = "devclass")]
    pub device_class: DeviceClass,
    #[serde(rename = "devVersion")]
    pub lorawan_version: LorawanVersion,
    #[serde(rename = "devActivation")]
    pub activation: ActivationMode,
    #[serde(rename = "appkey", skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(rename = "appeui", skip_serializing_if = "Option::is_none")]
    pub join_eui: Option<String>,
    #[serde(rename = "devaddr", skip_serializing_if = "Option::is_none")]
    pub dev_addr: Option<String>,
    #[serde(rename = "nwkskey", skip_serializing_if = "Option::is_none")]
    pub nwk_s_key: Option<String>,
    #[serde(rename = "appskey", skip_serializing_if = "Option::is_none")]
    pub app_s_key: Option<String>,
    #[serde(rename = "canSendADR")]
    pub adr_enabled: bool,
    #[serde(rename = "rxw")]
    pub rx_window: u8,
    #[serde(rename = "rx1Delay")]
    pub rx1_delay: u8,
    #[serde(rename = "seqno")]
    pub seqno: u32,
    #[serde(rename = "seqdn")]
    pub seqdn: u32,
    #[serde(rename = "seqq")]
    pub seqq: u32,
}

/// Message verbosity of a Kerlink-compatible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputVerbosity {
    Payload,
    Radio,
    Network,
}

/// Payload encoding of a Kerlink-compatible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputEncoding {
    Hexa,
    Base64,
}

/// One `key`/`value` custom header forwarded with pushed data.
/// `Deserialize` because Kerlink embeds these as a JSON cell in the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomHeader {
    pub key: String,
    pub value: String,
}

/// Data-delivery output, tagged the way the destination expects it:
/// `{ "output": "<adapter>", "osetup": { ... } }`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "output", content = "osetup")]
pub enum Output {
    /// Plain HTTP push (used for ChirpStack HTTP integrations).
    #[serde(rename = "httppush")]
    HttpPush { name: String, url: String },

    /// Kerlink-compatible HTTP push.
    #[serde(rename = "kerlink_http")]
    KerlinkHttp {
        name: String,
        verbosity: OutputVerbosity,
        encoding: OutputEncoding,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(rename = "dataup_route", skip_serializing_if = "Option::is_none")]
        dataup_route: Option<String>,
        #[serde(
            rename = "datadownevent_route",
            skip_serializing_if = "Option::is_none"
        )]
        datadownevent_route: Option<String>,
        #[serde(rename = "custom_headers", skip_serializing_if = "Vec::is_empty")]
        custom_headers: Vec<CustomHeader>,
    },

    /// Kerlink-compatible WebSocket push.
    #[serde(rename = "kerlink_websocket")]
    KerlinkWebsocket {
        name: String,
        verbosity: OutputVerbosity,
        encoding: OutputEncoding,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(rename = "custom_headers", skip_serializing_if = "Vec::is_empty")]
        custom_headers: Vec<CustomHeader>,
    },

    /// Kerlink-compatible MQTT push.
    #[serde(rename = "kerlink_mqtt")]
    KerlinkMqtt {
        name: String,
        verbosity: OutputVerbosity,
        encoding: OutputEncoding,
        host: String,
        port: u16,
        #[serde(rename = "clientid", skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
        timeout: u32,
        keepalive: u32,
        tls: u8,
        clean: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(rename = "dataup_topic", skip_serializing_if = "Option::is_none")]
        dataup_topic: Option<String>,
        #[serde(
            rename = "datadownevent_topic",
            skip_serializing_if = "Option::is_none"
        )]
        datadownevent_topic: Option<String>,
        qos: u8,
        #[serde(rename = "will_topic", skip_serializing_if = "Option::is_none")]
        will_topic: Option<String>,
        #[serde(rename = "will_payload", skip_serializing_if = "Option::is_none")]
        will_payload: Option<String>,
        #[serde(rename = "will_qos", skip_serializing_if = "Option::is_none")]
        will_qos: Option<u8>,
    },
}

impl Output {
    /// Output name, used as the log key for per-output errors.
    pub fn name(&self) -> &str {
        match self {
            Output::HttpPush { name, .. }
            | Output::KerlinkHttp { name, .. }
            | Output::KerlinkWebsocket { name, .. }
            | Output::KerlinkMqtt { name, .. } => name,
        }
    }
}

/// A LORIOT network grouping the gateways it owns.
#[derive(Debug, Clone, Serialize)]
pub struct Network {
    pub name: String,
    pub gateways: Vec<Gateway>,
}

/// Gateway position.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Hardware profile selected by model inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareProfile {
    pub base: String,
    pub bus: String,
    pub card: String,
    pub concentrator: String,
    pub model: String,
}

/// A gateway in destination shape.
#[derive(Debug, Clone, Serialize)]
pub struct Gateway {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "customEUI", skip_serializing_if = "Option::is_none")]
    pub custom_eui: Option<String>,
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub location: Location,
    #[serde(flatten)]
    pub hardware: HardwareProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_serializes_with_adapter_tag() {
        let out = Output::HttpPush {
            name: "HTTP".to_string(),
            url: "https://example.com/uplink".to_string(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["output"], "httppush");
        assert_eq!(json["osetup"]["url"], "https://example.com/uplink");
    }

    #[test]
    fn device_serializes_to_destination_field_names() {
        let dev = Device {
            title: "sensor".to_string(),
            description: None,
            dev_eui: "0004A30B001C0530".to_string(),
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
        let json = serde_json::to_value(&dev).unwrap();
        assert_eq!(json["deveui"], "0004A30B001C0530");
        assert_eq!(json["devVersion"], "v1.0");
        assert_eq!(json["devActivation"], "OTAA");
        assert_eq!(json["canSendADR"], true);
        assert!(json.get("devaddr").is_none());
    }
}
