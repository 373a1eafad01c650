//! Kerlink clusters → applications
//!
//! Joins `devices.csv`, `pushConfigurations.csv` and `clusters.csv` into
//! destination-shaped applications. A translation failure is contained at the
//! failing device or output; the rest of the cluster still migrates.

use crate::error::{MigrateError, Result};
use crate::model::{
    ActivationMode, Application, CustomHeader, Device, DeviceClass, Output, OutputEncoding,
    OutputVerbosity,
};
use crate::translate::{
    next_downlink_counter, normalize_hex, parse_mac_version, rx_window, truncate_title,
    DEVADDR_WIDTH, EUI_WIDTH, KEY_WIDTH,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::records::{
    KerlinkClusterRecord, KerlinkDeviceRecord, KerlinkPushConfigurationRecord, PushConfigurationRef,
};

const MQTT_DEFAULT_PORT: u16 = 1883;
const MQTT_DEFAULT_TIMEOUT: u32 = 30;
const MQTT_DEFAULT_KEEPALIVE: u32 = 30;
const MQTT_DEFAULT_QOS: u32 = 0;

/// A cluster joined to its devices and push configurations, before
/// translation.
struct JoinedCluster {
    record: KerlinkClusterRecord,
    devices: Vec<KerlinkDeviceRecord>,
    push_configurations: Vec<KerlinkPushConfigurationRecord>,
}

/// Build applications from the loaded CSV rows.
///
/// When `clusters.csv` is absent, clusters are synthesized from the
/// `clusterId`/`clusterName` columns of the device rows, with push disabled
/// and binary payload encoding.
pub fn build_applications(
    devices: Vec<KerlinkDeviceRecord>,
    push_configurations: Vec<KerlinkPushConfigurationRecord>,
    clusters: Vec<KerlinkClusterRecord>,
) -> Vec<Application> {
    let clusters = if clusters.is_empty() {
        synthesize_clusters(&devices)
    } else {
        clusters
    };

    clusters
        .into_iter()
        .map(|cluster| join_cluster(cluster, &devices, &push_configurations))
        .map(translate_cluster)
        .collect()
}

/// Recover cluster rows from the device rows when the cluster export is
/// missing. Push stays disabled since there is no configuration to wire up.
fn synthesize_clusters(devices: &[KerlinkDeviceRecord]) -> Vec<KerlinkClusterRecord> {
    let mut by_id: BTreeMap<i64, KerlinkClusterRecord> = BTreeMap::new();
    for device in devices {
        by_id
            .entry(device.cluster_id)
            .or_insert_with(|| KerlinkClusterRecord {
                id: device.cluster_id,
                name: device
                    .cluster_name
                    .clone()
                    .unwrap_or_else(|| format!("Cluster {}", device.cluster_id)),
                hexa: false,
                push_configuration: None,
            });
    }
    info!(
        "Synthesized {} cluster(s) from device rows",
        by_id.len()
    );
    by_id.into_values().collect()
}

fn join_cluster(
    record: KerlinkClusterRecord,
    devices: &[KerlinkDeviceRecord],
    push_configurations: &[KerlinkPushConfigurationRecord],
) -> JoinedCluster {
    let cluster_devices: Vec<_> = devices
        .iter()
        .filter(|d| d.cluster_id == record.id)
        .cloned()
        .collect();

    // The cluster row carries a JSON reference to its push configuration.
    let configuration_id = record
        .push_configuration
        .as_deref()
        .and_then(|raw| match serde_json::from_str::<PushConfigurationRef>(raw) {
            Ok(reference) => Some(reference.id),
            Err(err) => {
                warn!(
                    "[{}] Ignoring unparseable pushConfiguration cell: {}",
                    record.name, err
                );
                None
            }
        });

    let cluster_configurations: Vec<_> = push_configurations
        .iter()
        .filter(|c| Some(c.id) == configuration_id)
        .cloned()
        .collect();

    JoinedCluster {
        record,
        devices: cluster_devices,
        push_configurations: cluster_configurations,
    }
}

fn translate_cluster(cluster: JoinedCluster) -> Application {
    let encoding = if cluster.record.hexa {
        OutputEncoding::Hexa
    } else {
        OutputEncoding::Base64
    };

    let mut outputs = Vec::new();
    for configuration in &cluster.push_configurations {
        match translate_push_configuration(configuration, encoding) {
            Ok(output) => outputs.push(output),
            Err(err) => warn!(
                "[{}][OUT][{}] Skipping output: {}",
                cluster.record.name, configuration.name, err
            ),
        }
    }

    let mut devices = Vec::new();
    for record in &cluster.devices {
        match translate_device(record) {
            Ok(device) => devices.push(device),
            Err(err) => warn!(
                "[{}][DEV][{}] Skipping device: {}",
                cluster.record.name, record.dev_eui, err
            ),
        }
    }

    Application {
        name: cluster.record.name,
        outputs,
        devices,
    }
}

/// Translate one device row into destination shape. Any failed invariant is a
/// per-device error; the caller skips the row.
pub fn translate_device(record: &KerlinkDeviceRecord) -> Result<Device> {
    let device_class = match record.class_type.trim().to_ascii_uppercase().as_str() {
        "A" => DeviceClass::A,
        "C" => DeviceClass::C,
        other => {
            return Err(MigrateError::Validation(format!(
                "unsupported device class {other:?}"
            )))
        }
    };

    let activation = match record.activation.trim().to_ascii_uppercase().as_str() {
        "OTAA" => ActivationMode::Otaa,
        "ABP" => ActivationMode::Abp,
        other => {
            return Err(MigrateError::Validation(format!(
                "unsupported activation {other:?}"
            )))
        }
    };

    let dev_eui = normalize_hex(&record.dev_eui, EUI_WIDTH)?;
    let lorawan_version = parse_mac_version(&record.mac_version)?;

    let (app_key, join_eui, dev_addr, nwk_s_key, app_s_key) = match activation {
        ActivationMode::Otaa => {
            let join_eui = record
                .app_eui
                .as_deref()
                .ok_or_else(|| MigrateError::validation("OTAA device without appEui"))?;
            let app_key = record
                .app_key
                .as_deref()
                .ok_or_else(|| MigrateError::validation("OTAA device without appKey"))?;
            (
                Some(normalize_hex(app_key, KEY_WIDTH)?),
                Some(normalize_hex(join_eui, EUI_WIDTH)?),
                record
                    .dev_addr
                    .as_deref()
                    .map(|v| normalize_hex(v, DEVADDR_WIDTH))
                    .transpose()?,
                record
                    .nwk_s_key
                    .as_deref()
                    .map(|v| normalize_hex(v, KEY_WIDTH))
                    .transpose()?,
                record
                    .app_s_key
                    .as_deref()
                    .map(|v| normalize_hex(v, KEY_WIDTH))
                    .transpose()?,
            )
        }
        ActivationMode::Abp => {
            let dev_addr = record
                .dev_addr
                .as_deref()
                .ok_or_else(|| MigrateError::validation("ABP device without dev_addr"))?;
            let nwk_s_key = record
                .nwk_s_key
                .as_deref()
                .ok_or_else(|| MigrateError::validation("ABP device without NwkSKey"))?;
            (
                None,
                None,
                Some(normalize_hex(dev_addr, DEVADDR_WIDTH)?),
                Some(normalize_hex(nwk_s_key, KEY_WIDTH)?),
                record
                    .app_s_key
                    .as_deref()
                    .map(|v| normalize_hex(v, KEY_WIDTH))
                    .transpose()?,
            )
        }
    };

    let (title, description) = truncate_title(
        record
            .name
            .clone()
            .unwrap_or_else(|| dev_eui.clone()),
    );

    Ok(Device {
        title,
        description,
        dev_eui,
        device_class,
        lorawan_version,
        activation,
        app_key,
        join_eui,
        dev_addr,
        nwk_s_key,
        app_s_key,
        adr_enabled: record.adr_enabled.unwrap_or(true),
        rx_window: rx_window(record.rx_windows.as_deref(), device_class),
        rx1_delay: record.rx1_delay.unwrap_or(1).min(u32::from(u8::MAX)) as u8,
        seqno: record.fcnt_up.unwrap_or(0),
        seqdn: next_downlink_counter(record.fcnt_down.unwrap_or(0)),
        seqq: 0,
    })
}

/// Translate one push configuration into the matching destination output.
pub fn translate_push_configuration(
    record: &KerlinkPushConfigurationRecord,
    encoding: OutputEncoding,
) -> Result<Output> {
    let verbosity = match record.msg_detail_level.trim().to_ascii_uppercase().as_str() {
        "PAYLOAD" => OutputVerbosity::Payload,
        "RADIO" => OutputVerbosity::Radio,
        "NETWORK" => OutputVerbosity::Network,
        other => {
            return Err(MigrateError::Validation(format!(
                "unsupported msgDetailLevel {other:?}"
            )))
        }
    };

    let custom_headers: Vec<CustomHeader> = match record.headers.as_deref() {
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            MigrateError::Validation(format!("unparseable headers cell: {e}"))
        })?,
        None => Vec::new(),
    };

    match record.kind.trim().to_ascii_uppercase().as_str() {
        "HTTP" => Ok(Output::KerlinkHttp {
            name: record.name.clone(),
            verbosity,
            encoding,
            url: record
                .url
                .clone()
                .ok_or_else(|| MigrateError::validation("HTTP push without url"))?,
            user: record.user.clone(),
            password: record.password.clone(),
            dataup_route: record.http_data_up_route.clone(),
            datadownevent_route: record.http_data_down_event_route.clone(),
            custom_headers,
        }),
        "WEBSOCKET" => Ok(Output::KerlinkWebsocket {
            name: record.name.clone(),
            verbosity,
            encoding,
            url: record
                .url
                .clone()
                .ok_or_else(|| MigrateError::validation("WebSocket push without url"))?,
            user: record.user.clone(),
            password: record.password.clone(),
            custom_headers,
        }),
        "MQTT" => Ok(Output::KerlinkMqtt {
            name: record.name.clone(),
            verbosity,
            encoding,
            host: record
                .mqtt_host
                .clone()
                .ok_or_else(|| MigrateError::validation("MQTT push without mqttHost"))?,
            port: record
                .mqtt_port
                .unwrap_or(u32::from(MQTT_DEFAULT_PORT))
                .try_into()
                .map_err(|_| MigrateError::validation("mqttPort out of range"))?,
            client_id: record.mqtt_client_id.clone(),
            timeout: record.mqtt_connection_timeout.unwrap_or(MQTT_DEFAULT_TIMEOUT),
            keepalive: record.mqtt_keep_alive.unwrap_or(MQTT_DEFAULT_KEEPALIVE),
            tls: u8::from(record.mqtt_tls_enabled),
            clean: u8::from(record.mqtt_clean_session),
            user: record.user.clone(),
            password: record.password.clone(),
            dataup_topic: record.mqtt_data_up_topic.clone(),
            datadownevent_topic: record.mqtt_data_down_event_topic.clone(),
            qos: record
                .mqtt_qos
                .unwrap_or(MQTT_DEFAULT_QOS)
                .try_into()
                .map_err(|_| MigrateError::validation("mqttQoS out of range"))?,
            will_topic: record.mqtt_will_topic.clone(),
            will_payload: record.mqtt_will_payload.clone(),
            will_qos: record
                .mqtt_will_qos
                .map(u8::try_from)
                .transpose()
                .map_err(|_| MigrateError::validation("mqttWillQoS out of range"))?,
        }),
        other => Err(MigrateError::Validation(format!(
            "unsupported push configuration type {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otaa_record() -> KerlinkDeviceRecord {
        KerlinkDeviceRecord {
            cluster_id: 7,
            cluster_name: Some("Farm".to_string()),
            dev_eui: "1a2b3c4d5e6f7081".to_string(),
            name: Some("soil-probe".to_string()),
            class_type: "A".to_string(),
            mac_version: "1.0.3".to_string(),
            adr_enabled: None,
            activation: "OTAA".to_string(),
            app_eui: Some("70b3d57ed0000000".to_string()),
            app_key: Some("2b7e151628aed2a6abf7158809cf4f3c".to_string()),
            fcnt_down: Some(41),
            fcnt_up: Some(100),
            rx1_delay: None,
            rx_windows: None,
            dev_addr: None,
            nwk_s_key: None,
            app_s_key: None,
        }
    }

    #[test]
    fn otaa_device_translates_with_defaults() {
        let device = translate_device(&otaa_record()).unwrap();
        assert_eq!(device.dev_eui, "1A2B3C4D5E6F7081");
        assert_eq!(device.activation, ActivationMode::Otaa);
        assert_eq!(device.app_key.as_deref(), Some("2B7E151628AED2A6ABF7158809CF4F3C"));
        assert!(device.adr_enabled, "absent adrEnabled defaults to on");
        assert_eq!(device.rx_window, 1);
        assert_eq!(device.rx1_delay, 1);
        assert_eq!(device.seqno, 100);
        assert_eq!(device.seqdn, 42);
    }

    #[test]
    fn otaa_device_without_app_key_is_rejected() {
        let mut record = otaa_record();
        record.app_key = None;
        assert!(translate_device(&record).is_err());
    }

    #[test]
    fn abp_device_requires_session_material() {
        let mut record = otaa_record();
        record.activation = "ABP".to_string();
        assert!(translate_device(&record).is_err(), "no dev_addr");

        record.dev_addr = Some("1e240".to_string());
        record.nwk_s_key = Some("000102030405060708090a0b0c0d0e0f".to_string());
        let device = translate_device(&record).unwrap();
        assert_eq!(device.dev_addr.as_deref(), Some("0001E240"));
        assert!(device.app_key.is_none());
    }

    #[test]
    fn class_c_auto_rx_window_maps_to_zero() {
        let mut record = otaa_record();
        record.class_type = "C".to_string();
        record.rx_windows = Some("AUTO".to_string());
        let device = translate_device(&record).unwrap();
        assert_eq!(device.rx_window, 0);

        record.rx_windows = None;
        let device = translate_device(&record).unwrap();
        assert_eq!(device.rx_window, 2);
    }

    fn mqtt_record() -> KerlinkPushConfigurationRecord {
        KerlinkPushConfigurationRecord {
            id: 3,
            name: "uplink-broker".to_string(),
            kind: "MQTT".to_string(),
            msg_detail_level: "PAYLOAD".to_string(),
            url: None,
            user: None,
            password: None,
            headers: None,
            http_data_up_route: None,
            http_data_down_event_route: None,
            mqtt_host: Some("broker.example.com".to_string()),
            mqtt_port: None,
            mqtt_tls_enabled: false,
            mqtt_client_id: None,
            mqtt_connection_timeout: None,
            mqtt_keep_alive: None,
            mqtt_clean_session: true,
            mqtt_qos: None,
            mqtt_data_up_topic: Some("up".to_string()),
            mqtt_data_down_event_topic: None,
            mqtt_will_topic: None,
            mqtt_will_payload: None,
            mqtt_will_qos: None,
        }
    }

    #[test]
    fn mqtt_output_fills_broker_defaults() {
        let output = translate_push_configuration(&mqtt_record(), OutputEncoding::Hexa).unwrap();
        match output {
            Output::KerlinkMqtt {
                port,
                timeout,
                keepalive,
                qos,
                clean,
                tls,
                ..
            } => {
                assert_eq!(port, 1883);
                assert_eq!(timeout, 30);
                assert_eq!(keepalive, 30);
                assert_eq!(qos, 0);
                assert_eq!(clean, 1);
                assert_eq!(tls, 0);
            }
            other => panic!("expected MQTT output, got {other:?}"),
        }
    }

    #[test]
    fn http_output_parses_header_cell() {
        let record = KerlinkPushConfigurationRecord {
            kind: "HTTP".to_string(),
            url: Some("https://ingest.example.com/up".to_string()),
            headers: Some(r#"[{"key":"X-Token","value":"abc"}]"#.to_string()),
            ..mqtt_record()
        };
        let output = translate_push_configuration(&record, OutputEncoding::Base64).unwrap();
        match output {
            Output::KerlinkHttp { custom_headers, .. } => {
                assert_eq!(custom_headers.len(), 1);
                assert_eq!(custom_headers[0].key, "X-Token");
            }
            other => panic!("expected HTTP output, got {other:?}"),
        }
    }

    #[test]
    fn unknown_verbosity_is_an_error() {
        let record = KerlinkPushConfigurationRecord {
            msg_detail_level: "EVERYTHING".to_string(),
            ..mqtt_record()
        };
        assert!(translate_push_configuration(&record, OutputEncoding::Hexa).is_err());
    }

    #[test]
    fn bad_device_does_not_poison_the_cluster() {
        let good = otaa_record();
        let mut bad = otaa_record();
        bad.dev_eui = "not-hex".to_string();

        let apps = build_applications(vec![good, bad], Vec::new(), Vec::new());
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Farm");
        assert_eq!(apps[0].devices.len(), 1, "bad row skipped, good row kept");
    }

    #[test]
    fn clusters_are_synthesized_when_export_is_missing() {
        let mut other = otaa_record();
        other.cluster_id = 8;
        other.cluster_name = None;
        other.dev_eui = "1a2b3c4d5e6f7082".to_string();

        let apps = build_applications(vec![otaa_record(), other], Vec::new(), Vec::new());
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].name, "Farm");
        assert_eq!(apps[1].name, "Cluster 8");
    }

    #[test]
    fn cluster_hexa_flag_selects_encoding() {
        let cluster = KerlinkClusterRecord {
            id: 7,
            name: "Farm".to_string(),
            hexa: true,
            push_configuration: Some(r#"{"id":3,"links":[]}"#.to_string()),
        };
        let apps = build_applications(vec![otaa_record()], vec![mqtt_record()], vec![cluster]);
        assert_eq!(apps[0].outputs.len(), 1);
        match &apps[0].outputs[0] {
            Output::KerlinkMqtt { encoding, .. } => {
                assert_eq!(*encoding, OutputEncoding::Hexa);
            }
            other => panic!("expected MQTT output, got {other:?}"),
        }
    }
}
