//! Kerlink fleets → networks
//!
//! Joins `gateways.csv` and `fleets.csv` into destination-shaped networks.
//! An optional customer filter keeps only fleets belonging to one WMC
//! customer, which is how multi-tenant exports are split.

use crate::error::{MigrateError, Result};
use crate::model::{Gateway, Location, Network};
use crate::translate::{infer_hardware, translate_region, truncate_title};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::records::{CustomerRef, KerlinkFleetRecord, KerlinkGatewayRecord};

// Fallback position when the export carries no coordinates.
const DEFAULT_LATITUDE: f64 = 46.8076885;
const DEFAULT_LONGITUDE: f64 = 7.100528;

/// Build networks from the loaded CSV rows.
///
/// When `fleets.csv` is absent, fleets are synthesized from the
/// `fleetId`/`fleetName` columns of the gateway rows. With a customer filter
/// set, only fleets whose embedded customer id matches survive; synthesized
/// fleets carry no customer and are dropped by the filter.
pub fn build_networks(
    gateways: Vec<KerlinkGatewayRecord>,
    fleets: Vec<KerlinkFleetRecord>,
    customer_id: Option<i64>,
) -> Vec<Network> {
    let fleets = if fleets.is_empty() {
        synthesize_fleets(&gateways)
    } else {
        fleets
    };

    fleets
        .into_iter()
        .filter(|fleet| match customer_id {
            None => true,
            Some(wanted) => {
                let customer = parse_customer(fleet);
                match customer {
                    Some(c) if c.id == wanted => true,
                    _ => {
                        info!(
                            "[{}] Skipping fleet: not owned by customer {}",
                            fleet.name, wanted
                        );
                        false
                    }
                }
            }
        })
        .map(|fleet| translate_fleet(&fleet, &gateways))
        .collect()
}

fn synthesize_fleets(gateways: &[KerlinkGatewayRecord]) -> Vec<KerlinkFleetRecord> {
    let mut by_id: BTreeMap<i64, KerlinkFleetRecord> = BTreeMap::new();
    for gateway in gateways {
        by_id
            .entry(gateway.fleet_id)
            .or_insert_with(|| KerlinkFleetRecord {
                id: gateway.fleet_id,
                name: gateway
                    .fleet_name
                    .clone()
                    .unwrap_or_else(|| format!("Fleet {}", gateway.fleet_id)),
                customer: None,
            });
    }
    info!("Synthesized {} fleet(s) from gateway rows", by_id.len());
    by_id.into_values().collect()
}

fn parse_customer(fleet: &KerlinkFleetRecord) -> Option<CustomerRef> {
    let raw = fleet.customer.as_deref()?;
    match serde_json::from_str::<CustomerRef>(raw) {
        Ok(customer) => Some(customer),
        Err(err) => {
            warn!(
                "[{}] Ignoring unparseable customer cell: {}",
                fleet.name, err
            );
            None
        }
    }
}

fn translate_fleet(fleet: &KerlinkFleetRecord, gateways: &[KerlinkGatewayRecord]) -> Network {
    let mut translated = Vec::new();
    for record in gateways.iter().filter(|g| g.fleet_id == fleet.id) {
        match translate_gateway(record) {
            Ok(gateway) => translated.push(gateway),
            Err(err) => warn!(
                "[{}][GW][{}] Skipping gateway: {}",
                fleet.name, record.eui, err
            ),
        }
    }
    Network {
        name: fleet.name.clone(),
        gateways: translated,
    }
}

/// Translate one gateway row. Missing ethernet MAC or an unrecognized
/// hardware model is a per-gateway error.
pub fn translate_gateway(record: &KerlinkGatewayRecord) -> Result<Gateway> {
    let mac = record
        .eth0_mac
        .as_deref()
        .ok_or_else(|| MigrateError::validation("gateway without eth0MAC"))?
        .to_uppercase();

    let brand = record.brand_name.as_deref().unwrap_or_default();
    let description = record.description.as_deref().unwrap_or_default();
    let hardware = infer_hardware(brand, description)?;

    let (title, notes) = truncate_title(record.name.clone());
    let notes = notes.or_else(|| record.description.clone());

    Ok(Gateway {
        title,
        notes,
        custom_eui: Some(record.eui.to_uppercase()),
        mac,
        region: record
            .region
            .as_deref()
            .and_then(translate_region)
            .map(str::to_string),
        location: Location {
            lat: record.latitude.unwrap_or(DEFAULT_LATITUDE),
            lon: record.longitude.unwrap_or(DEFAULT_LONGITUDE),
        },
        hardware,
    })
}
