//! Cleaner: removes previously-migrated resources from the destination.
//!
//! Deletion is scoped to what the current source translates to; anything
//! created by hand on the destination is left alone. Children go first, and
//! a parent is only deleted once the destination confirms it is empty.

use super::LoriotApi;
use crate::error::Result;
use crate::model::{Application, Network};
use std::collections::HashSet;
use tracing::{error, info};

/// Delete every device the source knows about, then every application that
/// ends up empty. Failures inside one application are contained; a failed
/// top-level listing is fatal because the deletion scope would be unknown.
pub async fn clean_applications<A: LoriotApi>(api: &A, applications: &[Application]) -> Result<()> {
    let targets: HashSet<&str> = applications
        .iter()
        .flat_map(|a| a.devices.iter().map(|d| d.dev_eui.as_str()))
        .collect();

    for summary in api.list_applications().await? {
        let dev_euis = match api.list_device_euis(summary.id).await {
            Ok(dev_euis) => dev_euis,
            Err(err) => {
                error!("[{}] Device listing error: {}", summary.name, err);
                continue;
            }
        };

        let mut deleted = 0u64;
        for dev_eui in dev_euis
            .iter()
            .filter(|eui| targets.contains(eui.to_uppercase().as_str()))
        {
            match api.delete_device(summary.id, dev_eui).await {
                Ok(_) => deleted += 1,
                Err(err) => error!(
                    "[{}][DEV][{}] Device deletion error: {}",
                    summary.name, dev_eui, err
                ),
            }
        }
        if deleted > 0 {
            info!("[{}] Deleted {} device(s)", summary.name, deleted);
        }

        match api.application_device_count(summary.id).await {
            Ok(0) => match api.delete_application(summary.id).await {
                Ok(()) => info!("[{}] Deleted empty application", summary.name),
                Err(err) => error!(
                    "[{}] Application deletion error: {}",
                    summary.name, err
                ),
            },
            Ok(remaining) => info!(
                "[{}] Keeping application: {} device(s) remain",
                summary.name, remaining
            ),
            Err(err) => error!("[{}] Device count error: {}", summary.name, err),
        }
    }
    Ok(())
}

/// Delete every gateway the source knows about (matched by MAC), then every
/// network that ends up empty.
pub async fn clean_networks<A: LoriotApi>(api: &A, networks: &[Network]) -> Result<()> {
    let targets: HashSet<String> = networks
        .iter()
        .flat_map(|n| n.gateways.iter().map(|g| g.mac.to_uppercase()))
        .collect();

    for summary in api.list_networks().await? {
        let gateways = match api.list_gateways(summary.id).await {
            Ok(gateways) => gateways,
            Err(err) => {
                error!("[{}] Gateway listing error: {}", summary.name, err);
                continue;
            }
        };

        let mut deleted = 0u64;
        for gateway in gateways
            .iter()
            .filter(|g| targets.contains(&g.mac.to_uppercase()))
        {
            match api.delete_gateway(summary.id, &gateway.id).await {
                Ok(_) => deleted += 1,
                Err(err) => error!(
                    "[{}][GW][{}] Gateway deletion error: {}",
                    summary.name, gateway.mac, err
                ),
            }
        }
        if deleted > 0 {
            info!("[{}] Deleted {} gateway(s)", summary.name, deleted);
        }

        match api.network_gateway_count(summary.id).await {
            Ok(0) => match api.delete_network(summary.id).await {
                Ok(()) => info!("[{}] Deleted empty network", summary.name),
                Err(err) => error!("[{}] Network deletion error: {}", summary.name, err),
            },
            Ok(remaining) => info!(
                "[{}] Keeping network: {} gateway(s) remain",
                summary.name, remaining
            ),
            Err(err) => error!("[{}] Gateway count error: {}", summary.name, err),
        }
    }
    Ok(())
}
