//! Import engine: pushes translated applications and networks into the
//! destination.
//!
//! Re-runnable by construction: parents are looked up by name and reused,
//! children are deleted before being recreated. Applications are imported
//! concurrently with a bounded fan-out; inside one application the order is
//! delete-then-create per device, so a device is never duplicated.

use super::{LoriotApi, ResourceId};
use crate::error::Result;
use crate::model::{Application, Network};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Counters for the final run report. Parent resources count as created or
/// reused; child failures are contained and tallied.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportSummary {
    pub created: u64,
    pub reused: u64,
    pub failed: u64,
    pub children_created: u64,
    pub children_failed: u64,
    pub outputs_created: u64,
    pub outputs_failed: u64,
}

impl ImportSummary {
    fn merge(mut self, other: ImportSummary) -> Self {
        self.created += other.created;
        self.reused += other.reused;
        self.failed += other.failed;
        self.children_created += other.children_created;
        self.children_failed += other.children_failed;
        self.outputs_created += other.outputs_created;
        self.outputs_failed += other.outputs_failed;
        self
    }
}

/// Import all applications with at most `concurrency` applications in flight.
pub async fn import_applications<A: LoriotApi + Sync>(
    api: &A,
    applications: &[Application],
    concurrency: usize,
) -> ImportSummary {
    stream::iter(applications)
        .map(|application| import_application(api, application))
        .buffer_unordered(concurrency.max(1))
        .fold(ImportSummary::default(), |acc, summary| async move {
            acc.merge(summary)
        })
        .await
}

async fn import_application<A: LoriotApi>(api: &A, application: &Application) -> ImportSummary {
    let mut summary = ImportSummary::default();

    let id = match find_or_create_application(api, application).await {
        Ok((id, reused)) => {
            if reused {
                summary.reused += 1;
            } else {
                summary.created += 1;
            }
            id
        }
        Err(err) => {
            error!("[{}] Application creation error: {}", application.name, err);
            summary.failed += 1;
            return summary;
        }
    };

    for output in &application.outputs {
        match api.create_output(id, output).await {
            Ok(()) => summary.outputs_created += 1,
            Err(err) => {
                error!(
                    "[{}][OUT][{}] Output creation error: {}",
                    application.name,
                    output.name(),
                    err
                );
                summary.outputs_failed += 1;
            }
        }
    }

    for device in &application.devices {
        // replace, not merge: stale counters or keys must not survive
        match api.delete_device(id, &device.dev_eui).await {
            Ok(true) => debug!(
                "[{}][DEV][{}] Deleted existing device",
                application.name, device.dev_eui
            ),
            Ok(false) => {}
            Err(err) => error!(
                "[{}][DEV][{}] Device deletion error: {}",
                application.name, device.dev_eui, err
            ),
        }
        match api.create_device(id, device).await {
            Ok(()) => summary.children_created += 1,
            Err(err) => {
                error!(
                    "[{}][DEV][{}] Device creation error: {}",
                    application.name, device.dev_eui, err
                );
                summary.children_failed += 1;
            }
        }
    }

    info!(
        "[{}] Imported {} device(s), {} output(s)",
        application.name, summary.children_created, summary.outputs_created
    );
    summary
}

async fn find_or_create_application<A: LoriotApi>(
    api: &A,
    application: &Application,
) -> Result<(ResourceId, bool)> {
    if let Some(id) = api.find_application(&application.name).await? {
        debug!("[{}] Reusing existing application {}", application.name, id);
        return Ok((id, true));
    }
    let id = api
        .create_application(&application.name, application.devices.len())
        .await?;
    Ok((id, false))
}

/// Import all networks with at most `concurrency` networks in flight.
pub async fn import_networks<A: LoriotApi + Sync>(
    api: &A,
    networks: &[Network],
    concurrency: usize,
) -> ImportSummary {
    stream::iter(networks)
        .map(|network| import_network(api, network))
        .buffer_unordered(concurrency.max(1))
        .fold(ImportSummary::default(), |acc, summary| async move {
            acc.merge(summary)
        })
        .await
}

async fn import_network<A: LoriotApi>(api: &A, network: &Network) -> ImportSummary {
    let mut summary = ImportSummary::default();

    let (id, reused) = match find_or_create_network(api, network).await {
        Ok(found) => found,
        Err(err) => {
            error!("[{}] Network creation error: {}", network.name, err);
            summary.failed += 1;
            return summary;
        }
    };
    if reused {
        summary.reused += 1;
    } else {
        summary.created += 1;
    }

    // gateways have no deterministic id on the destination; resolve the
    // existing ones by MAC so re-runs replace instead of duplicating
    let existing: HashMap<String, String> = if reused {
        match api.list_gateways(id).await {
            Ok(gateways) => gateways
                .into_iter()
                .map(|g| (g.mac.to_uppercase(), g.id))
                .collect(),
            Err(err) => {
                error!("[{}] Gateway listing error: {}", network.name, err);
                HashMap::new()
            }
        }
    } else {
        HashMap::new()
    };

    for gateway in &network.gateways {
        if let Some(existing_id) = existing.get(&gateway.mac.to_uppercase()) {
            match api.delete_gateway(id, existing_id).await {
                Ok(_) => debug!(
                    "[{}][GW][{}] Deleted existing gateway",
                    network.name, gateway.mac
                ),
                Err(err) => error!(
                    "[{}][GW][{}] Gateway deletion error: {}",
                    network.name, gateway.mac, err
                ),
            }
        }
        match api.create_gateway(id, gateway).await {
            Ok(()) => summary.children_created += 1,
            Err(err) => {
                error!(
                    "[{}][GW][{}] Gateway creation error: {}",
                    network.name, gateway.mac, err
                );
                summary.children_failed += 1;
            }
        }
    }

    info!(
        "[{}] Imported {} gateway(s)",
        network.name, summary.children_created
    );
    summary
}

async fn find_or_create_network<A: LoriotApi>(
    api: &A,
    network: &Network,
) -> Result<(ResourceId, bool)> {
    if let Some(id) = api.find_network(&network.name).await? {
        debug!("[{}] Reusing existing network {}", network.name, id);
        return Ok((id, true));
    }
    let id = api.create_network(&network.name).await?;
    Ok((id, false))
}
