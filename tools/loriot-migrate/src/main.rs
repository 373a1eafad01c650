//! loriot-migrate - batch migration of LoRaWAN resources to LORIOT
//!
//! Reads applications, devices, outputs and gateways from a ChirpStack
//! instance (gRPC) or a Kerlink WMC CSV export, translates them into LORIOT
//! shape and pushes them through the LORIOT network-management REST API.
//! Re-runnable: parents are reused by name, devices and gateways are
//! replaced.

mod chirpstack;
mod config;
mod error;
mod kerlink;
mod loriot;
mod model;
mod translate;

use crate::chirpstack::{ChirpstackGrpc, GrpcSourceReader};
use crate::config::MigrateConfig;
use crate::kerlink::CsvSourceReader;
use crate::loriot::{
    clean_applications, clean_networks, import_applications, import_networks, ImportSummary,
    LoriotClient, MigrationSet,
};
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "loriot-migrate")]
#[command(version)]
#[command(about = "Migrates ChirpStack or Kerlink WMC resources to LORIOT")]
#[command(long_about = "Migrates LoRaWAN resources to LORIOT.

Sources:
  ChirpStack  applications, devices, HTTP integrations and gateways over gRPC
  Kerlink WMC clusters, devices, push configurations, fleets and gateways
              from a CSV export directory

The run is idempotent: applications and networks are reused by name, devices
and gateways are deleted and recreated. Use --clean to remove previously
migrated resources first.")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delete previously migrated resources before importing
    #[arg(long)]
    clean: bool,

    /// Skip the import phase (with --clean this only deletes)
    #[arg(long)]
    no_import: bool,

    /// Verbose logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    common::logging::init_logging(cli.verbose);

    let mut config = config::load_config(cli.config.as_deref())?;
    if cli.clean {
        config.clean = true;
    }
    if cli.no_import {
        config.import = false;
    }

    println!("{}", "LORIOT migration".bold().bright_blue());
    println!("  source:      {}", config.provider().cyan());
    println!("  destination: {}", config.loriot.url.cyan());
    println!();

    run(config).await
}

async fn run(config: MigrateConfig) -> Result<()> {
    let set = load_sources(&config)
        .await
        .context("Failed to load the source")?;
    info!(
        "Translated {} application(s) and {} network(s)",
        set.applications.len(),
        set.networks.len()
    );

    let client = LoriotClient::new(&config.loriot.url, &config.loriot.auth)
        .context("Failed to build the LORIOT client")?;

    if config.clean {
        info!("Cleaning previously migrated resources");
        clean_applications(&client, &set.applications).await?;
        clean_networks(&client, &set.networks).await?;
    }

    if config.import {
        let applications = import_applications(&client, &set.applications, config.concurrency).await;
        let networks = import_networks(&client, &set.networks, config.concurrency).await;
        print_summary("Applications", &applications, "devices");
        print_summary("Networks", &networks, "gateways");
    }

    Ok(())
}

async fn load_sources(config: &MigrateConfig) -> Result<MigrationSet> {
    match &config.chirpstack {
        Some(chirpstack) => {
            let api = ChirpstackGrpc::connect(
                &chirpstack.url,
                &chirpstack.api_token,
                &chirpstack.tenant_id,
            )
            .await?;
            let mut reader = GrpcSourceReader::new(api);
            Ok(MigrationSet {
                applications: reader.load_applications().await?,
                networks: reader.load_networks().await?,
            })
        }
        None => {
            let reader = CsvSourceReader::new(
                config.kerlink.data_dir.clone(),
                config.kerlink.customer_id,
            );
            Ok(MigrationSet {
                applications: reader.load_applications()?,
                networks: reader.load_networks()?,
            })
        }
    }
}

fn print_summary(label: &str, summary: &ImportSummary, children: &str) {
    println!("{}", label.bold());
    println!(
        "  {} created, {} reused, {} failed",
        summary.created.to_string().green(),
        summary.reused.to_string().yellow(),
        colored_count(summary.failed)
    );
    println!(
        "  {children}: {} created, {} failed",
        summary.children_created.to_string().green(),
        colored_count(summary.children_failed)
    );
    if summary.outputs_created + summary.outputs_failed > 0 {
        println!(
            "  outputs: {} created, {} failed",
            summary.outputs_created.to_string().green(),
            colored_count(summary.outputs_failed)
        );
    }
}

fn colored_count(failures: u64) -> ColoredString {
    if failures > 0 {
        failures.to_string().red()
    } else {
        failures.to_string().normal()
    }
}
