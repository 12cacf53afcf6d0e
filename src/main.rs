// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use anyhow::Result;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shoot_flux::api::ConfigRegistry;
use shoot_flux::bootstrap::{FluxActuator, ReleaseManifests};
use shoot_flux::config::Config;
use shoot_flux::kubernetes::{wait_for_extension_crd, KubeconfigShootClients};
use shoot_flux::reconcilers::ExtensionReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting shoot-flux extension");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        extension_type = %config.extension_type,
        max_concurrent_reconciles = config.max_concurrent_reconciles,
        testing_mode = config.testing_mode,
        flux_releases = %config.flux_release_base_url,
        "Configuration loaded"
    );

    // Create Kubernetes client for the seed
    let client = Client::try_default().await?;
    info!("Connected to seed cluster");

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    info!("Waiting for Extension CRD to become available...");
    wait_for_extension_crd(&client, &cancel).await?;

    let actuator = FluxActuator::new(
        client.clone(),
        Arc::new(ConfigRegistry::new()),
        Arc::new(KubeconfigShootClients::new(client.clone(), config.testing_mode)),
        Arc::new(ReleaseManifests::new(config.flux_release_base_url.clone())?),
        config.timeouts,
    );

    info!("Starting reconciler...");
    ExtensionReconciler::new(client, Arc::new(actuator), config, cancel)
        .run()
        .await?;

    info!("Shut down");
    Ok(())
}
