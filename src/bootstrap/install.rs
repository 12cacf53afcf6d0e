// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Installing the Flux controllers into the shoot.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{Api, Client};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::api::FluxInstallation;
use crate::bootstrap::manifest::ManifestGenerator;
use crate::config::Timeouts;
use crate::error::{FluxError, Result};
use crate::kubernetes::health::{check_custom_resource_definition, check_deployment};
use crate::kubernetes::{apply_manifest, wait_for_object};

const GIT_REPOSITORY_CRD: &str = "gitrepositories.source.toolkit.fluxcd.io";
const SOURCE_CONTROLLER: &str = "source-controller";
const WAIT_CONTEXT: &str = "error waiting for Flux installation to get ready";

/// Apply the Flux install manifest and wait until it can be bootstrapped.
///
/// Only the GitRepository CRD and the source-controller Deployment are checked. An available
/// source-controller proves the configured registry serves the Flux images.
#[instrument(skip_all, fields(version = %installation.version(), namespace = %installation.namespace()))]
pub async fn install_flux(
    client: &Client,
    installation: &FluxInstallation,
    generator: &dyn ManifestGenerator,
    timeouts: &Timeouts,
    cancel: &CancellationToken,
) -> Result<()> {
    info!("Installing Flux");

    let manifest = generator.generate(installation).await?;
    apply_manifest(client, &manifest).await.map_err(|e| {
        FluxError::ManifestError(format!("error applying Flux install manifest: {}", e))
    })?;

    info!("Waiting for Flux installation to get ready");
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    wait_for_object(
        &crds,
        GIT_REPOSITORY_CRD,
        timeouts.install_poll_interval,
        timeouts.install_timeout,
        cancel,
        check_custom_resource_definition,
    )
    .await
    .map_err(|e| FluxError::waiting(WAIT_CONTEXT, e))?;

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), installation.namespace());
    wait_for_object(
        &deployments,
        SOURCE_CONTROLLER,
        timeouts.install_poll_interval,
        timeouts.install_timeout,
        cancel,
        check_deployment,
    )
    .await
    .map_err(|e| FluxError::waiting(WAIT_CONTEXT, e))?;

    info!("Successfully installed Flux");
    Ok(())
}
