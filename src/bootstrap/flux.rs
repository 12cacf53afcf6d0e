// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Creation of the initial GitRepository and Kustomization in the shoot.

use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::api::{AdditionalResource, FluxConfig, Source};
use crate::config::Timeouts;
use crate::constants::FIELD_MANAGER;
use crate::error::{FluxError, Result};
use crate::kubernetes::health::check_flux_object;
use crate::kubernetes::{ensure_namespace_exists, wait_for_object};
use crate::types::cluster::NamedResourceReference;
use crate::types::flux::{GitRepository, Kustomization, KustomizationTemplate};

/// Seed-side inputs needed to copy the GitRepository credentials
pub struct SeedSecrets<'a> {
    pub client: &'a Client,
    pub namespace: &'a str,
    pub resources: &'a [NamedResourceReference],
}

/// Create the GitRepository from the source template and wait for it to get ready.
///
/// The credentials secret is synced into the Flux namespace beforehand; when the GitRepository
/// lives in another namespace it is copied there as well.
#[instrument(skip_all, fields(name = %source.template.name(), namespace = %source.template.namespace()))]
pub async fn bootstrap_source(
    shoot: &Client,
    seed: &SeedSecrets<'_>,
    config: &FluxConfig,
    source: &Source,
    timeouts: &Timeouts,
    cancel: &CancellationToken,
) -> Result<()> {
    info!("Bootstrapping Flux GitRepository");

    let template = &source.template;
    // The GitRepository may live outside the Flux namespace
    ensure_namespace_exists(shoot, template.namespace()).await?;

    if let Some(resource_name) = source.secret_resource_name() {
        if template.namespace() != config.flux.namespace() {
            let target = template.secret_ref_name().ok_or(FluxError::MissingSecretRef)?;
            let resource = AdditionalResource {
                name: resource_name.to_string(),
                target_name: Some(target.to_string()),
            };
            crate::bootstrap::secrets::copy_secret_to_shoot(
                seed.client,
                shoot,
                seed.namespace,
                template.namespace(),
                seed.resources,
                &resource,
            )
            .await?;
        }
    }

    let repositories: Api<GitRepository> = Api::namespaced(shoot.clone(), template.namespace());
    let object = template.to_object();
    repositories
        .patch(
            template.name(),
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&object),
        )
        .await
        .map_err(|e| {
            FluxError::ManifestError(format!("error applying GitRepository template: {}", e))
        })?;

    info!("Waiting for GitRepository to get ready");
    wait_for_object(
        &repositories,
        template.name(),
        timeouts.bootstrap_poll_interval,
        timeouts.bootstrap_timeout,
        cancel,
        check_flux_object::<GitRepository>,
    )
    .await
    .map_err(|e| FluxError::waiting("error waiting for GitRepository to get ready", e))?;

    info!("Successfully bootstrapped Flux GitRepository");
    Ok(())
}

/// Create the Kustomization from its template and wait for it to get ready
#[instrument(skip_all, fields(name = %template.name(), namespace = %template.namespace()))]
pub async fn bootstrap_kustomization(
    shoot: &Client,
    template: &KustomizationTemplate,
    timeouts: &Timeouts,
    cancel: &CancellationToken,
) -> Result<()> {
    info!("Bootstrapping Flux Kustomization");

    ensure_namespace_exists(shoot, template.namespace()).await?;

    let kustomizations: Api<Kustomization> = Api::namespaced(shoot.clone(), template.namespace());
    let object = template.to_object();
    kustomizations
        .patch(
            template.name(),
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&object),
        )
        .await
        .map_err(|e| {
            FluxError::ManifestError(format!("error applying Kustomization template: {}", e))
        })?;

    info!("Waiting for Kustomization to get ready");
    wait_for_object(
        &kustomizations,
        template.name(),
        timeouts.bootstrap_poll_interval,
        timeouts.bootstrap_timeout,
        cancel,
        check_flux_object::<Kustomization>,
    )
    .await
    .map_err(|e| FluxError::waiting("error waiting for Kustomization to get ready", e))?;

    info!("Successfully bootstrapped Flux Kustomization");
    Ok(())
}
