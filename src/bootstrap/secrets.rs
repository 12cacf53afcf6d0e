// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Copies secrets referenced by the Shoot into the shoot cluster and garbage collects stale copies.
//!
//! Secrets created here carry the managed-by label. Secrets that already exist in the shoot
//! are never overwritten, so rotations done in the shoot survive.

use std::collections::{BTreeMap, HashSet};

use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, instrument};

use crate::api::{AdditionalResource, FluxConfig};
use crate::constants::labels::{MANAGED_BY_KEY, MANAGED_BY_VALUE};
use crate::constants::seed::REFERENCED_RESOURCES_PREFIX;
use crate::error::{FluxError, Result};
use crate::types::cluster::{resource_by_name, NamedResourceReference};

/// The secrets to sync into the Flux namespace: additional resources plus the source credentials
fn secret_resources(config: &FluxConfig) -> Result<Vec<AdditionalResource>> {
    let mut resources = config.additional_secret_resources.clone();
    if let Some(source) = config.source.as_ref() {
        if let Some(name) = source.secret_resource_name() {
            let target = source
                .template
                .secret_ref_name()
                .ok_or(FluxError::MissingSecretRef)?;
            resources.push(AdditionalResource {
                name: name.to_string(),
                target_name: Some(target.to_string()),
            });
        }
    }
    Ok(resources)
}

/// Sync all referenced secrets into the Flux namespace and delete managed secrets no longer referenced
#[instrument(skip_all, fields(seed_namespace = %seed_namespace, namespace = %config.flux.namespace()))]
pub async fn reconcile_secrets(
    seed: &Client,
    shoot: &Client,
    seed_namespace: &str,
    config: &FluxConfig,
    resources: &[NamedResourceReference],
) -> Result<()> {
    let namespace = config.flux.namespace();
    let mut keep = HashSet::new();

    for resource in secret_resources(config)? {
        let name = copy_secret_to_shoot(seed, shoot, seed_namespace, namespace, resources, &resource)
            .await
            .map_err(|e| FluxError::CopySecret(Box::new(e)))?;
        keep.insert(name);
    }

    let secrets: Api<Secret> = Api::namespaced(shoot.clone(), namespace);
    let selector = format!("{}={}", MANAGED_BY_KEY, MANAGED_BY_VALUE);
    let managed = secrets.list(&ListParams::default().labels(&selector)).await?;

    for secret in managed.items {
        let name = secret.name_any();
        if keep.contains(&name) {
            continue;
        }
        match secrets.delete(&name, &DeleteParams::default()).await {
            Ok(_) => info!(secret = %name, "Deleted secret that is no longer referenced"),
            Err(kube::Error::Api(e)) if e.code == 404 => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Copy the seed secret behind a Shoot resource reference into `target_namespace`.
///
/// Returns the name of the secret in the shoot.
#[instrument(skip(seed, shoot, resources), fields(resource = %resource.name))]
pub async fn copy_secret_to_shoot(
    seed: &Client,
    shoot: &Client,
    seed_namespace: &str,
    target_namespace: &str,
    resources: &[NamedResourceReference],
    resource: &AdditionalResource,
) -> Result<String> {
    let reference = resource_by_name(resources, &resource.name)
        .ok_or_else(|| FluxError::UnknownResource(resource.name.clone()))?;

    let seed_name = format!("{}{}", REFERENCED_RESOURCES_PREFIX, reference.resource_ref.name);
    let seed_secrets: Api<Secret> = Api::namespaced(seed.clone(), seed_namespace);
    let seed_secret = seed_secrets
        .get(&seed_name)
        .await
        .map_err(|source| FluxError::ReferencedSecret {
            name: seed_name.clone(),
            source,
        })?;

    let name = resource
        .target_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| reference.resource_ref.name.clone());

    let shoot_secrets: Api<Secret> = Api::namespaced(shoot.clone(), target_namespace);
    if shoot_secrets.get_opt(&name).await?.is_some() {
        debug!(secret = %name, "Secret already exists in shoot, leaving it untouched");
        return Ok(name);
    }

    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(target_namespace.to_string()),
            labels: Some(BTreeMap::from([(
                MANAGED_BY_KEY.to_string(),
                MANAGED_BY_VALUE.to_string(),
            )])),
            ..Default::default()
        },
        data: seed_secret.data.clone(),
        type_: seed_secret.type_.clone(),
        ..Default::default()
    };

    match shoot_secrets.create(&PostParams::default(), &secret).await {
        Ok(_) => info!(secret = %name, "Created secret"),
        Err(kube::Error::Api(e)) if e.code == 409 => {
            debug!(secret = %name, "Secret was created concurrently");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(name)
}
