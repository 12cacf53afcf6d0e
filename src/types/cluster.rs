// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{Api, Client, CustomResource};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{FluxError, Result};

/// Gardener's cluster-scoped record of a shoot, named after the shoot's namespace in the seed
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "extensions.gardener.cloud", version = "v1alpha1", kind = "Cluster")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_profile: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<serde_json::Value>,
    /// The raw Shoot object
    #[serde(default)]
    pub shoot: serde_json::Value,
}

/// A named reference from `Shoot.spec.resources` to an object in the project namespace
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamedResourceReference {
    pub name: String,
    pub resource_ref: CrossVersionObjectReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrossVersionObjectReference {
    #[serde(default)]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl Cluster {
    /// The Shoot's `spec.resources`, empty if the Shoot declares none
    pub fn shoot_resources(&self) -> Result<Vec<NamedResourceReference>> {
        match self.spec.shoot.pointer("/spec/resources") {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(resources) => serde_json::from_value(resources.clone()).map_err(|e| {
                FluxError::DecodeError(format!("invalid Shoot.spec.resources: {}", e))
            }),
        }
    }
}

/// Look up a resource reference by its logical name
pub fn resource_by_name<'a>(
    resources: &'a [NamedResourceReference],
    name: &str,
) -> Option<&'a NamedResourceReference> {
    resources.iter().find(|r| r.name == name)
}

/// Read the Cluster resource belonging to the given shoot namespace
#[instrument(skip(client))]
pub async fn get_cluster(client: &Client, namespace: &str) -> Result<Cluster> {
    let clusters: Api<Cluster> = Api::all(client.clone());
    clusters
        .get(namespace)
        .await
        .map_err(|e| FluxError::ReadCluster(Box::new(e.into())))
}
