// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server-side apply of multi-document YAML manifests.

use std::collections::HashMap;

use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::discovery::{pinned_kind, ApiCapabilities, Scope};
use kube::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::constants::FIELD_MANAGER;
use crate::error::{FluxError, Result};

/// Lower values are applied first
fn kind_priority(kind: &str) -> u8 {
    match kind {
        "Namespace" => 0,
        "CustomResourceDefinition" => 1,
        "ServiceAccount" => 2,
        "ClusterRole" | "Role" => 3,
        "ClusterRoleBinding" | "RoleBinding" => 4,
        "ConfigMap" | "Secret" | "NetworkPolicy" => 5,
        "Service" => 6,
        "Deployment" | "DaemonSet" | "StatefulSet" => 7,
        _ => 10,
    }
}

/// A single manifest document with the fields needed to address it
#[derive(Debug)]
struct Document {
    api_version: String,
    kind: String,
    name: String,
    namespace: Option<String>,
    object: serde_json::Value,
}

impl Document {
    fn from_value(object: serde_json::Value) -> Result<Self> {
        let field = |pointer: &str| object.pointer(pointer).and_then(|v| v.as_str());
        let required = |pointer: &str| {
            field(pointer)
                .map(str::to_string)
                .ok_or_else(|| FluxError::ManifestError(format!("invalid manifest: missing {}", pointer)))
        };

        Ok(Document {
            api_version: required("/apiVersion")?,
            kind: required("/kind")?,
            name: required("/metadata/name")?,
            namespace: field("/metadata/namespace").map(str::to_string),
            object: object.clone(),
        })
    }

    fn gvk(&self) -> GroupVersionKind {
        let (group, version) = self
            .api_version
            .split_once('/')
            .unwrap_or(("", self.api_version.as_str()));
        GroupVersionKind::gvk(group, version, &self.kind)
    }

    fn is_foundational(&self) -> bool {
        self.kind == "Namespace" || self.kind == "CustomResourceDefinition"
    }
}

/// Split a multi-document YAML stream, skipping empty documents
fn parse_documents(manifest: &[u8]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for doc in serde_yaml::Deserializer::from_slice(manifest) {
        let value = serde_json::Value::deserialize(doc)
            .map_err(|e| FluxError::ManifestError(format!("invalid manifest: {}", e)))?;
        if value.is_null() {
            continue;
        }
        documents.push(Document::from_value(value)?);
    }
    Ok(documents)
}

/// Create or update every object in the manifest using server-side apply.
///
/// Namespaces and CRDs go first, the remaining objects follow ordered by kind.
/// Applying the same manifest again leaves the cluster unchanged.
#[instrument(skip(client, manifest), fields(bytes = manifest.len()))]
pub async fn apply_manifest(client: &Client, manifest: &[u8]) -> Result<()> {
    let (mut foundational, mut rest): (Vec<Document>, Vec<Document>) = parse_documents(manifest)?
        .into_iter()
        .partition(Document::is_foundational);

    foundational.sort_by_key(|d| kind_priority(&d.kind));
    rest.sort_by_key(|d| kind_priority(&d.kind));

    let params = PatchParams::apply(FIELD_MANAGER).force();
    let mut resolved: HashMap<String, (ApiResource, ApiCapabilities)> = HashMap::new();

    for document in foundational.iter().chain(rest.iter()) {
        let key = format!("{}/{}", document.api_version, document.kind);
        let (resource, capabilities) = match resolved.get(&key) {
            Some(found) => found.clone(),
            None => {
                let found = pinned_kind(client, &document.gvk()).await.map_err(|e| {
                    FluxError::ManifestError(format!("unknown resource type {}: {}", key, e))
                })?;
                resolved.insert(key, found.clone());
                found
            }
        };

        let api: Api<DynamicObject> = match (&capabilities.scope, document.namespace.as_deref()) {
            (Scope::Cluster, _) => Api::all_with(client.clone(), &resource),
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(client.clone(), ns, &resource),
            (Scope::Namespaced, None) => {
                return Err(FluxError::ManifestError(format!(
                    "{} {} is namespaced but has no namespace",
                    document.kind, document.name
                )))
            }
        };

        api.patch(&document.name, &params, &Patch::Apply(&document.object))
            .await?;
        debug!(kind = %document.kind, name = %document.name, namespace = ?document.namespace, "Applied manifest");
    }

    Ok(())
}
