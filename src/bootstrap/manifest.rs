// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Flux install manifest generation.
//!
//! The manifest is the `install.yaml` asset of a Flux release. It carries the default components
//! (source, kustomize, helm and notification controllers) together with their CRDs and pinned
//! controller images. Before it is applied, images are moved to the configured registry and
//! namespaced objects to the configured namespace.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use url::Url;

use crate::api::validation::check_flux_version;
use crate::api::FluxInstallation;
use crate::error::{FluxError, Result};

/// Release download location used by the `flux` CLI
pub const DEFAULT_RELEASE_BASE_URL: &str = "https://github.com/fluxcd/flux2/releases/download/";

const INSTALL_ASSET: &str = "install.yaml";
const UPSTREAM_REGISTRY: &str = "ghcr.io/fluxcd";
const UPSTREAM_NAMESPACE: &str = "flux-system";
const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Renders the multi-document manifest that installs the Flux controllers
#[async_trait]
pub trait ManifestGenerator: Send + Sync {
    async fn generate(&self, installation: &FluxInstallation) -> Result<Vec<u8>>;
}

/// Downloads the install manifest of the requested Flux release, once per version.
pub struct ReleaseManifests {
    http: reqwest::Client,
    base_url: Url,
    releases: RwLock<HashMap<String, Arc<str>>>,
}

impl ReleaseManifests {
    /// `base_url` is the directory holding one sub-directory per release tag
    pub fn new(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("shoot-flux/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FluxError::ManifestError(format!("error creating HTTP client: {}", e)))?;

        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(ReleaseManifests {
            http,
            base_url,
            releases: RwLock::new(HashMap::new()),
        })
    }

    fn asset_url(&self, version: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{}/{}", version, INSTALL_ASSET))
            .map_err(|e| FluxError::ManifestError(format!("invalid release URL for {}: {}", version, e)))
    }

    async fn upstream(&self, version: &str) -> Result<Arc<str>> {
        if let Some(manifest) = self.releases.read().await.get(version) {
            debug!("Using cached install manifest for Flux {}", version);
            return Ok(manifest.clone());
        }

        let url = self.asset_url(version)?;
        info!(%url, "Downloading Flux install manifest");
        let download_error =
            |e: reqwest::Error| FluxError::ManifestError(format!("error downloading {}: {}", url, e));
        let body = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(download_error)?
            .text()
            .await
            .map_err(download_error)?;

        let manifest: Arc<str> = Arc::from(body);
        self.releases
            .write()
            .await
            .insert(version.to_string(), manifest.clone());
        Ok(manifest)
    }
}

#[async_trait]
impl ManifestGenerator for ReleaseManifests {
    #[instrument(skip_all, fields(version = %installation.version()))]
    async fn generate(&self, installation: &FluxInstallation) -> Result<Vec<u8>> {
        let version = installation.version();
        check_flux_version(version).map_err(|e| {
            FluxError::ManifestError(format!(
                "error generating install manifest: unsupported Flux version {:?}: {}",
                version, e
            ))
        })?;

        let upstream = self.upstream(version).await?;
        customize(&upstream, installation)
    }
}

/// Move a release install manifest to the registry and namespace of `installation`.
///
/// Controller images keep their component tags. Cluster-scoped RBAC objects are suffixed with
/// the namespace, like the release does for `flux-system`.
pub fn customize(upstream: &str, installation: &FluxInstallation) -> Result<Vec<u8>> {
    let registry = installation.registry().trim_end_matches('/');
    let namespace = installation.namespace();
    if registry.is_empty() || namespace.trim().is_empty() {
        return Err(FluxError::ManifestError(
            "error generating install manifest: registry and namespace must not be empty".to_string(),
        ));
    }

    let mut manifest = String::new();
    for document in serde_yaml::Deserializer::from_str(upstream) {
        let mut object = Value::deserialize(document).map_err(|e| {
            FluxError::ManifestError(format!("invalid release install manifest: {}", e))
        })?;
        if object.is_null() {
            continue;
        }

        relocate(&mut object, namespace);
        rewrite_images(&mut object, registry);

        let rendered = serde_yaml::to_string(&object)
            .map_err(|e| FluxError::ManifestError(format!("error rendering install manifest: {}", e)))?;
        manifest.push_str("---\n");
        manifest.push_str(&rendered);
    }
    Ok(manifest.into_bytes())
}

fn relocate(object: &mut Value, namespace: &str) {
    let kind = object
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let cluster_rbac = kind == "ClusterRole" || kind == "ClusterRoleBinding";

    if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
        if kind == "Namespace" {
            retarget(metadata.get_mut("name"), namespace);
        } else {
            retarget(metadata.get_mut("namespace"), namespace);
        }
        if cluster_rbac {
            resuffix(metadata.get_mut("name"), namespace);
        }
        if let Some(labels) = metadata.get_mut("labels").and_then(Value::as_object_mut) {
            retarget(labels.get_mut(INSTANCE_LABEL), namespace);
        }
    }

    if kind == "ClusterRoleBinding" {
        if let Some(role_ref) = object.get_mut("roleRef") {
            resuffix(role_ref.get_mut("name"), namespace);
        }
    }
    if let Some(subjects) = object.get_mut("subjects").and_then(Value::as_array_mut) {
        for subject in subjects {
            retarget(subject.get_mut("namespace"), namespace);
        }
    }
}

fn retarget(field: Option<&mut Value>, namespace: &str) {
    if let Some(value) = field {
        if *value == UPSTREAM_NAMESPACE {
            *value = Value::from(namespace);
        }
    }
}

fn resuffix(field: Option<&mut Value>, namespace: &str) {
    let Some(value) = field else { return };
    let renamed = value
        .as_str()
        .and_then(|name| name.strip_suffix(UPSTREAM_NAMESPACE))
        .filter(|base| base.ends_with('-'))
        .map(|base| format!("{}{}", base, namespace));
    if let Some(renamed) = renamed {
        *value = Value::from(renamed);
    }
}

fn rewrite_images(value: &mut Value, registry: &str) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                match field {
                    Value::String(image) if key == "image" => {
                        let moved = image
                            .strip_prefix(UPSTREAM_REGISTRY)
                            .and_then(|rest| rest.strip_prefix('/'))
                            .map(|rest| format!("{}/{}", registry, rest));
                        if let Some(moved) = moved {
                            *image = moved;
                        }
                    }
                    _ => rewrite_images(field, registry),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_images(item, registry);
            }
        }
        _ => {}
    }
}
