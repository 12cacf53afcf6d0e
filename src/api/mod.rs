// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The `FluxConfig` provider configuration carried by Extension resources.

pub mod defaults;
pub mod registry;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::flux::{GitRepositoryTemplate, KustomizationTemplate};

pub use registry::ConfigRegistry;

pub const API_VERSION: &str = "flux.extensions.gardener.cloud/v1alpha1";
pub const KIND: &str = "FluxConfig";

/// Specifies how to bootstrap Flux on the shoot cluster.
/// Source and Kustomization are only created when both are given; otherwise only Flux itself is installed.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FluxConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub flux: FluxInstallation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomization: Option<Kustomization>,
    /// Further secrets from `Shoot.spec.resources` to copy into the Flux namespace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_secret_resources: Vec<AdditionalResource>,
}

/// The Flux installation in the shoot; every field is defaulted
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FluxInstallation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl FluxInstallation {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(constants::defaults::FLUX_VERSION)
    }

    pub fn registry(&self) -> &str {
        self.registry.as_deref().unwrap_or(constants::defaults::FLUX_REGISTRY)
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(constants::defaults::FLUX_NAMESPACE)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub template: GitRepositoryTemplate,
    /// Name of an entry in `Shoot.spec.resources` holding the GitRepository credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_resource_name: Option<String>,
}

impl Source {
    pub fn secret_resource_name(&self) -> Option<&str> {
        self.secret_resource_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    pub template: KustomizationTemplate,
}

/// A secret from `Shoot.spec.resources` to be copied into the shoot
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalResource {
    pub name: String,
    /// Name of the secret in the shoot, defaults to the referenced resource's name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
}
