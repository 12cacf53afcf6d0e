// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::constants::OPERATION_ANNOTATION;
use crate::types::condition::Condition;

/// Gardener's per-shoot extension resource, living in the shoot's namespace in the seed
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "extensions.gardener.cloud", version = "v1alpha1", kind = "Extension")]
#[kube(namespaced)]
#[kube(status = "ExtensionStatus")]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSpec {
    #[serde(rename = "type")]
    pub extension_type: String,
    /// Opaque provider specific configuration, decoded into a FluxConfig
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Extension {
    /// Status conditions, empty if the status has not been written yet
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    /// The operation requested through the Gardener operation annotation, if any
    pub fn operation_annotation(&self) -> Option<&str> {
        self.annotations().get(OPERATION_ANNOTATION).map(String::as_str)
    }

    /// Display key used in logs
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace().unwrap_or_default(), self.name_any())
    }
}
