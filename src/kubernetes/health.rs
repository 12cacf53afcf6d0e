// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Readiness checks for the objects waited on during bootstrap.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use crate::kubernetes::wait::Readiness;
use crate::types::condition::{find_condition, STATUS_FALSE, STATUS_TRUE};
use crate::types::flux::ObjectWithConditions;

const READY: &str = "Ready";

/// Evaluate a Flux object by its `Ready` condition.
///
/// A `False` condition is terminal, anything else (missing or `Unknown`) keeps the wait going.
pub fn check_flux_object<K: ObjectWithConditions>(object: &K) -> Readiness {
    match find_condition(object.conditions(), READY) {
        Some(c) if c.is_true() => Readiness::Ready,
        Some(c) if c.is_false() => Readiness::Failed(format!(
            "reconciliation failed: {}",
            c.message.as_deref().unwrap_or_default()
        )),
        _ => Readiness::Pending("has not been reconciled yet".to_string()),
    }
}

/// A CRD is usable once its names are accepted and it is established
pub fn check_custom_resource_definition(crd: &CustomResourceDefinition) -> Readiness {
    let conditions = crd
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    for wanted in ["NamesAccepted", "Established"] {
        let status = conditions
            .iter()
            .find(|c| c.type_ == wanted)
            .map(|c| c.status.as_str());
        if status != Some(STATUS_TRUE) {
            return Readiness::Pending(format!(
                "CustomResourceDefinition condition {} is not True",
                wanted
            ));
        }
    }
    Readiness::Ready
}

/// A Deployment is healthy once the controller observed its latest spec and reports it available.
///
/// Unhealthy states, an exceeded progress deadline included, stay pending so the install wait
/// reports the latest problem when it times out.
pub fn check_deployment(deployment: &Deployment) -> Readiness {
    let Some(status) = deployment.status.as_ref() else {
        return Readiness::Pending("Deployment has no status yet".to_string());
    };

    let generation = deployment.metadata.generation.unwrap_or_default();
    if status.observed_generation.unwrap_or_default() < generation {
        return Readiness::Pending(format!(
            "observed generation outdated ({}/{})",
            status.observed_generation.unwrap_or_default(),
            generation
        ));
    }

    let conditions = status.conditions.as_deref().unwrap_or_default();
    if let Some(progressing) = conditions.iter().find(|c| c.type_ == "Progressing") {
        if progressing.status == STATUS_FALSE
            && progressing.reason.as_deref() == Some("ProgressDeadlineExceeded")
        {
            return Readiness::Pending(format!(
                "Deployment exceeded its progress deadline: {}",
                progressing.message.as_deref().unwrap_or_default()
            ));
        }
    }

    match conditions.iter().find(|c| c.type_ == "Available") {
        Some(c) if c.status == STATUS_TRUE => Readiness::Ready,
        _ => Readiness::Pending("Deployment is not available yet".to_string()),
    }
}
