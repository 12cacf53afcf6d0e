// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

use crate::api::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum FluxError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("error decoding providerConfig: {0}")]
    DecodeError(String),

    #[error("invalid providerConfig: {0}")]
    InvalidConfig(#[from] ValidationErrors),

    #[error("secret resource name {0:?} does not match any of the resource names in Shoot.spec.resources[].name")]
    UnknownResource(String),

    #[error("source.template.spec.secretRef.name must be set when source.secretResourceName is set")]
    MissingSecretRef,

    #[error("failed to copy secret: {0}")]
    CopySecret(#[source] Box<FluxError>),

    #[error("error reading referenced secret {name}: {source}")]
    ReferencedSecret {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("{0}")]
    NamespaceError(String),

    #[error("{0}")]
    ManifestError(String),

    #[error("{context}: {source}")]
    Wait {
        context: String,
        #[source]
        source: WaitError,
    },

    #[error("error reading Cluster object: {0}")]
    ReadCluster(#[source] Box<FluxError>),

    #[error("error creating shoot client: {0}")]
    ShootClient(#[source] Box<FluxError>),

    #[error("error installing Flux: {0}")]
    Install(#[source] Box<FluxError>),

    #[error("error reconciling secrets: {0}")]
    ReconcileSecrets(#[source] Box<FluxError>),

    #[error("error bootstrapping Flux GitRepository: {0}")]
    BootstrapSource(#[source] Box<FluxError>),

    #[error("error bootstrapping Flux Kustomization: {0}")]
    BootstrapKustomization(#[source] Box<FluxError>),

    #[error("error marking successful bootstrapping: {0}")]
    MarkBootstrapped(#[source] Box<FluxError>),

    #[error("finalizer error: {0}")]
    Finalizer(String),
}

impl FluxError {
    /// Attach a message describing what was being waited for
    pub fn waiting(context: impl Into<String>, source: WaitError) -> Self {
        FluxError::Wait {
            context: context.into(),
            source,
        }
    }
}

/// Why waiting for an object did not end in success
#[derive(Error, Debug)]
pub enum WaitError {
    #[error("waiting was cancelled")]
    Cancelled,

    #[error("error reading object: {0}")]
    Fetch(#[source] kube::Error),

    /// The object reached a terminal, unhealthy state
    #[error("{0}")]
    Failed(String),

    /// The timeout elapsed; carries the last pending observation, if any
    #[error("{}", timeout_message(.last, .timeout))]
    Timeout {
        last: Option<String>,
        timeout: Duration,
    },
}

fn timeout_message(last: &Option<String>, timeout: &Duration) -> String {
    match last {
        Some(msg) => msg.clone(),
        None => format!("timed out after {timeout:?}"),
    }
}

pub type Result<T> = std::result::Result<T, FluxError>;
