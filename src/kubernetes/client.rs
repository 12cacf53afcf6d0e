// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Shoot cluster client creation and kubeconfig utilities

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config as KConfig, ResourceExt};
use tracing::{debug, instrument};

use crate::constants::seed::{SHOOT_ACCESS_KUBECONFIG_KEY, SHOOT_ACCESS_SECRET};
use crate::error::{FluxError, Result};
use crate::types::Extension;

/// Produces an API client for the shoot cluster an Extension belongs to
#[async_trait]
pub trait ShootClientFactory: Send + Sync {
    async fn client_for(&self, extension: &Extension) -> Result<Client>;
}

/// Builds shoot clients from the access kubeconfig Gardener maintains in the shoot namespace
pub struct KubeconfigShootClients {
    seed: Client,
    testing_mode: bool,
}

impl KubeconfigShootClients {
    pub fn new(seed: Client, testing_mode: bool) -> Self {
        Self { seed, testing_mode }
    }
}

#[async_trait]
impl ShootClientFactory for KubeconfigShootClients {
    #[instrument(skip(self, extension), fields(extension = %extension.key()))]
    async fn client_for(&self, extension: &Extension) -> Result<Client> {
        if self.testing_mode {
            return create_testing_client().await;
        }
        let namespace = extension.namespace().unwrap_or_default();
        let kubeconfig = get_shoot_kubeconfig(&self.seed, &namespace).await?;
        create_client_from_kubeconfig(&kubeconfig).await
    }
}

/// Create a client for testing mode from the ambient kubeconfig
async fn create_testing_client() -> Result<Client> {
    let config = KConfig::infer()
        .await
        .map_err(|e| FluxError::KubeconfigError(format!("Failed to infer config: {}", e)))?;
    debug!("Testing mode: using inferred config for {}", config.cluster_url);

    Client::try_from(config)
        .map_err(|e| FluxError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Read the shoot access kubeconfig from the shoot namespace in the seed
#[instrument(skip(client))]
async fn get_shoot_kubeconfig(client: &Client, namespace: &str) -> Result<String> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    debug!(
        "Getting shoot access secret '{}/{}'",
        namespace, SHOOT_ACCESS_SECRET
    );

    let secret = secrets.get(SHOOT_ACCESS_SECRET).await.map_err(|e| {
        FluxError::KubeconfigError(format!(
            "Failed to get shoot access secret {}/{}: {}",
            namespace, SHOOT_ACCESS_SECRET, e
        ))
    })?;

    let Some(kubeconfig) = secret
        .data
        .as_ref()
        .and_then(|data| data.get(SHOOT_ACCESS_KUBECONFIG_KEY))
    else {
        return Err(FluxError::KubeconfigError(format!(
            "Shoot access secret {} does not contain '{}' key",
            secret.name_any(),
            SHOOT_ACCESS_KUBECONFIG_KEY
        )));
    };

    String::from_utf8(kubeconfig.0.clone()).map_err(|e| {
        FluxError::KubeconfigError(format!("Failed to decode shoot kubeconfig: {}", e))
    })
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| FluxError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config = KConfig::from_custom_kubeconfig(parsed, &KubeConfigOptions::default())
        .await
        .map_err(|e| FluxError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| FluxError::KubeconfigError(format!("Failed to create client: {}", e)))
}
