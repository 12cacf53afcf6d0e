// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sequences the bootstrap of Flux for a single Extension.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use kube::{Client, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::api::ConfigRegistry;
use crate::bootstrap::flux::{bootstrap_kustomization, bootstrap_source, SeedSecrets};
use crate::bootstrap::install::install_flux;
use crate::bootstrap::manifest::ManifestGenerator;
use crate::bootstrap::marker::{is_flux_bootstrapped, set_flux_bootstrapped};
use crate::bootstrap::secrets::reconcile_secrets;
use crate::config::Timeouts;
use crate::error::{FluxError, Result};
use crate::kubernetes::ShootClientFactory;
use crate::types::cluster::get_cluster;
use crate::types::Extension;

/// The lifecycle operation requested for an Extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Reconcile,
    Delete,
    Restore,
    Migrate,
}

impl Operation {
    /// The operation for a live Extension, honouring Gardener's operation annotation
    pub fn requested(extension: &Extension) -> Self {
        match extension.operation_annotation() {
            Some("migrate") => Operation::Migrate,
            Some("restore") => Operation::Restore,
            _ => Operation::Reconcile,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Reconcile => "reconcile",
            Operation::Delete => "delete",
            Operation::Restore => "restore",
            Operation::Migrate => "migrate",
        };
        f.write_str(name)
    }
}

/// Lifecycle hooks invoked by the Extension controller
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn reconcile(&self, extension: &Extension, cancel: &CancellationToken) -> Result<()>;
    async fn delete(&self, extension: &Extension) -> Result<()>;
    async fn restore(&self, extension: &Extension) -> Result<()>;
    async fn migrate(&self, extension: &Extension) -> Result<()>;

    async fn execute(
        &self,
        operation: Operation,
        extension: &Extension,
        cancel: &CancellationToken,
    ) -> Result<()> {
        match operation {
            Operation::Reconcile => self.reconcile(extension, cancel).await,
            Operation::Delete => self.delete(extension).await,
            Operation::Restore => self.restore(extension).await,
            Operation::Migrate => self.migrate(extension).await,
        }
    }
}

/// Installs Flux into the shoot and creates the initial GitRepository and Kustomization
pub struct FluxActuator {
    seed: Client,
    registry: Arc<ConfigRegistry>,
    shoot_clients: Arc<dyn ShootClientFactory>,
    generator: Arc<dyn ManifestGenerator>,
    timeouts: Timeouts,
}

impl FluxActuator {
    pub fn new(
        seed: Client,
        registry: Arc<ConfigRegistry>,
        shoot_clients: Arc<dyn ShootClientFactory>,
        generator: Arc<dyn ManifestGenerator>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            seed,
            registry,
            shoot_clients,
            generator,
            timeouts,
        }
    }
}

#[async_trait]
impl Actuator for FluxActuator {
    #[instrument(skip_all, fields(extension = %extension.key()))]
    async fn reconcile(&self, extension: &Extension, cancel: &CancellationToken) -> Result<()> {
        let namespace = extension.namespace().unwrap_or_default();

        let cluster = get_cluster(&self.seed, &namespace).await?;
        let resources = cluster.shoot_resources()?;

        let config = self
            .registry
            .decode(extension.spec.provider_config.as_ref())?;
        self.registry.validate(&config, &resources)?;

        if is_flux_bootstrapped(extension) {
            debug!("Flux installation has been bootstrapped already, skipping reconciliation of Flux resources");
            return Ok(());
        }

        let shoot = self
            .shoot_clients
            .client_for(extension)
            .await
            .map_err(|e| FluxError::ShootClient(Box::new(e)))?;

        install_flux(
            &shoot,
            &config.flux,
            self.generator.as_ref(),
            &self.timeouts,
            cancel,
        )
        .await
        .map_err(|e| FluxError::Install(Box::new(e)))?;

        reconcile_secrets(&self.seed, &shoot, &namespace, &config, &resources)
            .await
            .map_err(|e| FluxError::ReconcileSecrets(Box::new(e)))?;

        if let (Some(source), Some(kustomization)) = (&config.source, &config.kustomization) {
            let seed = SeedSecrets {
                client: &self.seed,
                namespace: &namespace,
                resources: &resources,
            };
            bootstrap_source(&shoot, &seed, &config, source, &self.timeouts, cancel)
                .await
                .map_err(|e| FluxError::BootstrapSource(Box::new(e)))?;

            bootstrap_kustomization(&shoot, &kustomization.template, &self.timeouts, cancel)
                .await
                .map_err(|e| FluxError::BootstrapKustomization(Box::new(e)))?;
        }

        set_flux_bootstrapped(&self.seed, extension)
            .await
            .map_err(|e| FluxError::MarkBootstrapped(Box::new(e)))?;

        info!("Flux has been bootstrapped");
        Ok(())
    }

    // The Flux components and objects stay in the shoot; they go away with the shoot anyway.
    async fn delete(&self, extension: &Extension) -> Result<()> {
        debug!(extension = %extension.key(), "Nothing to delete");
        Ok(())
    }

    async fn restore(&self, extension: &Extension) -> Result<()> {
        debug!(extension = %extension.key(), "Nothing to restore");
        Ok(())
    }

    async fn migrate(&self, extension: &Extension) -> Result<()> {
        debug!(extension = %extension.key(), "Nothing to migrate");
        Ok(())
    }
}
