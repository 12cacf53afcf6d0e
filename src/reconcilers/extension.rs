// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Extension reconciler - watches Gardener Extension resources of our type and runs the actuator.

use crate::bootstrap::{Actuator, Operation};
use crate::config::Config;
use crate::constants::FINALIZER;
use crate::error::{FluxError, Result};
use crate::types::Extension;
use futures::StreamExt;
use kube::{
    runtime::{
        controller::{self, Action},
        finalizer::{finalizer, Event as Finalizer},
        Controller,
    },
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub struct ExtensionReconciler {
    client: Client,
    actuator: Arc<dyn Actuator>,
    config: Config,
    cancel: CancellationToken,
}

impl ExtensionReconciler {
    pub fn new(
        client: Client,
        actuator: Arc<dyn Actuator>,
        config: Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            actuator,
            config,
            cancel,
        }
    }

    /// Run the controller until the cancellation token fires
    pub async fn run(self) -> anyhow::Result<()> {
        let extensions: Api<Extension> = Api::all(self.client.clone());
        let shutdown = self.cancel.clone();
        let concurrency = self.config.max_concurrent_reconciles;
        let context = Arc::new(self);

        Controller::new(extensions, WatcherConfig::default())
            .with_config(controller::Config::default().concurrency(concurrency))
            .graceful_shutdown_on(async move { shutdown.cancelled().await })
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled extension: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        info!("Extension controller stopped");
        Ok(())
    }
}

#[instrument(skip_all, fields(extension = %extension.key()))]
async fn reconcile(extension: Arc<Extension>, ctx: Arc<ExtensionReconciler>) -> Result<Action> {
    if extension.spec.extension_type != ctx.config.extension_type {
        debug!("Skipping extension of type {}", extension.spec.extension_type);
        return Ok(Action::await_change());
    }

    let namespace = extension.namespace().unwrap_or_default();
    let extensions: Api<Extension> = Api::namespaced(ctx.client.clone(), &namespace);

    finalizer(&extensions, FINALIZER, extension, |event| async {
        match event {
            Finalizer::Apply(extension) => {
                let operation = Operation::requested(&extension);
                info!("Running {} operation", operation);
                ctx.actuator
                    .execute(operation, &extension, &ctx.cancel)
                    .await?;
                Ok::<_, FluxError>(Action::requeue(ctx.config.resync_interval))
            }
            Finalizer::Cleanup(extension) => {
                info!("Running {} operation", Operation::Delete);
                ctx.actuator
                    .execute(Operation::Delete, &extension, &ctx.cancel)
                    .await?;
                Ok(Action::await_change())
            }
        }
    })
    .await
    .map_err(|e| FluxError::Finalizer(e.to_string()))
}

fn error_policy(extension: Arc<Extension>, error: &FluxError, ctx: Arc<ExtensionReconciler>) -> Action {
    warn!(extension = %extension.key(), "Reconciliation failed: {}", error);
    Action::requeue(ctx.config.error_requeue)
}
