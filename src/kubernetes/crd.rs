// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::{FluxError, Result, WaitError};
use kube::{
    core::GroupVersionKind,
    discovery::{self, ApiCapabilities, ApiResource},
    Client,
};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const EXTENSIONS_GROUP: &str = "extensions.gardener.cloud";
const EXTENSIONS_VERSION: &str = "v1alpha1";
const EXTENSION_KIND: &str = "Extension";

/// Wait for the Extension CRD to be served by the seed API server.
/// Polls with exponential backoff starting at POLL_INTERVAL_SECS seconds, until found or cancelled.
pub async fn wait_for_extension_crd(client: &Client, cancel: &CancellationToken) -> Result<()> {
    let gvk = GroupVersionKind::gvk(EXTENSIONS_GROUP, EXTENSIONS_VERSION, EXTENSION_KIND);
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match discover(client, &gvk).await {
            Ok(Some(_)) => {
                info!("Extension CRD ({}/{}) is available", EXTENSIONS_GROUP, EXTENSIONS_VERSION);
                return Ok(());
            }
            Ok(None) => {
                info!(
                    "Extension CRD ({}/{}) not yet available, waiting {} seconds...",
                    EXTENSIONS_GROUP, EXTENSIONS_VERSION, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Extension CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FluxError::waiting(
                    "error waiting for Extension CRD",
                    WaitError::Cancelled,
                ));
            }
            _ = sleep(Duration::from_secs(interval)) => {}
        }

        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Resolve a kind, mapping "not served" to `None` and keeping real failures as errors.
async fn discover(
    client: &Client,
    gvk: &GroupVersionKind,
) -> Result<Option<(ApiResource, ApiCapabilities)>> {
    match discovery::pinned_kind(client, gvk).await {
        Ok(found) => Ok(Some(found)),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
        Err(kube::Error::Discovery(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
