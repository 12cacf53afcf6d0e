// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Polling an object until a readiness check reaches a verdict.

use std::fmt::Debug;
use std::time::Duration;

use kube::Api;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::WaitError;

/// Verdict of a readiness check on a freshly fetched object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Done, the object is healthy
    Ready,
    /// Done, the object reached a state it will not recover from by waiting
    Failed(String),
    /// Not done yet; the message is reported if the wait times out
    Pending(String),
}

/// Periodically read the named object and evaluate `check` on it until it reports a verdict.
///
/// Polls immediately and then every `interval`. A missing object counts as pending, so this can
/// wait for objects that are created asynchronously. Any other read error ends the wait at once.
/// On timeout the last pending message is returned instead of a bare deadline error.
#[instrument(skip(api, cancel, check))]
pub async fn wait_for_object<K, F>(
    api: &Api<K>,
    name: &str,
    interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<(), WaitError>
where
    K: Clone + DeserializeOwned + Debug,
    F: FnMut(&K) -> Readiness,
{
    let mut last: Option<String> = None;

    let poll = async {
        loop {
            if cancel.is_cancelled() {
                return Err(WaitError::Cancelled);
            }

            match api.get_opt(name).await {
                Ok(None) => {
                    debug!("{} not found yet", name);
                    last = Some(format!("{:?} not found", name));
                }
                Ok(Some(object)) => match check(&object) {
                    Readiness::Ready => return Ok(()),
                    Readiness::Failed(msg) => return Err(WaitError::Failed(msg)),
                    Readiness::Pending(msg) => {
                        debug!("{} not ready yet: {}", name, msg);
                        last = Some(msg);
                    }
                },
                Err(e) => return Err(WaitError::Fetch(e)),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = sleep(interval) => {}
            }
        }
    };

    let outcome = tokio::time::timeout(timeout, poll).await;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(WaitError::Timeout { last, timeout }),
    }
}
