// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The `FluxBootstrapped` condition recording that Flux was bootstrapped once.
//!
//! Once the condition is True the extension never touches the Flux objects in the shoot again,
//! so users are free to manage them from Git afterwards.

use chrono::{SecondsFormat, Utc};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, instrument};

use crate::constants::condition::{BOOTSTRAPPED, BOOTSTRAPPED_MESSAGE, BOOTSTRAPPED_REASON};
use crate::error::Result;
use crate::types::condition::{find_condition, Condition, STATUS_TRUE};
use crate::types::Extension;

/// Whether Flux was bootstrapped successfully at least once
pub fn is_flux_bootstrapped(extension: &Extension) -> bool {
    find_condition(extension.conditions(), BOOTSTRAPPED).is_some_and(Condition::is_true)
}

fn bootstrapped_condition() -> Condition {
    Condition {
        condition_type: BOOTSTRAPPED.to_string(),
        status: STATUS_TRUE.to_string(),
        reason: Some(BOOTSTRAPPED_REASON.to_string()),
        message: Some(BOOTSTRAPPED_MESSAGE.to_string()),
        ..Default::default()
    }
}

/// Merge `new` into `existing`, replacing a condition of the same type.
///
/// The transition time only moves when the status changes; the update time moves on any change.
/// Returns the merged list and whether anything changed.
pub fn merge_condition(existing: &[Condition], new: Condition, now: &str) -> (Vec<Condition>, bool) {
    let mut merged = existing.to_vec();

    let Some(index) = merged
        .iter()
        .position(|c| c.condition_type == new.condition_type)
    else {
        merged.push(Condition {
            last_transition_time: Some(now.to_string()),
            last_update_time: Some(now.to_string()),
            ..new
        });
        return (merged, true);
    };

    let old = &mut merged[index];
    if old.status == new.status
        && old.reason == new.reason
        && old.message == new.message
        && old.observed_generation == new.observed_generation
    {
        return (merged, false);
    }

    let last_transition_time = if old.status == new.status {
        old.last_transition_time.clone()
    } else {
        Some(now.to_string())
    };
    *old = Condition {
        last_transition_time,
        last_update_time: Some(now.to_string()),
        ..new
    };
    (merged, true)
}

/// Record the bootstrapped condition in the Extension status.
///
/// The patch carries the observed resourceVersion, so a concurrent modification fails with a
/// conflict instead of being overwritten.
#[instrument(skip_all, fields(extension = %extension.key()))]
pub async fn set_flux_bootstrapped(client: &Client, extension: &Extension) -> Result<()> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let (conditions, changed) = merge_condition(extension.conditions(), bootstrapped_condition(), &now);
    if !changed {
        debug!("{} condition is already up to date", BOOTSTRAPPED);
        return Ok(());
    }

    let namespace = extension.namespace().unwrap_or_default();
    let extensions: Api<Extension> = Api::namespaced(client.clone(), &namespace);
    let patch = serde_json::json!({
        "metadata": { "resourceVersion": extension.resource_version() },
        "status": { "conditions": conditions }
    });
    extensions
        .patch_status(&extension.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    debug!("Set {} condition", BOOTSTRAPPED);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{status_json, MockService};
    use http::{Method, Request, Response};
    use http_body_util::BodyExt;
    use kube::client::Body;

    const STATUS_PATH: &str =
        "/apis/extensions.gardener.cloud/v1alpha1/namespaces/shoot--project--name/extensions/shoot-flux/status";

    fn condition(condition_type: &str, status: &str, reason: &str) -> Condition {
        Condition {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            reason: Some(reason.to_string()),
            message: Some("msg".to_string()),
            last_transition_time: Some("2026-01-01T00:00:00Z".to_string()),
            last_update_time: Some("2026-01-01T00:00:00Z".to_string()),
            observed_generation: None,
        }
    }

    fn extension_json(conditions: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "extensions.gardener.cloud/v1alpha1",
            "kind": "Extension",
            "metadata": {
                "name": "shoot-flux",
                "namespace": "shoot--project--name",
                "resourceVersion": "42"
            },
            "spec": { "type": "shoot-flux" },
            "status": { "conditions": conditions }
        })
    }

    fn extension(conditions: serde_json::Value) -> Extension {
        serde_json::from_value(extension_json(conditions)).unwrap()
    }

    #[test]
    fn test_merge_adds_missing_condition() {
        let existing = vec![condition("Other", "True", "Fine")];
        let (merged, changed) = merge_condition(&existing, bootstrapped_condition(), "now");

        assert!(changed);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], existing[0]);
        assert_eq!(merged[1].condition_type, BOOTSTRAPPED);
        assert_eq!(merged[1].last_transition_time.as_deref(), Some("now"));
        assert_eq!(merged[1].last_update_time.as_deref(), Some("now"));
    }

    #[test]
    fn test_merge_unchanged_condition() {
        let existing = vec![Condition {
            last_transition_time: Some("then".to_string()),
            ..bootstrapped_condition()
        }];
        let (merged, changed) = merge_condition(&existing, bootstrapped_condition(), "now");

        assert!(!changed);
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_merge_status_change_moves_transition_time() {
        let existing = vec![condition(BOOTSTRAPPED, "False", "BootstrapFailed")];
        let (merged, changed) = merge_condition(&existing, bootstrapped_condition(), "now");

        assert!(changed);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_true());
        assert_eq!(merged[0].last_transition_time.as_deref(), Some("now"));
        assert_eq!(merged[0].message.as_deref(), Some(BOOTSTRAPPED_MESSAGE));
    }

    #[test]
    fn test_merge_same_status_keeps_transition_time() {
        let existing = vec![condition(BOOTSTRAPPED, "True", "SomethingElse")];
        let (merged, changed) = merge_condition(&existing, bootstrapped_condition(), "now");

        assert!(changed);
        assert_eq!(
            merged[0].last_transition_time.as_deref(),
            Some("2026-01-01T00:00:00Z")
        );
        assert_eq!(merged[0].last_update_time.as_deref(), Some("now"));
        assert_eq!(merged[0].reason.as_deref(), Some(BOOTSTRAPPED_REASON));
    }

    #[test]
    fn test_is_flux_bootstrapped() {
        assert!(is_flux_bootstrapped(&extension(serde_json::json!([
            { "type": "FluxBootstrapped", "status": "True" }
        ]))));
        assert!(!is_flux_bootstrapped(&extension(serde_json::json!([
            { "type": "FluxBootstrapped", "status": "Unknown" }
        ]))));
        assert!(!is_flux_bootstrapped(&extension(serde_json::json!([]))));
    }

    #[tokio::test]
    async fn test_set_then_refetch_is_bootstrapped() {
        let (service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = kube::Client::new(service, "default");

        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("patch not sent");
            assert_eq!(request.method(), Method::PATCH);
            assert_eq!(request.uri().path(), STATUS_PATH);
            assert_eq!(
                request.headers().get("content-type").unwrap(),
                "application/merge-patch+json"
            );
            let body = request.into_body().collect().await.unwrap().to_bytes();
            let patch: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(patch["metadata"]["resourceVersion"], "42");
            assert_eq!(patch["status"]["conditions"][0]["type"], BOOTSTRAPPED);
            assert_eq!(patch["status"]["conditions"][0]["reason"], BOOTSTRAPPED_REASON);

            let updated = extension_json(patch["status"]["conditions"].clone());
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&updated).unwrap()))
                    .unwrap(),
            );

            let (request, send) = handle.next_request().await.expect("get not sent");
            assert_eq!(request.method(), Method::GET);
            send.send_response(
                Response::builder()
                    .body(Body::from(serde_json::to_vec(&updated).unwrap()))
                    .unwrap(),
            );
        });

        let ext = extension(serde_json::json!([]));
        assert!(!is_flux_bootstrapped(&ext));
        set_flux_bootstrapped(&client, &ext).await.unwrap();

        let api: Api<Extension> = Api::namespaced(client, "shoot--project--name");
        let fresh = api.get("shoot-flux").await.unwrap();
        assert!(is_flux_bootstrapped(&fresh));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_set_is_skipped_when_up_to_date() {
        let mock = MockService::new();
        let ext = extension(serde_json::json!([{
            "type": "FluxBootstrapped",
            "status": "True",
            "reason": BOOTSTRAPPED_REASON,
            "message": BOOTSTRAPPED_MESSAGE
        }]));

        set_flux_bootstrapped(&mock.clone().into_client(), &ext)
            .await
            .unwrap();
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_is_surfaced() {
        let mock = MockService::new().on(
            "PATCH",
            STATUS_PATH,
            409,
            &status_json(409, "Conflict", "the object has been modified"),
        );

        let err = set_flux_bootstrapped(&mock.into_client(), &extension(serde_json::json!([])))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("the object has been modified"));
    }
}
