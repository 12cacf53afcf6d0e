// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

use crate::api::FluxInstallation;
use crate::bootstrap::manifest::{customize, ManifestGenerator};

type Responses = HashMap<(String, String), VecDeque<(u16, String)>>;

/// A request received by the mock
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Responses registered as a sequence are handed out in order, the last one repeating forever.
/// Unmatched requests get a 404, or an echo of the request body for PATCH when `echo_patches` is set.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<Responses>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    echo_patches: bool,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            echo_patches: false,
        }
    }

    /// Add a response for requests with the given method and exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.on_sequence(method, path, vec![(status, body.to_string())])
    }

    /// Add a sequence of responses for requests with the given method and exact path
    pub fn on_sequence(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Answer unmatched PATCH requests with the patch itself, like an apply that changed nothing
    pub fn echo_patches(mut self) -> Self {
        self.echo_patches = true;
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests received so far with the given method
    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mock = self.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let query = req.uri().query().map(str::to_string);
            let body = req.into_body().collect().await?.to_bytes();

            mock.requests.lock().unwrap().push(RecordedRequest {
                method: method.clone(),
                path: path.clone(),
                query,
                body: body.clone(),
            });

            let (status, body) = match mock.find_response(&method, &path) {
                Some((status, body)) => (status, Bytes::from(body)),
                None if method == "PATCH" && mock.echo_patches => (200, body),
                // Default 404 for unmatched requests
                None => (404, Bytes::from(not_found_json("object", &path))),
            };

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.to_vec()))?)
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock secret JSON response
pub fn secret_json(
    namespace: &str,
    name: &str,
    labels: serde_json::Value,
    data: serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": labels
        },
        "data": data
    })
}

/// Wrap items into a list response
pub fn list_json(kind: &str, items: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a 409 already exists response
pub fn already_exists_json(resource: &str, name: &str) -> String {
    status_json(409, "AlreadyExists", &format!("{} \"{}\" already exists", resource, name))
}

/// Create a failure Status response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create an APIResourceList discovery response from (plural, kind, namespaced) triples
pub fn api_resource_list(group_version: &str, resources: &[(&str, &str, bool)]) -> String {
    let resources: Vec<serde_json::Value> = resources
        .iter()
        .map(|(plural, kind, namespaced)| {
            serde_json::json!({
                "name": plural,
                "singularName": kind.to_lowercase(),
                "namespaced": namespaced,
                "kind": kind,
                "verbs": ["create", "delete", "get", "list", "patch", "update", "watch"]
            })
        })
        .collect();
    serde_json::json!({
        "kind": "APIResourceList",
        "groupVersion": group_version,
        "resources": resources
    })
    .to_string()
}

/// Register discovery responses for every kind in the Flux install manifest
pub fn with_install_discovery(mock: MockService) -> MockService {
    mock.on_get(
        "/api/v1",
        200,
        &api_resource_list(
            "v1",
            &[
                ("namespaces", "Namespace", false),
                ("serviceaccounts", "ServiceAccount", true),
                ("services", "Service", true),
                ("secrets", "Secret", true),
            ],
        ),
    )
    .on_get(
        "/apis/apiextensions.k8s.io/v1",
        200,
        &api_resource_list(
            "apiextensions.k8s.io/v1",
            &[("customresourcedefinitions", "CustomResourceDefinition", false)],
        ),
    )
    .on_get(
        "/apis/rbac.authorization.k8s.io/v1",
        200,
        &api_resource_list(
            "rbac.authorization.k8s.io/v1",
            &[
                ("clusterroles", "ClusterRole", false),
                ("clusterrolebindings", "ClusterRoleBinding", false),
            ],
        ),
    )
    .on_get(
        "/apis/apps/v1",
        200,
        &api_resource_list("apps/v1", &[("deployments", "Deployment", true)]),
    )
    .on_get(
        "/apis/networking.k8s.io/v1",
        200,
        &api_resource_list("networking.k8s.io/v1", &[("networkpolicies", "NetworkPolicy", true)]),
    )
}

/// Generates the install manifest from the bundled release excerpt instead of downloading it
pub struct FixtureManifests;

#[async_trait::async_trait]
impl ManifestGenerator for FixtureManifests {
    async fn generate(&self, installation: &FluxInstallation) -> crate::error::Result<Vec<u8>> {
        customize(include_str!("bootstrap/testdata/install.yaml"), installation)
    }
}

/// An established GitRepository CRD
pub fn established_crd_json() -> String {
    serde_json::json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": { "name": "gitrepositories.source.toolkit.fluxcd.io" },
        "spec": {
            "group": "source.toolkit.fluxcd.io",
            "names": { "kind": "GitRepository", "plural": "gitrepositories" },
            "scope": "Namespaced",
            "versions": []
        },
        "status": {
            "conditions": [
                { "type": "NamesAccepted", "status": "True" },
                { "type": "Established", "status": "True" }
            ]
        }
    })
    .to_string()
}

/// A Deployment with the given Available condition status
pub fn deployment_json(namespace: &str, name: &str, available: &str) -> String {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": namespace, "generation": 1 },
        "spec": {
            "selector": { "matchLabels": { "app": name } },
            "template": { "metadata": { "labels": { "app": name } } }
        },
        "status": {
            "observedGeneration": 1,
            "conditions": [{ "type": "Available", "status": available }]
        }
    })
    .to_string()
}

/// A Flux object (GitRepository or Kustomization) with an optional Ready condition
pub fn flux_object_json(
    api_version: &str,
    kind: &str,
    namespace: &str,
    name: &str,
    ready: Option<(&str, &str)>,
) -> String {
    let conditions: Vec<serde_json::Value> = ready
        .map(|(status, message)| {
            serde_json::json!({
                "type": "Ready",
                "status": status,
                "reason": "Test",
                "message": message
            })
        })
        .into_iter()
        .collect();
    serde_json::json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": { "name": name, "namespace": namespace },
        "spec": {},
        "status": { "conditions": conditions }
    })
    .to_string()
}

/// Short polling bounds so waits in tests finish quickly
pub fn fast_timeouts() -> crate::config::Timeouts {
    use std::time::Duration;

    crate::config::Timeouts {
        install_poll_interval: Duration::from_millis(5),
        install_timeout: Duration::from_millis(200),
        bootstrap_poll_interval: Duration::from_millis(5),
        bootstrap_timeout: Duration::from_millis(200),
    }
}
