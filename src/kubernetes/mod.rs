// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities: shoot clients, CRD discovery, namespaces, manifest apply and readiness polling.

pub mod apply;
pub mod client;
pub mod crd;
pub mod health;
pub mod namespaces;
pub mod wait;

pub use apply::apply_manifest;
pub use client::{KubeconfigShootClients, ShootClientFactory};
pub use crd::wait_for_extension_crd;
pub use namespaces::ensure_namespace_exists;
pub use wait::{wait_for_object, Readiness};
