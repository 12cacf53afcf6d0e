// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes resource types read and written by the operator.

pub mod cluster;
pub mod condition;
pub mod extension;
pub mod flux;

pub use cluster::{Cluster, NamedResourceReference};
pub use condition::Condition;
pub use extension::Extension;
pub use flux::{GitRepository, Kustomization, ObjectWithConditions};
