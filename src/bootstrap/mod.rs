// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bootstrapping Flux into a shoot: install, secrets, GitRepository, Kustomization and the
//! bootstrapped marker.

pub mod actuator;
pub mod flux;
pub mod install;
pub mod manifest;
pub mod marker;
pub mod secrets;

pub use actuator::{Actuator, FluxActuator, Operation};
pub use manifest::{ManifestGenerator, ReleaseManifests};
pub use marker::{is_flux_bootstrapped, merge_condition, set_flux_bootstrapped};
