// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The extension type this operator is responsible for
pub const EXTENSION_TYPE: &str = "shoot-flux";

/// The field manager used for server-side apply
pub const FIELD_MANAGER: &str = "shoot-flux";

/// Finalizer placed on Extension resources handled by this operator
pub const FINALIZER: &str = "extensions.gardener.cloud/shoot-flux";

/// Annotation Gardener uses to request a migrate or restore operation
pub const OPERATION_ANNOTATION: &str = "gardener.cloud/operation";

/// Labels applied to objects created in the shoot cluster
pub mod labels {
    /// Marks secrets copied into the shoot so they can be garbage collected.
    /// Must stay stable across versions, otherwise previously synced secrets are orphaned.
    pub const MANAGED_BY_KEY: &str = "app.kubernetes.io/managed-by";
    pub const MANAGED_BY_VALUE: &str = "gardener-extension-shoot-flux";
}

/// Status condition recorded on the Extension after the first successful bootstrap
pub mod condition {
    pub const BOOTSTRAPPED: &str = "FluxBootstrapped";
    pub const BOOTSTRAPPED_REASON: &str = "BootstrapSuccessful";
    pub const BOOTSTRAPPED_MESSAGE: &str =
        "Flux has been successfully bootstrapped on the Shoot cluster.";
}

/// Seed-side conventions for resources referenced by the Shoot
pub mod seed {
    /// Referenced resources are copied into the shoot namespace in the seed with this prefix
    pub const REFERENCED_RESOURCES_PREFIX: &str = "ref-";
    /// Secret in the shoot namespace holding the shoot access kubeconfig
    pub const SHOOT_ACCESS_SECRET: &str = "gardener";
    pub const SHOOT_ACCESS_KUBECONFIG_KEY: &str = "kubeconfig";
}

/// Defaults applied to the Flux provider configuration
pub mod defaults {
    pub const FLUX_VERSION: &str = "v2.1.2";
    pub const FLUX_REGISTRY: &str = "ghcr.io/fluxcd";
    pub const FLUX_NAMESPACE: &str = "flux-system";
    pub const GIT_REPOSITORY_NAME: &str = "flux-system";
    pub const KUSTOMIZATION_NAME: &str = "flux-system";
    pub const SECRET_REF_NAME: &str = "flux-system";
    pub const INTERVAL: &str = "1m";
}

/// Polling bounds for the bootstrap waits
pub mod wait {
    pub const INSTALL_POLL_INTERVAL_SECS: u64 = 5;
    pub const INSTALL_TIMEOUT_SECS: u64 = 60;
    pub const BOOTSTRAP_POLL_INTERVAL_SECS: u64 = 5;
    pub const BOOTSTRAP_TIMEOUT_SECS: u64 = 300;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
