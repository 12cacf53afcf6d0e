// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decoding of provider configuration into a defaulted `FluxConfig`.

use tracing::debug;

use crate::api::validation::validate_flux_config;
use crate::api::{defaults, FluxConfig, API_VERSION, KIND};
use crate::error::{FluxError, Result};
use crate::types::cluster::NamedResourceReference;

/// Knows the provider config types this operator accepts and how to default them.
/// Built once at start-up and shared by all reconciliations.
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    api_version: &'static str,
    kind: &'static str,
    defaulter: fn(&mut FluxConfig),
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION,
            kind: KIND,
            defaulter: defaults::set_defaults,
        }
    }

    /// Decode the given provider config and apply defaults.
    /// A missing config yields a defaulted empty FluxConfig, so callers can rely on every defaultable field being set.
    pub fn decode(&self, raw: Option<&serde_json::Value>) -> Result<FluxConfig> {
        let mut config = match raw {
            None | Some(serde_json::Value::Null) => {
                debug!("No providerConfig given, defaulting an empty FluxConfig");
                FluxConfig::default()
            }
            Some(value) => {
                self.check_type_meta(value)?;
                serde_json::from_value(value.clone())
                    .map_err(|e| FluxError::DecodeError(e.to_string()))?
            }
        };

        (self.defaulter)(&mut config);
        Ok(config)
    }

    /// Validate a decoded config against the Shoot's resource references
    pub fn validate(
        &self,
        config: &FluxConfig,
        resources: &[NamedResourceReference],
    ) -> Result<()> {
        validate_flux_config(config, resources).map_err(FluxError::from)
    }

    fn check_type_meta(&self, value: &serde_json::Value) -> Result<()> {
        let Some(object) = value.as_object() else {
            return Err(FluxError::DecodeError(
                "providerConfig must be an object".to_string(),
            ));
        };

        let api_version = object.get("apiVersion").and_then(|v| v.as_str());
        let kind = object.get("kind").and_then(|v| v.as_str());
        match (api_version, kind) {
            (None, None) => Ok(()),
            (Some(v), Some(k)) if v == self.api_version && k == self.kind => Ok(()),
            (v, k) => Err(FluxError::DecodeError(format!(
                "no kind {:?} is registered for version {:?}, expected {} {}",
                k.unwrap_or_default(),
                v.unwrap_or_default(),
                self.api_version,
                self.kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_missing_config_is_defaulted() {
        let registry = ConfigRegistry::new();

        let config = registry.decode(None).unwrap();
        assert_eq!(config.flux.version(), "v2.1.2");
        assert_eq!(config.flux.namespace(), "flux-system");

        let config = registry.decode(Some(&serde_json::Value::Null)).unwrap();
        assert_eq!(config.flux.registry(), "ghcr.io/fluxcd");
    }

    #[test]
    fn test_decode_with_type_meta() {
        let registry = ConfigRegistry::new();
        let raw = serde_json::json!({
            "apiVersion": "flux.extensions.gardener.cloud/v1alpha1",
            "kind": "FluxConfig",
            "flux": { "version": "v2.0.0" }
        });

        let config = registry.decode(Some(&raw)).unwrap();
        assert_eq!(config.flux.version(), "v2.0.0");
        assert_eq!(config.flux.registry(), "ghcr.io/fluxcd");
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let registry = ConfigRegistry::new();
        let raw = serde_json::json!({
            "apiVersion": "flux.extensions.gardener.cloud/v1alpha1",
            "kind": "SomethingElse"
        });

        let err = registry.decode(Some(&raw)).unwrap_err();
        assert!(matches!(err, FluxError::DecodeError(_)));
        assert!(err.to_string().starts_with("error decoding providerConfig"));
    }

    #[test]
    fn test_decode_rejects_malformed_config() {
        let registry = ConfigRegistry::new();
        let raw = serde_json::json!({ "flux": { "version": 2 } });
        assert!(registry.decode(Some(&raw)).is_err());

        let raw = serde_json::json!("flux");
        assert!(registry.decode(Some(&raw)).is_err());
    }

    #[test]
    fn test_validate_wraps_field_errors() {
        let registry = ConfigRegistry::new();
        let config = registry
            .decode(Some(&serde_json::json!({ "source": { "template": {} } })))
            .unwrap();

        let err = registry.validate(&config, &[]).unwrap_err();
        assert!(matches!(err, FluxError::InvalidConfig(_)));
        assert!(err.to_string().starts_with("invalid providerConfig: ["));
    }
}
