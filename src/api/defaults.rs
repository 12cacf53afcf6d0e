// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Defaulting for `FluxConfig`, applied after every decode.

use crate::api::{FluxConfig, FluxInstallation, Kustomization, Source};
use crate::constants::defaults;
use crate::types::flux::{
    GitRepositoryTemplate, KustomizationTemplate, LocalObjectReference, GIT_REPOSITORY_KIND,
};

pub fn set_defaults(config: &mut FluxConfig) {
    set_defaults_installation(&mut config.flux);

    if let Some(source) = config.source.as_mut() {
        set_defaults_source(source);
    }

    // Installation defaults are known at this point, so the templates follow the Flux namespace
    let namespace = config.flux.namespace().to_string();
    if let Some(source) = config.source.as_mut() {
        fill(&mut source.template.metadata.namespace, &namespace);
    }
    if let Some(kustomization) = config.kustomization.as_mut() {
        fill(&mut kustomization.template.metadata.namespace, &namespace);
    }

    if let Some(kustomization) = config.kustomization.as_mut() {
        let source_ref = &mut kustomization.template.spec.source_ref;
        if let Some(source) = config.source.as_ref() {
            if source_ref.name.is_empty() {
                source_ref.name = source.template.name().to_string();
            }
            fill(&mut source_ref.namespace, source.template.namespace());
        }
        set_defaults_kustomization(kustomization, &namespace);
    }
}

fn set_defaults_installation(installation: &mut FluxInstallation) {
    fill(&mut installation.version, defaults::FLUX_VERSION);
    fill(&mut installation.registry, defaults::FLUX_REGISTRY);
    fill(&mut installation.namespace, defaults::FLUX_NAMESPACE);
}

fn set_defaults_source(source: &mut Source) {
    set_defaults_git_repository(&mut source.template);

    if source.secret_resource_name().is_some() && source.template.secret_ref_name().is_none() {
        source.template.spec.secret_ref = Some(LocalObjectReference {
            name: defaults::SECRET_REF_NAME.to_string(),
        });
    }
}

fn set_defaults_git_repository(template: &mut GitRepositoryTemplate) {
    fill(&mut template.metadata.name, defaults::GIT_REPOSITORY_NAME);
    if template.spec.interval.is_empty() {
        template.spec.interval = defaults::INTERVAL.to_string();
    }
}

fn set_defaults_kustomization(kustomization: &mut Kustomization, flux_namespace: &str) {
    let template: &mut KustomizationTemplate = &mut kustomization.template;
    fill(&mut template.metadata.name, defaults::KUSTOMIZATION_NAME);
    fill(&mut template.metadata.namespace, flux_namespace);

    let source_ref = &mut template.spec.source_ref;
    if source_ref.kind.is_empty() {
        source_ref.kind = GIT_REPOSITORY_KIND.to_string();
    }
    if source_ref.name.is_empty() {
        source_ref.name = defaults::GIT_REPOSITORY_NAME.to_string();
    }
    fill(&mut source_ref.namespace, flux_namespace);

    if template.spec.interval.is_empty() {
        template.spec.interval = defaults::INTERVAL.to_string();
    }
}

/// Set an optional string field unless it already holds a non-empty value
fn fill(field: &mut Option<String>, value: &str) {
    if field.as_deref().unwrap_or_default().is_empty() && !value.is_empty() {
        *field = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: serde_json::Value) -> FluxConfig {
        let mut config: FluxConfig = serde_json::from_value(value).unwrap();
        set_defaults(&mut config);
        config
    }

    #[test]
    fn test_empty_config_gets_installation_defaults() {
        let config = decode(serde_json::json!({}));

        assert_eq!(config.flux.version(), "v2.1.2");
        assert_eq!(config.flux.registry(), "ghcr.io/fluxcd");
        assert_eq!(config.flux.namespace(), "flux-system");
        assert!(config.source.is_none());
        assert!(config.kustomization.is_none());
    }

    #[test]
    fn test_explicit_installation_values_are_kept() {
        let config = decode(serde_json::json!({
            "flux": { "version": "v2.0.0", "registry": "registry.example.com", "namespace": "gotk" }
        }));

        assert_eq!(config.flux.version(), "v2.0.0");
        assert_eq!(config.flux.registry(), "registry.example.com");
        assert_eq!(config.flux.namespace(), "gotk");
    }

    #[test]
    fn test_templates_follow_flux_namespace() {
        let config = decode(serde_json::json!({
            "flux": { "namespace": "gotk" },
            "source": { "template": { "spec": { "url": "https://example.com", "ref": { "branch": "main" } } } },
            "kustomization": { "template": { "spec": { "path": "./" } } }
        }));

        let source = config.source.unwrap();
        assert_eq!(source.template.name(), "flux-system");
        assert_eq!(source.template.namespace(), "gotk");
        assert_eq!(source.template.spec.interval, "1m");

        let kustomization = config.kustomization.unwrap();
        assert_eq!(kustomization.template.name(), "flux-system");
        assert_eq!(kustomization.template.namespace(), "gotk");
        assert_eq!(kustomization.template.spec.interval, "1m");
        let source_ref = kustomization.template.spec.source_ref;
        assert_eq!(source_ref.kind, "GitRepository");
        assert_eq!(source_ref.name, "flux-system");
        assert_eq!(source_ref.namespace.as_deref(), Some("gotk"));
    }

    #[test]
    fn test_source_ref_follows_source_template() {
        let config = decode(serde_json::json!({
            "source": { "template": { "metadata": { "name": "main", "namespace": "gitops" } } },
            "kustomization": { "template": { "metadata": { "name": "apps" } } }
        }));

        let kustomization = config.kustomization.unwrap();
        assert_eq!(kustomization.template.namespace(), "flux-system");
        let source_ref = kustomization.template.spec.source_ref;
        assert_eq!(source_ref.name, "main");
        assert_eq!(source_ref.namespace.as_deref(), Some("gitops"));
    }

    #[test]
    fn test_secret_ref_defaulted_from_secret_resource_name() {
        let config = decode(serde_json::json!({
            "source": { "template": {}, "secretResourceName": "git-credentials" },
            "kustomization": { "template": {} }
        }));

        let source = config.source.unwrap();
        assert_eq!(source.template.secret_ref_name(), Some("flux-system"));
    }

    #[test]
    fn test_existing_secret_ref_is_kept() {
        let config = decode(serde_json::json!({
            "source": {
                "template": { "spec": { "secretRef": { "name": "ssh-target-name" } } },
                "secretResourceName": "git-credentials"
            },
            "kustomization": { "template": {} }
        }));

        let source = config.source.unwrap();
        assert_eq!(source.template.secret_ref_name(), Some("ssh-target-name"));
    }

    #[test]
    fn test_defaulting_is_idempotent() {
        let once = decode(serde_json::json!({
            "source": { "template": {} },
            "kustomization": { "template": {} }
        }));
        let mut twice = once.clone();
        set_defaults(&mut twice);
        assert_eq!(once, twice);
    }
}
