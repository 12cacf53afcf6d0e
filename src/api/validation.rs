// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Field validation for `FluxConfig`.

use std::fmt;

use crate::api::{FluxConfig, FluxInstallation, Kustomization, Source};
use crate::types::cluster::{resource_by_name, NamedResourceReference};
use crate::types::flux::{
    GitRepositoryRef, GIT_REPOSITORY_KIND, KUSTOMIZATION_KIND, KUSTOMIZE_API_VERSION, SOURCE_API_VERSION,
};

const RESOURCE_NAME_MISMATCH: &str =
    "secret resource name does not match any of the resource names in Shoot.spec.resources[].name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Required,
    Invalid,
    NotSupported,
}

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub kind: ErrorKind,
    pub detail: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Required => "Required value",
            ErrorKind::Invalid => "Invalid value",
            ErrorKind::NotSupported => "Unsupported value",
        };
        write!(f, "{}: {}: {}", self.field, kind, self.detail)
    }
}

/// All validation failures found in a config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl std::error::Error for ValidationErrors {}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", messages.join(", "))
    }
}

impl ValidationErrors {
    fn push(&mut self, field: impl Into<String>, kind: ErrorKind, detail: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            kind,
            detail: detail.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate a defaulted config against the Shoot's resource references
pub fn validate_flux_config(
    config: &FluxConfig,
    resources: &[NamedResourceReference],
) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();

    validate_installation(&config.flux, &mut errs);

    match (&config.source, &config.kustomization) {
        (Some(_), None) => errs.push(
            "kustomization",
            ErrorKind::Required,
            "must specify kustomization if source is specified",
        ),
        (None, Some(_)) => errs.push(
            "source",
            ErrorKind::Required,
            "must specify source if kustomization is specified",
        ),
        _ => {}
    }

    if let Some(source) = &config.source {
        validate_source(source, resources, &mut errs);
    }
    if let Some(kustomization) = &config.kustomization {
        validate_kustomization(kustomization, &mut errs);
    }

    for (i, resource) in config.additional_secret_resources.iter().enumerate() {
        if resource_by_name(resources, &resource.name).is_none() {
            errs.push(
                format!("additionalSecretResources[{}].name", i),
                ErrorKind::Invalid,
                format!("{:?}: {}", resource.name, RESOURCE_NAME_MISMATCH),
            );
        }
    }

    errs.into_result()
}

/// Flux releases this extension can bootstrap: v2 releases with the GA GitRepository and
/// Kustomization APIs, written as release tags (`v2.1.2`)
pub fn check_flux_version(version: &str) -> Result<semver::Version, String> {
    let parsed = version
        .strip_prefix('v')
        .ok_or_else(|| "must be a release tag starting with \"v\"".to_string())
        .and_then(|v| semver::Version::parse(v).map_err(|e| e.to_string()))?;
    if parsed.major != 2 || !parsed.pre.is_empty() {
        return Err("only stable Flux v2 releases (v2.0.0 or later) are supported".to_string());
    }
    Ok(parsed)
}

fn validate_installation(installation: &FluxInstallation, errs: &mut ValidationErrors) {
    let version = installation.version();
    if let Err(e) = check_flux_version(version) {
        errs.push(
            "flux.version",
            ErrorKind::NotSupported,
            format!("{:?}: {}", version, e),
        );
    }
    if installation.registry().trim_end_matches('/').is_empty() {
        errs.push("flux.registry", ErrorKind::Required, "must not be empty");
    }
    let namespace = installation.namespace();
    if !namespace.is_empty() && !is_dns1123_label(namespace) {
        errs.push(
            "flux.namespace",
            ErrorKind::Invalid,
            format!("{:?}: must be a valid DNS-1123 label", namespace),
        );
    }
}

fn validate_source(
    source: &Source,
    resources: &[NamedResourceReference],
    errs: &mut ValidationErrors,
) {
    let template = &source.template;
    check_type_meta(
        "source.template",
        template.api_version.as_deref(),
        template.kind.as_deref(),
        SOURCE_API_VERSION,
        GIT_REPOSITORY_KIND,
        errs,
    );

    if template
        .spec
        .reference
        .as_ref()
        .map_or(true, GitRepositoryRef::is_empty)
    {
        errs.push(
            "source.template.spec.ref",
            ErrorKind::Required,
            "GitRepository must have a reference",
        );
    }

    if template.spec.url.is_empty() {
        errs.push(
            "source.template.spec.url",
            ErrorKind::Required,
            "GitRepository must have an URL",
        );
    } else if let Err(e) = url::Url::parse(&template.spec.url) {
        errs.push(
            "source.template.spec.url",
            ErrorKind::Invalid,
            format!("{:?}: {}", template.spec.url, e),
        );
    }

    match (template.secret_ref_name(), source.secret_resource_name()) {
        (Some(_), None) => errs.push(
            "source.secretResourceName",
            ErrorKind::Required,
            "must specify a secret resource name if source.template.spec.secretRef is specified",
        ),
        (None, Some(_)) => errs.push(
            "source.template.spec.secretRef",
            ErrorKind::Required,
            "must specify a secret ref if source.secretResourceName is specified",
        ),
        _ => {}
    }

    if let Some(name) = source.secret_resource_name() {
        if resource_by_name(resources, name).is_none() {
            errs.push(
                "source.secretResourceName",
                ErrorKind::Invalid,
                format!("{:?}: {}", name, RESOURCE_NAME_MISMATCH),
            );
        }
    }
}

fn validate_kustomization(kustomization: &Kustomization, errs: &mut ValidationErrors) {
    let template = &kustomization.template;
    check_type_meta(
        "kustomization.template",
        template.api_version.as_deref(),
        template.kind.as_deref(),
        KUSTOMIZE_API_VERSION,
        KUSTOMIZATION_KIND,
        errs,
    );

    if template.spec.path.is_empty() {
        errs.push(
            "kustomization.template.spec.path",
            ErrorKind::Required,
            "Kustomization must have a path",
        );
    }
}

fn check_type_meta(
    path: &str,
    api_version: Option<&str>,
    kind: Option<&str>,
    supported_api_version: &str,
    supported_kind: &str,
    errs: &mut ValidationErrors,
) {
    let api_version = api_version.unwrap_or_default();
    let kind = kind.unwrap_or_default();
    if api_version.is_empty() && kind.is_empty() {
        return;
    }
    if api_version != supported_api_version {
        errs.push(
            format!("{}.apiVersion", path),
            ErrorKind::NotSupported,
            format!("{:?}: supported values: {:?}", api_version, supported_api_version),
        );
    }
    if kind != supported_kind {
        errs.push(
            format!("{}.kind", path),
            ErrorKind::NotSupported,
            format!("{:?}: supported values: {:?}", kind, supported_kind),
        );
    }
}

fn is_dns1123_label(value: &str) -> bool {
    let bytes = value.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    value.len() <= 63
        && bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && bytes.iter().all(|b| alnum(b) || *b == b'-')
}
