// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::bootstrap::manifest::DEFAULT_RELEASE_BASE_URL;
use crate::constants::{self, wait};

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Only Extension resources of this type are reconciled
    pub extension_type: String,
    pub max_concurrent_reconciles: u16,
    pub resync_interval: Duration,
    pub error_requeue: Duration,
    pub timeouts: Timeouts,
    /// Directory of Flux releases the install manifests are downloaded from
    pub flux_release_base_url: Url,
    pub testing_mode: bool,
}

/// Polling bounds for the waits performed while bootstrapping Flux
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub install_poll_interval: Duration,
    pub install_timeout: Duration,
    pub bootstrap_poll_interval: Duration,
    pub bootstrap_timeout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            install_poll_interval: Duration::from_secs(wait::INSTALL_POLL_INTERVAL_SECS),
            install_timeout: Duration::from_secs(wait::INSTALL_TIMEOUT_SECS),
            bootstrap_poll_interval: Duration::from_secs(wait::BOOTSTRAP_POLL_INTERVAL_SECS),
            bootstrap_timeout: Duration::from_secs(wait::BOOTSTRAP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Timeouts::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            parse_or(&lookup, key, default.as_secs()).map(Duration::from_secs)
        };

        let timeouts = Timeouts {
            install_poll_interval: secs("INSTALL_POLL_INTERVAL_SECS", defaults.install_poll_interval)?,
            install_timeout: secs("INSTALL_TIMEOUT_SECS", defaults.install_timeout)?,
            bootstrap_poll_interval: secs(
                "BOOTSTRAP_POLL_INTERVAL_SECS",
                defaults.bootstrap_poll_interval,
            )?,
            bootstrap_timeout: secs("BOOTSTRAP_TIMEOUT_SECS", defaults.bootstrap_timeout)?,
        };

        // For testing, uses the KUBECONFIG env var to create shoot clients instead of reading the shoot access secret
        let testing_mode = parse_or(&lookup, "TESTING_MODE", false)?;

        let base_url = lookup("FLUX_RELEASE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_RELEASE_BASE_URL.to_string());
        let flux_release_base_url = Url::parse(base_url.trim())
            .with_context(|| format!("FLUX_RELEASE_BASE_URL has an invalid value: {:?}", base_url))?;

        Ok(Config {
            extension_type: lookup("EXTENSION_TYPE")
                .unwrap_or_else(|| constants::EXTENSION_TYPE.to_string()),
            max_concurrent_reconciles: parse_or(&lookup, "MAX_CONCURRENT_RECONCILES", 5)?,
            resync_interval: secs("RESYNC_INTERVAL_SECS", Duration::from_secs(3600))?,
            error_requeue: secs("ERROR_REQUEUE_SECS", Duration::from_secs(60))?,
            timeouts,
            flux_release_base_url,
            testing_mode,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, value)),
        None => Ok(default),
    }
}
