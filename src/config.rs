// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Optional validation paths that only run when enabled for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentFlag {
    Ingress,
    Chart,
}

impl FromStr for EnvironmentFlag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingress" => Ok(EnvironmentFlag::Ingress),
            "chart" => Ok(EnvironmentFlag::Chart),
            other => Err(anyhow!("Unknown environment flag: {}", other)),
        }
    }
}

impl fmt::Display for EnvironmentFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentFlag::Ingress => write!(f, "ingress"),
            EnvironmentFlag::Chart => write!(f, "chart"),
        }
    }
}

/// Set of enabled environment flags, parsed from a comma-separated list
#[derive(Debug, Clone, Default)]
pub struct EnvironmentFlags {
    enabled: HashSet<EnvironmentFlag>,
}

impl EnvironmentFlags {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut enabled = HashSet::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            enabled.insert(part.parse::<EnvironmentFlag>()?);
        }
        Ok(EnvironmentFlags { enabled })
    }

    pub fn is_enabled(&self, flag: EnvironmentFlag) -> bool {
        self.enabled.contains(&flag)
    }
}

/// Test environment configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RancherConfig {
    /// Rancher server hostname (no scheme)
    pub host: String,
    /// Admin bearer token used for all API calls
    pub admin_token: String,
    /// Name of the downstream cluster under test
    pub cluster_name: Option<String>,
    /// Skip TLS verification when talking to Rancher
    pub insecure: bool,
    /// Tear down created resources when a session is cleaned up
    pub cleanup: bool,
    /// Target Kubernetes version for upgrade suites
    pub upgrade_version: Option<String>,
    pub flags: EnvironmentFlags,
}

impl RancherConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host =
            env::var("RANCHER_HOST").context("RANCHER_HOST environment variable not set")?;
        let admin_token = env::var("RANCHER_ADMIN_TOKEN")
            .context("RANCHER_ADMIN_TOKEN environment variable not set")?;
        let cluster_name = env::var("RANCHER_CLUSTER_NAME").ok().filter(|v| !v.is_empty());
        let insecure: bool = env::var("RANCHER_INSECURE")
            .unwrap_or("false".to_string())
            .parse()
            .unwrap_or(false);
        let cleanup: bool = env::var("RANCHER_CLEANUP")
            .unwrap_or("true".to_string())
            .parse()
            .unwrap_or(true);
        let upgrade_version = env::var("RANCHER_UPGRADE_VERSION").ok().filter(|v| !v.is_empty());
        let flags = EnvironmentFlags::parse(&env::var("RANCHER_TEST_FLAGS").unwrap_or_default())
            .context("RANCHER_TEST_FLAGS could not be parsed")?;

        Ok(RancherConfig {
            host,
            admin_token,
            cluster_name,
            insecure,
            cleanup,
            upgrade_version,
            flags,
        })
    }

    /// Base URL of the Rancher server
    pub fn server_url(&self) -> String {
        format!("https://{}", self.host)
    }
}
