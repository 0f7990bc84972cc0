// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Catalog (helm) API client.
//!
//! Chart lifecycle goes through action endpoints on the catalog types:
//! install and upgrade are actions on the `rancher-charts` cluster repo,
//! uninstall is an action on the app itself. Release state is observed
//! through the `catalog.cattle.io` App resource.

use kube::Api;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::clients::base::BaseClient;
use crate::clients::steve::SteveApiObject;
use crate::constants::steve::{CATALOG_APPS, CLUSTER_REPOS};
use crate::error::{Result, RodeoError};
use crate::types::app::App;

pub type ChartValues = serde_json::Map<String, Value>;

/// One chart within an install action
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartInstall {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub chart_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub release_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "ChartValues::is_empty")]
    pub values: ChartValues,
}

/// Body for the `install` action on a cluster repo
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartInstallAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    pub wait: bool,
    #[serde(rename = "noHooks")]
    pub disable_hooks: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub charts: Vec<ChartInstall>,
}

/// One chart within an upgrade action
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartUpgrade {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub chart_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub release_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub force: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "ChartValues::is_empty")]
    pub values: ChartValues,
}

/// Body for the `upgrade` action on a cluster repo
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartUpgradeAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    pub wait: bool,
    #[serde(rename = "noHooks")]
    pub disable_hooks: bool,
    pub cleanup_on_fail: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub charts: Vec<ChartUpgrade>,
}

/// Body for the `uninstall` action on an app
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartUninstallAction {
    #[serde(rename = "noHooks")]
    pub disable_hooks: bool,
    pub dry_run: bool,
    pub keep_history: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ChartIndexEntry {
    #[serde(default)]
    pub version: String,
}

/// Helm repository index as served via the repo's `index` link
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ChartIndex {
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartIndexEntry>>,
}

impl ChartIndex {
    /// Latest version of a chart. Index entries are ordered newest first.
    pub fn latest_version(&self, chart_name: &str) -> Option<&str> {
        self.entries
            .get(chart_name)
            .and_then(|versions| versions.first())
            .map(|entry| entry.version.as_str())
    }
}

/// Client for the catalog surface of one cluster
#[derive(Clone)]
pub struct CatalogClient {
    base: BaseClient,
    cluster: kube::Client,
}

impl CatalogClient {
    /// `transport` carries the full catalog prefix (`/v1` for the local
    /// cluster, `/k8s/clusters/{id}/v1` for a downstream one); `cluster`
    /// is the matching cluster-scoped client for typed watches.
    pub fn new(transport: kube::Client, prefix: impl Into<String>, cluster: kube::Client) -> Self {
        CatalogClient {
            base: BaseClient::new(transport, prefix),
            cluster,
        }
    }

    /// Typed API for App resources in a namespace, for get and watch
    pub fn apps(&self, namespace: &str) -> Api<App> {
        Api::namespaced(self.cluster.clone(), namespace)
    }

    #[instrument(skip(self, action))]
    pub async fn install_chart(&self, repo_name: &str, action: &ChartInstallAction) -> Result<()> {
        self.base
            .do_action(CLUSTER_REPOS, repo_name, "install", action)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, action))]
    pub async fn upgrade_chart(&self, repo_name: &str, action: &ChartUpgradeAction) -> Result<()> {
        self.base
            .do_action(CLUSTER_REPOS, repo_name, "upgrade", action)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, action))]
    pub async fn uninstall_chart(
        &self,
        name: &str,
        namespace: &str,
        action: &ChartUninstallAction,
    ) -> Result<()> {
        let id = format!("{}/{}", namespace, name);
        self.base
            .do_action(CATALOG_APPS, &id, "uninstall", action)
            .await?;
        Ok(())
    }

    /// Fetches the app backing an installed release
    pub async fn app(&self, namespace: &str, name: &str) -> Result<SteveApiObject> {
        let id = format!("{}/{}", namespace, name);
        self.base.do_by_id(CATALOG_APPS, &id).await
    }

    /// Latest published version of a chart in a cluster repo
    pub async fn latest_chart_version(&self, repo_name: &str, chart_name: &str) -> Result<String> {
        let index: ChartIndex = self.base.do_link_yaml(CLUSTER_REPOS, repo_name, "index").await?;
        index
            .latest_version(chart_name)
            .map(String::from)
            .ok_or_else(|| RodeoError::ChartNotFound(chart_name.to_string()))
    }
}
