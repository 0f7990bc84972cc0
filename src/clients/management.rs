// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Management (v3) API client.
//!
//! The v3 API predates Steve and serves flat resources with provider
//! config blocks inlined on the cluster object. Only the fields the
//! suites touch are modeled; everything else flows through the
//! `extra` maps so updates do not silently drop server-side state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::clients::base::{BaseClient, ListOpts, Pagination};
use crate::error::Result;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ManagementCollection<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Kubernetes version block reported on a v3 cluster
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterVersion {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_version: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RkeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Rke2Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct K3sConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GkeNodePool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GkeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_pools: Option<Vec<GkeNodePool>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AksNodePool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AksConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_pools: Option<Vec<AksNodePool>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EksNodeGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EksConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_groups: Option<Vec<EksNodeGroup>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A v3 cluster. At most one provider config block is set; which one
/// tells the caller how the cluster is provisioned.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub driver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ClusterVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rancher_kubernetes_engine_config: Option<RkeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rke2_config: Option<Rke2Config>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k3s_config: Option<K3sConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gke_config: Option<GkeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aks_config: Option<AksConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eks_config: Option<EksConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Cluster {
    /// Kubernetes version the cluster currently runs
    pub fn git_version(&self) -> Option<&str> {
        self.version
            .as_ref()
            .map(|v| v.git_version.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default)]
    pub worker: bool,
    #[serde(default)]
    pub control_plane: bool,
    #[serde(default)]
    pub etcd: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Client for the management (v3) API
#[derive(Clone)]
pub struct ManagementClient {
    base: BaseClient,
}

impl ManagementClient {
    pub fn new(client: kube::Client) -> Self {
        ManagementClient {
            base: BaseClient::new(client, "/v3"),
        }
    }

    pub async fn clusters(&self, opts: &ListOpts) -> Result<ManagementCollection<Cluster>> {
        self.base.do_list("clusters", opts).await
    }

    pub async fn cluster_by_id(&self, id: &str) -> Result<Cluster> {
        self.base.do_by_id("clusters", id).await
    }

    /// PUT a sparse updates object to the cluster's self link. Only the
    /// fields set on `updates` reach the wire.
    #[instrument(skip(self, existing, updates), fields(cluster = %existing.id))]
    pub async fn update_cluster<B: Serialize>(
        &self,
        existing: &Cluster,
        updates: &B,
    ) -> Result<Cluster> {
        self.base
            .do_update(&existing.id, &existing.links, updates)
            .await
    }

    pub async fn projects(&self, opts: &ListOpts) -> Result<ManagementCollection<Project>> {
        self.base.do_list("projects", opts).await
    }

    pub async fn create_project<B: Serialize>(&self, body: &B) -> Result<Project> {
        self.base.do_create("projects", body).await
    }

    pub async fn nodes(&self, opts: &ListOpts) -> Result<ManagementCollection<Node>> {
        self.base.do_list("nodes", opts).await
    }

    /// Generic listing for v3 types the crate does not model
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource_type: &str,
        opts: &ListOpts,
    ) -> Result<ManagementCollection<T>> {
        self.base.do_list(resource_type, opts).await
    }
}
