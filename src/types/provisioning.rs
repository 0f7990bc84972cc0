// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::constants::clusters::LOCAL_CLUSTER_ID;

/// provisioning.cattle.io/v1 cluster objects live on the local cluster,
/// one per managed cluster, in the fleet-default namespace.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "provisioning.cattle.io", version = "v1", kind = "Cluster")]
#[kube(namespaced)]
#[kube(status = "ClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Cluster {
    /// True when the Ready condition is True
    pub fn is_ready(&self) -> bool {
        self.has_condition("Ready")
    }

    /// True when the named status condition is True
    pub fn has_condition(&self, condition_type: &str) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.condition_type == condition_type && c.status == "True")
            })
    }

    /// Check if this is the local/management cluster
    pub fn is_local(&self) -> bool {
        self.spec.local.unwrap_or(false) || self.name_any() == LOCAL_CLUSTER_ID
    }

    /// Kubernetes version currently declared in the spec
    pub fn kubernetes_version(&self) -> Option<&str> {
        self.spec.kubernetes_version.as_deref()
    }

    /// The v3 management cluster id backing this object
    pub fn internal_name(&self) -> String {
        self.status
            .as_ref()
            .map(|s| s.cluster_name.clone())
            .unwrap_or_else(|| self.name_any())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub cluster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
