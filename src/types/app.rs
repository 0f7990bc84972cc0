// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::constants::apps::{STATE_DEPLOYED, STATE_PENDING_UPGRADE};

/// catalog.cattle.io/v1 app objects track installed Helm releases on a
/// cluster. Chart waits subscribe to these and watch the summary state.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "catalog.cattle.io", version = "v1", kind = "App")]
#[kube(namespaced)]
#[kube(status = "AppStatus")]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<AppChart>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppChart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AppChartMetadata>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppChartMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AppSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitioning: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl App {
    /// Deployment state reported by the release summary
    pub fn state(&self) -> Option<&str> {
        self.status.as_ref()?.summary.as_ref()?.state.as_deref()
    }

    pub fn is_deployed(&self) -> bool {
        self.state() == Some(STATE_DEPLOYED)
    }

    pub fn is_pending_upgrade(&self) -> bool {
        self.state() == Some(STATE_PENDING_UPGRADE)
    }
}
