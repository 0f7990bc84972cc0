// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Project lookup and creation on the management API

use tracing::{info, instrument};

use crate::clients::base::ListOpts;
use crate::clients::management::{ManagementClient, Project};
use crate::error::Result;

/// Finds a project by name within a cluster
pub async fn get_project_by_name(
    management: &ManagementClient,
    cluster_id: &str,
    name: &str,
) -> Result<Option<Project>> {
    let projects = management
        .projects(&ListOpts::new().filter("clusterId", cluster_id))
        .await?;
    Ok(projects.data.into_iter().find(|p| p.name == name))
}

/// Returns the named project, creating it when it does not exist yet
#[instrument(skip(management))]
pub async fn ensure_project(
    management: &ManagementClient,
    cluster_id: &str,
    name: &str,
) -> Result<Project> {
    if let Some(existing) = get_project_by_name(management, cluster_id, name).await? {
        return Ok(existing);
    }

    info!("Creating project {} in cluster {}", name, cluster_id);
    let body = Project {
        name: name.to_string(),
        cluster_id: cluster_id.to_string(),
        ..Default::default()
    };
    management.create_project(&body).await
}
