// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node queries on the management API

use crate::clients::base::ListOpts;
use crate::clients::management::ManagementClient;
use crate::error::Result;

/// Number of worker nodes registered for a cluster
pub async fn worker_node_count(management: &ManagementClient, cluster_id: &str) -> Result<usize> {
    let nodes = management
        .nodes(
            &ListOpts::new()
                .filter("clusterId", cluster_id)
                .filter("worker", "true"),
        )
        .await?;
    Ok(nodes.data.len())
}
