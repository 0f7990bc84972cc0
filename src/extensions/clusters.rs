// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster lookup, provider detection and readiness waiting.
//!
//! Provisioned clusters expose their provider through the config block
//! set on the v3 object; imported ones carry no config block and are
//! recognized by driver or by the distribution suffix in the reported
//! Kubernetes version.

use kube::api::{Api, WatchEvent};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::clients::base::ListOpts;
use crate::clients::management::{self, ManagementClient};
use crate::clients::rancher::RancherClient;
use crate::constants::clusters::{FLEET_DEFAULT_NAMESPACE, LOCAL_CLUSTER_ID};
use crate::constants::{poll, watch};
use crate::error::{Result, RodeoError};
use crate::types::provisioning;
use crate::wait::{subscribe_named, watch_wait_within};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KubernetesProvider {
    Rke,
    Rke2,
    K3s,
    Gke,
    Aks,
    Eks,
}

impl KubernetesProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            KubernetesProvider::Rke => "rke",
            KubernetesProvider::Rke2 => "rke2",
            KubernetesProvider::K3s => "k3s",
            KubernetesProvider::Gke => "gke",
            KubernetesProvider::Aks => "aks",
            KubernetesProvider::Eks => "eks",
        }
    }
}

impl fmt::Display for KubernetesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a cluster under test
#[derive(Debug, Clone)]
pub struct ClusterMeta {
    pub id: String,
    pub name: String,
    pub provider: KubernetesProvider,
    pub is_imported: bool,
}

/// Determines the Kubernetes provider of a v3 cluster and whether the
/// cluster was imported rather than provisioned
pub fn detect_provider(cluster: &management::Cluster) -> Result<(KubernetesProvider, bool)> {
    if cluster.rancher_kubernetes_engine_config.is_some() {
        return Ok((KubernetesProvider::Rke, false));
    }
    if cluster.rke2_config.is_some() {
        return Ok((KubernetesProvider::Rke2, false));
    }
    if cluster.k3s_config.is_some() {
        return Ok((KubernetesProvider::K3s, false));
    }
    if cluster.gke_config.is_some() {
        return Ok((KubernetesProvider::Gke, false));
    }
    if cluster.aks_config.is_some() {
        return Ok((KubernetesProvider::Aks, false));
    }
    if cluster.eks_config.is_some() {
        return Ok((KubernetesProvider::Eks, false));
    }

    // No config block: imported clusters report their distribution in
    // the driver or in the git version suffix
    let git_version = cluster.git_version().unwrap_or("");
    if cluster.driver == "rke2" || git_version.contains("+rke2") {
        return Ok((KubernetesProvider::Rke2, true));
    }
    if cluster.driver == "k3s" || git_version.contains("+k3s") {
        return Ok((KubernetesProvider::K3s, true));
    }

    Err(RodeoError::UnknownProvider(cluster.name.clone()))
}

/// Resolves a cluster name to its v3 id
pub async fn get_cluster_id_by_name(management: &ManagementClient, name: &str) -> Result<String> {
    let clusters = management
        .clusters(&ListOpts::new().filter("name", name))
        .await?;
    clusters
        .data
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .ok_or_else(|| RodeoError::ClusterNotFound(name.to_string()))
}

/// Resolves a v3 cluster id to its name
pub async fn get_cluster_name_by_id(management: &ManagementClient, id: &str) -> Result<String> {
    let cluster = management.cluster_by_id(id).await?;
    Ok(cluster.name)
}

/// Looks a cluster up by name and captures its identity
#[instrument(skip(management))]
pub async fn new_cluster_meta(management: &ManagementClient, name: &str) -> Result<ClusterMeta> {
    let id = get_cluster_id_by_name(management, name).await?;
    let cluster = management.cluster_by_id(&id).await?;
    let (provider, is_imported) = detect_provider(&cluster)?;
    info!(
        "Cluster {} is {} ({}imported)",
        name,
        provider,
        if is_imported { "" } else { "not " }
    );
    Ok(ClusterMeta {
        id,
        name: name.to_string(),
        provider,
        is_imported,
    })
}

/// Typed API for provisioning clusters in the fleet namespace
pub async fn provisioning_clusters(client: &RancherClient) -> Result<Api<provisioning::Cluster>> {
    let local = client.downstream(LOCAL_CLUSTER_ID).await?;
    Ok(Api::namespaced(local, FLEET_DEFAULT_NAMESPACE))
}

/// Waits until a provisioning cluster reports the Ready condition
#[instrument(skip(client))]
pub async fn wait_until_cluster_ready(
    client: &RancherClient,
    cluster_name: &str,
    deadline: Duration,
) -> Result<()> {
    let api = provisioning_clusters(client).await?;
    watch_wait_within(
        deadline,
        || subscribe_named(api.clone(), cluster_name, watch::DEFAULT_TIMEOUT_SECS),
        |event| match event {
            WatchEvent::Added(cluster) | WatchEvent::Modified(cluster) => Ok(cluster.is_ready()),
            _ => Ok(false),
        },
    )
    .await
}

/// Waits until a provisioning cluster is ready at the given Kubernetes
/// version
#[instrument(skip(client))]
pub async fn wait_until_cluster_version(
    client: &RancherClient,
    cluster_name: &str,
    version: &str,
    deadline: Duration,
) -> Result<()> {
    let api = provisioning_clusters(client).await?;
    watch_wait_within(
        deadline,
        || subscribe_named(api.clone(), cluster_name, watch::DEFAULT_TIMEOUT_SECS),
        |event| match event {
            WatchEvent::Added(cluster) | WatchEvent::Modified(cluster) => Ok(cluster.is_ready()
                && cluster
                    .kubernetes_version()
                    .is_some_and(|v| versions_match(v, version))),
            _ => Ok(false),
        },
    )
    .await
}

/// Polls a v3 cluster until it is active at the given version.
/// This uses exponential backoff starting at `poll::INTERVAL_SECS` seconds.
#[instrument(skip(management))]
pub async fn wait_until_active_version(
    management: &ManagementClient,
    cluster_id: &str,
    version: &str,
    deadline: Duration,
) -> Result<()> {
    let started = Instant::now();
    let mut interval = poll::INTERVAL_SECS;

    loop {
        match management.cluster_by_id(cluster_id).await {
            Ok(cluster) => {
                let current = cluster.git_version().unwrap_or("");
                if cluster.is_active() && versions_match(current, version) {
                    info!("Cluster {} is active at version {}", cluster_id, current);
                    return Ok(());
                }
                info!(
                    "Cluster {} is '{}' at version '{}', waiting {} seconds...",
                    cluster_id, cluster.state, current, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error fetching cluster {}: {}, retrying in {} seconds...",
                    cluster_id, e, interval
                );
            }
        }

        if started.elapsed() >= deadline {
            return Err(RodeoError::WatchTimeout);
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(poll::MAX_INTERVAL_SECS);
    }
}

/// Version equality, tolerant of a leading `v` and of distribution
/// suffixes on the reported version
fn versions_match(current: &str, target: &str) -> bool {
    let current = current.trim_start_matches('v');
    let target = target.trim_start_matches('v');
    current == target || current.starts_with(target)
}
