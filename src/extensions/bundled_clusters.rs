// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Version-scoped cluster handling.
//!
//! A cluster is editable either through the provisioning (v1) API or
//! the management (v3) API. Imported RKE2 and K3s clusters only accept
//! version changes through v1; every other combination goes through the
//! provider config block on the v3 object. [`BundledCluster`] carries
//! whichever representation applies so upgrades can stay
//! provider-agnostic.

use serde_json::json;
use tracing::{info, instrument};

use crate::clients::management;
use crate::clients::rancher::RancherClient;
use crate::clients::steve::SteveApiObject;
use crate::constants::clusters::{FLEET_DEFAULT_NAMESPACE, LOCAL_CLUSTER_ID};
use crate::constants::steve::PROVISIONING_CLUSTERS;
use crate::error::{Result, RodeoError};
use crate::extensions::clusters::{ClusterMeta, KubernetesProvider};

/// A cluster together with the API representation it is edited through
#[derive(Debug, Clone)]
pub struct BundledCluster {
    pub meta: ClusterMeta,
    pub v1: Option<SteveApiObject>,
    pub v3: Option<management::Cluster>,
}

/// An update payload for whichever representation a cluster uses
#[derive(Debug, Clone)]
pub enum BundledClusterUpdate {
    V1(SteveApiObject),
    V3(management::Cluster),
}

/// Whether a cluster is edited through the provisioning (v1) API
pub fn uses_v1(meta: &ClusterMeta) -> bool {
    meta.is_imported
        && matches!(
            meta.provider,
            KubernetesProvider::Rke2 | KubernetesProvider::K3s
        )
}

impl BundledCluster {
    /// Fetches the representation matching the cluster's provider
    #[instrument(skip(client), fields(cluster = %meta.name))]
    pub async fn get(client: &RancherClient, meta: ClusterMeta) -> Result<BundledCluster> {
        let mut cluster = BundledCluster {
            meta,
            v1: None,
            v3: None,
        };
        if uses_v1(&cluster.meta) {
            let steve = client
                .downstream_steve(LOCAL_CLUSTER_ID)
                .steve_type(PROVISIONING_CLUSTERS);
            let id = format!("{}/{}", FLEET_DEFAULT_NAMESPACE, cluster.meta.name);
            cluster.v1 = Some(steve.by_id(&id).await?);
        } else {
            cluster.v3 = Some(client.management().cluster_by_id(&cluster.meta.id).await?);
        }
        Ok(cluster)
    }

    /// Re-fetches the loaded representation
    pub async fn refresh(&self, client: &RancherClient) -> Result<BundledCluster> {
        Self::get(client, self.meta.clone()).await
    }

    /// Applies an update through the matching API and returns the
    /// cluster as the server now sees it
    pub async fn update(
        &self,
        client: &RancherClient,
        updates: &BundledClusterUpdate,
    ) -> Result<BundledCluster> {
        let mut updated = BundledCluster {
            meta: self.meta.clone(),
            v1: None,
            v3: None,
        };
        match updates {
            BundledClusterUpdate::V1(v1_updates) => {
                let existing = self.v1.as_ref().ok_or_else(|| self.missing("v1"))?;
                let steve = client
                    .downstream_steve(LOCAL_CLUSTER_ID)
                    .steve_type(PROVISIONING_CLUSTERS);
                updated.v1 = Some(steve.update(existing, v1_updates).await?);
            }
            BundledClusterUpdate::V3(v3_updates) => {
                let existing = self.v3.as_ref().ok_or_else(|| self.missing("v3"))?;
                updated.v3 = Some(client.management().update_cluster(existing, v3_updates).await?);
            }
        }
        Ok(updated)
    }

    /// Builds the update that moves the cluster to a Kubernetes version
    pub fn version_update_payload(&self, version: &str) -> Result<BundledClusterUpdate> {
        match self.meta.provider {
            KubernetesProvider::Rke => {
                let mut config = self
                    .v3_config(|c| c.rancher_kubernetes_engine_config.clone())
                    .ok_or_else(|| self.missing("rancherKubernetesEngineConfig"))?;
                config.kubernetes_version = Some(version.to_string());
                Ok(BundledClusterUpdate::V3(management::Cluster {
                    name: self.meta.name.clone(),
                    rancher_kubernetes_engine_config: Some(config),
                    ..Default::default()
                }))
            }
            KubernetesProvider::Rke2 | KubernetesProvider::K3s if self.meta.is_imported => {
                let mut cluster = self.v1.clone().ok_or_else(|| self.missing("v1"))?;
                cluster.spec["kubernetesVersion"] = json!(version);
                Ok(BundledClusterUpdate::V1(cluster))
            }
            KubernetesProvider::Rke2 => {
                let mut config = self
                    .v3_config(|c| c.rke2_config.clone())
                    .ok_or_else(|| self.missing("rke2Config"))?;
                config.kubernetes_version = Some(version.to_string());
                Ok(BundledClusterUpdate::V3(management::Cluster {
                    name: self.meta.name.clone(),
                    rke2_config: Some(config),
                    ..Default::default()
                }))
            }
            KubernetesProvider::K3s => {
                let mut config = self
                    .v3_config(|c| c.k3s_config.clone())
                    .ok_or_else(|| self.missing("k3sConfig"))?;
                config.kubernetes_version = Some(version.to_string());
                Ok(BundledClusterUpdate::V3(management::Cluster {
                    name: self.meta.name.clone(),
                    k3s_config: Some(config),
                    ..Default::default()
                }))
            }
            KubernetesProvider::Gke => {
                let mut config = self
                    .v3_config(|c| c.gke_config.clone())
                    .ok_or_else(|| self.missing("gkeConfig"))?;
                config.kubernetes_version = Some(version.to_string());
                Ok(BundledClusterUpdate::V3(management::Cluster {
                    name: self.meta.name.clone(),
                    gke_config: Some(config),
                    ..Default::default()
                }))
            }
            KubernetesProvider::Aks => {
                let mut config = self
                    .v3_config(|c| c.aks_config.clone())
                    .ok_or_else(|| self.missing("aksConfig"))?;
                config.kubernetes_version = Some(version.to_string());
                Ok(BundledClusterUpdate::V3(management::Cluster {
                    name: self.meta.name.clone(),
                    aks_config: Some(config),
                    ..Default::default()
                }))
            }
            KubernetesProvider::Eks => {
                let mut config = self
                    .v3_config(|c| c.eks_config.clone())
                    .ok_or_else(|| self.missing("eksConfig"))?;
                config.kubernetes_version = Some(version.to_string());
                Ok(BundledClusterUpdate::V3(management::Cluster {
                    name: self.meta.name.clone(),
                    eks_config: Some(config),
                    ..Default::default()
                }))
            }
        }
    }

    /// Updates the cluster to a Kubernetes version through the matching
    /// API
    #[instrument(skip(self, client), fields(cluster = %self.meta.name))]
    pub async fn update_kubernetes_version(
        &self,
        client: &RancherClient,
        version: &str,
    ) -> Result<BundledCluster> {
        info!(
            "Upgrading cluster {} ({}) to {}",
            self.meta.name, self.meta.provider, version
        );
        let payload = self.version_update_payload(version)?;
        self.update(client, &payload).await
    }

    /// Builds the update that moves every node pool of a hosted cluster
    /// to a Kubernetes version
    pub fn nodepool_version_update_payload(&self, version: &str) -> Result<BundledClusterUpdate> {
        let mut cluster = self.v3.clone().ok_or_else(|| self.missing("v3"))?;
        match self.meta.provider {
            KubernetesProvider::Gke => {
                let config = cluster
                    .gke_config
                    .as_mut()
                    .ok_or_else(|| self.missing("gkeConfig"))?;
                for pool in config.node_pools.iter_mut().flatten() {
                    pool.version = Some(version.to_string());
                }
            }
            KubernetesProvider::Aks => {
                let config = cluster
                    .aks_config
                    .as_mut()
                    .ok_or_else(|| self.missing("aksConfig"))?;
                for pool in config.node_pools.iter_mut().flatten() {
                    pool.orchestrator_version = Some(version.to_string());
                }
            }
            KubernetesProvider::Eks => {
                let config = cluster
                    .eks_config
                    .as_mut()
                    .ok_or_else(|| self.missing("eksConfig"))?;
                for group in config.node_groups.iter_mut().flatten() {
                    group.version = Some(version.to_string());
                }
            }
            other => {
                return Err(RodeoError::UnsupportedProvider(other.as_str().to_string()));
            }
        }
        Ok(BundledClusterUpdate::V3(cluster))
    }

    /// Updates every node pool of a hosted cluster to a Kubernetes
    /// version
    #[instrument(skip(self, client), fields(cluster = %self.meta.name))]
    pub async fn update_nodepool_kubernetes_versions(
        &self,
        client: &RancherClient,
        version: &str,
    ) -> Result<BundledCluster> {
        info!(
            "Upgrading node pools of cluster {} ({}) to {}",
            self.meta.name, self.meta.provider, version
        );
        let payload = self.nodepool_version_update_payload(version)?;
        self.update(client, &payload).await
    }

    fn v3_config<T>(&self, pick: impl Fn(&management::Cluster) -> Option<T>) -> Option<T> {
        self.v3.as_ref().and_then(pick)
    }

    fn missing(&self, representation: &str) -> RodeoError {
        RodeoError::MissingRepresentation {
            cluster: self.meta.name.clone(),
            representation: representation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(provider: KubernetesProvider, is_imported: bool) -> ClusterMeta {
        ClusterMeta {
            id: "c-m-abc123".to_string(),
            name: "shire".to_string(),
            provider,
            is_imported,
        }
    }

    fn with_v3(provider: KubernetesProvider, cluster_json: serde_json::Value) -> BundledCluster {
        BundledCluster {
            meta: meta(provider, false),
            v1: None,
            v3: Some(serde_json::from_value(cluster_json).unwrap()),
        }
    }

    #[test]
    fn test_uses_v1_only_for_imported_rke2_and_k3s() {
        assert!(uses_v1(&meta(KubernetesProvider::Rke2, true)));
        assert!(uses_v1(&meta(KubernetesProvider::K3s, true)));
        assert!(!uses_v1(&meta(KubernetesProvider::Rke2, false)));
        assert!(!uses_v1(&meta(KubernetesProvider::Rke, false)));
        assert!(!uses_v1(&meta(KubernetesProvider::Gke, false)));
    }

    #[test]
    fn test_version_payload_rke2() {
        let bundled = with_v3(
            KubernetesProvider::Rke2,
            json!({
                "id": "c-m-abc123",
                "name": "shire",
                "rke2Config": {
                    "kubernetesVersion": "v1.30.2+rke2r1",
                    "chartValues": {"rke2-calico": {}}
                }
            }),
        );

        let payload = bundled.version_update_payload("v1.31.0+rke2r1").unwrap();
        let BundledClusterUpdate::V3(updates) = payload else {
            panic!("expected a v3 payload");
        };
        assert_eq!(
            serde_json::to_value(&updates).unwrap(),
            json!({
                "name": "shire",
                "rke2Config": {
                    "kubernetesVersion": "v1.31.0+rke2r1",
                    "chartValues": {"rke2-calico": {}}
                }
            })
        );
    }

    #[test]
    fn test_version_payload_rke_keeps_config_fields() {
        let bundled = with_v3(
            KubernetesProvider::Rke,
            json!({
                "id": "c-m-abc123",
                "name": "shire",
                "rancherKubernetesEngineConfig": {
                    "kubernetesVersion": "v1.29.8-rancher1-1",
                    "network": {"plugin": "canal"}
                }
            }),
        );

        let payload = bundled.version_update_payload("v1.30.2-rancher1-1").unwrap();
        let BundledClusterUpdate::V3(updates) = payload else {
            panic!("expected a v3 payload");
        };
        let value = serde_json::to_value(&updates).unwrap();
        assert_eq!(
            value["rancherKubernetesEngineConfig"]["kubernetesVersion"],
            "v1.30.2-rancher1-1"
        );
        assert_eq!(
            value["rancherKubernetesEngineConfig"]["network"]["plugin"],
            "canal"
        );
        assert!(value.get("id").is_none(), "payload must stay sparse");
    }

    #[test]
    fn test_version_payload_imported_k3s_goes_through_v1() {
        let v1_cluster: SteveApiObject = serde_json::from_value(json!({
            "id": "fleet-default/shire",
            "type": "provisioning.cattle.io.cluster",
            "links": {"self": "https://rancher.test/v1/provisioning.cattle.io.cluster/fleet-default/shire"},
            "metadata": {"name": "shire", "namespace": "fleet-default"},
            "spec": {"kubernetesVersion": "v1.30.2+k3s1", "localClusterAuthEndpoint": {}}
        }))
        .unwrap();
        let bundled = BundledCluster {
            meta: meta(KubernetesProvider::K3s, true),
            v1: Some(v1_cluster),
            v3: None,
        };

        let payload = bundled.version_update_payload("v1.31.0+k3s1").unwrap();
        let BundledClusterUpdate::V1(updates) = payload else {
            panic!("expected a v1 payload");
        };
        assert_eq!(updates.spec["kubernetesVersion"], "v1.31.0+k3s1");
        assert_eq!(updates.spec["localClusterAuthEndpoint"], json!({}));
        assert_eq!(updates.id, "fleet-default/shire");
    }

    #[test]
    fn test_version_payload_hosted_providers() {
        let gke = with_v3(
            KubernetesProvider::Gke,
            json!({"name": "shire", "gkeConfig": {"kubernetesVersion": "1.29.8-gke.100"}}),
        );
        let BundledClusterUpdate::V3(updates) =
            gke.version_update_payload("1.30.2-gke.100").unwrap()
        else {
            panic!("expected a v3 payload");
        };
        assert_eq!(
            updates.gke_config.unwrap().kubernetes_version.as_deref(),
            Some("1.30.2-gke.100")
        );

        let aks = with_v3(
            KubernetesProvider::Aks,
            json!({"name": "shire", "aksConfig": {"kubernetesVersion": "1.29.8"}}),
        );
        let BundledClusterUpdate::V3(updates) = aks.version_update_payload("1.30.2").unwrap()
        else {
            panic!("expected a v3 payload");
        };
        assert_eq!(
            updates.aks_config.unwrap().kubernetes_version.as_deref(),
            Some("1.30.2")
        );

        let eks = with_v3(
            KubernetesProvider::Eks,
            json!({"name": "shire", "eksConfig": {"kubernetesVersion": "1.29"}}),
        );
        let BundledClusterUpdate::V3(updates) = eks.version_update_payload("1.30").unwrap() else {
            panic!("expected a v3 payload");
        };
        assert_eq!(
            updates.eks_config.unwrap().kubernetes_version.as_deref(),
            Some("1.30")
        );
    }

    #[test]
    fn test_version_payload_missing_config() {
        let bundled = with_v3(KubernetesProvider::Rke2, json!({"name": "shire"}));
        let err = bundled.version_update_payload("v1.31.0+rke2r1").unwrap_err();
        assert!(
            matches!(err, RodeoError::MissingRepresentation { ref representation, .. } if representation == "rke2Config")
        );
    }

    #[test]
    fn test_nodepool_payload_updates_every_pool() {
        let gke = with_v3(
            KubernetesProvider::Gke,
            json!({
                "name": "shire",
                "gkeConfig": {
                    "kubernetesVersion": "1.30.2-gke.100",
                    "nodePools": [
                        {"name": "pool-a", "version": "1.29.8-gke.100"},
                        {"name": "pool-b", "version": "1.29.8-gke.100"}
                    ]
                }
            }),
        );

        let BundledClusterUpdate::V3(updates) = gke
            .nodepool_version_update_payload("1.30.2-gke.100")
            .unwrap()
        else {
            panic!("expected a v3 payload");
        };
        let pools = updates.gke_config.unwrap().node_pools.unwrap();
        assert!(pools
            .iter()
            .all(|p| p.version.as_deref() == Some("1.30.2-gke.100")));
        assert_eq!(pools[0].extra["name"], "pool-a");
    }

    #[test]
    fn test_nodepool_payload_aks_uses_orchestrator_version() {
        let aks = with_v3(
            KubernetesProvider::Aks,
            json!({
                "name": "shire",
                "aksConfig": {"nodePools": [{"name": "agentpool", "orchestratorVersion": "1.29.8"}]}
            }),
        );

        let BundledClusterUpdate::V3(updates) =
            aks.nodepool_version_update_payload("1.30.2").unwrap()
        else {
            panic!("expected a v3 payload");
        };
        let pools = updates.aks_config.unwrap().node_pools.unwrap();
        assert_eq!(pools[0].orchestrator_version.as_deref(), Some("1.30.2"));
    }

    #[test]
    fn test_nodepool_payload_rejects_non_hosted_providers() {
        let bundled = with_v3(
            KubernetesProvider::Rke2,
            json!({"name": "shire", "rke2Config": {"kubernetesVersion": "v1.30.2+rke2r1"}}),
        );

        let err = bundled
            .nodepool_version_update_payload("v1.31.0+rke2r1")
            .unwrap_err();
        assert!(matches!(err, RodeoError::UnsupportedProvider(p) if p == "rke2"));
    }
}
