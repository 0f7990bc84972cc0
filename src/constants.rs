// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Watch subscription tuning
pub mod watch {
    /// Timeout in seconds for a single watch subscription. The API server
    /// rejects timeouts of 295 seconds or more.
    pub const DEFAULT_TIMEOUT_SECS: u32 = 290;
    /// Overall deadline in seconds for lifecycle waits that may span
    /// several watch subscriptions
    pub const DEFAULT_DEADLINE_SECS: u64 = 1800;
}

/// Steve (v1) API type names
pub mod steve {
    pub const PROVISIONING_CLUSTERS: &str = "provisioning.cattle.io.cluster";
    pub const CATALOG_APPS: &str = "catalog.cattle.io.apps";
    pub const CLUSTER_REPOS: &str = "catalog.cattle.io.clusterrepos";
    /// Hard ceiling on continuation pages followed for one collection
    pub const MAX_PAGES: usize = 1000;
}

/// Cluster addressing
pub mod clusters {
    /// Cluster id of the Rancher local cluster
    pub const LOCAL_CLUSTER_ID: &str = "local";
    /// Namespace on the local cluster holding provisioning cluster objects
    pub const FLEET_DEFAULT_NAMESPACE: &str = "fleet-default";
}

/// Annotation keys stamped onto created resources
pub mod annotations {
    /// Project a namespace belongs to
    pub const PROJECT_ID: &str = "field.cattle.io/projectId";
    /// Default container resource limit for a namespace
    pub const CONTAINER_DEFAULT_RESOURCE_LIMIT: &str =
        "field.cattle.io/containerDefaultResourceLimit";
    pub const UI_SOURCE_REPO: &str = "catalog.cattle.io/ui-source-repo";
    pub const UI_SOURCE_REPO_TYPE: &str = "catalog.cattle.io/ui-source-repo-type";
}

/// Charts shipped in the rancher-charts repository
pub mod charts {
    pub const REPO_NAME: &str = "rancher-charts";
    pub const RANCHER_LOGGING_NAMESPACE: &str = "cattle-logging-system";
    pub const RANCHER_LOGGING_NAME: &str = "rancher-logging";
    pub const RANCHER_LOGGING_CRD_NAME: &str = "rancher-logging-crd";
    pub const RANCHER_GATEKEEPER_NAMESPACE: &str = "cattle-gatekeeper-system";
    pub const RANCHER_GATEKEEPER_NAME: &str = "rancher-gatekeeper";
    pub const RANCHER_GATEKEEPER_CRD_NAME: &str = "rancher-gatekeeper-crd";
}

/// Catalog app states reported by the app summary
pub mod apps {
    pub const STATE_DEPLOYED: &str = "deployed";
    pub const STATE_PENDING_UPGRADE: &str = "pending-upgrade";
}

/// Workload selector labelling applied by Rancher-created workloads
pub mod workloads {
    pub const SELECTOR_LABEL: &str = "workload.user.cattle.io/workloadselector";
    pub const DEPLOYMENT_SELECTOR_PREFIX: &str = "apps.deployment-";
    pub const DAEMONSET_SELECTOR_PREFIX: &str = "apps.daemonset-";
    /// Image run by every test workload container
    pub const TEST_IMAGE: &str = "ranchertest/mytestcontainer";
}

/// v3 cluster state polling
pub mod poll {
    /// Initial polling interval in seconds
    pub const INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const MAX_INTERVAL_SECS: u64 = 60;
}
