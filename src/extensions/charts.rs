// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Chart installation and lifecycle helpers.
//!
//! Charts that ship a companion CRD chart install both in one action,
//! CRD chart first. Uninstall order is the reverse. Cleanup is
//! registered on the session before the install action is posted, so a
//! failed install still tears down whatever was created.

use kube::api::WatchEvent;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument};

use crate::clients::catalog::{
    CatalogClient, ChartInstall, ChartInstallAction, ChartUninstallAction, ChartUpgrade,
    ChartUpgradeAction, ChartValues,
};
use crate::clients::rancher::RancherClient;
use crate::clients::steve::SteveApiObject;
use crate::constants::annotations::{UI_SOURCE_REPO, UI_SOURCE_REPO_TYPE};
use crate::constants::charts::{
    RANCHER_GATEKEEPER_CRD_NAME, RANCHER_GATEKEEPER_NAME, RANCHER_GATEKEEPER_NAMESPACE,
    RANCHER_LOGGING_CRD_NAME, RANCHER_LOGGING_NAME, RANCHER_LOGGING_NAMESPACE, REPO_NAME,
};
use crate::constants::watch;
use crate::error::{Result, RodeoError};
use crate::types::app::App;
use crate::wait::{subscribe_named, watch_wait, watch_wait_within};

/// Where and at which version a chart gets installed
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub cluster_id: String,
    pub cluster_name: String,
    pub version: String,
    pub project_id: Option<String>,
}

/// Whether a chart release exists, and its backing app when it does
#[derive(Debug, Clone, Default)]
pub struct ChartStatus {
    pub is_already_installed: bool,
    pub chart_details: Option<SteveApiObject>,
}

#[derive(Debug, Clone, Default)]
pub struct RancherLoggingOpts {
    pub additional_logging_sources: bool,
}

impl RancherLoggingOpts {
    fn values(&self) -> ChartValues {
        let mut values = ChartValues::new();
        values.insert(
            "additionalLoggingSources".to_string(),
            json!({"enabled": self.additional_logging_sources}),
        );
        values
    }
}

/// Builds one chart entry with the cluster-targeting values block every
/// Rancher chart expects
pub fn new_chart_install(
    chart_name: &str,
    version: &str,
    cluster_id: &str,
    cluster_name: &str,
    server_url: &str,
    extra_values: &ChartValues,
) -> ChartInstall {
    let mut values = ChartValues::new();
    values.insert(
        "global".to_string(),
        json!({
            "cattle": {
                "clusterId": cluster_id,
                "clusterName": cluster_name,
                "rkePathPrefix": "",
                "rkeWindowsPathPrefix": "",
                "systemDefaultRegistry": "",
                "url": server_url,
            }
        }),
    );
    for (key, value) in extra_values {
        values.insert(key.clone(), value.clone());
    }

    let mut annotations = BTreeMap::new();
    annotations.insert(UI_SOURCE_REPO.to_string(), REPO_NAME.to_string());
    annotations.insert(UI_SOURCE_REPO_TYPE.to_string(), "cluster".to_string());

    ChartInstall {
        chart_name: chart_name.to_string(),
        release_name: chart_name.to_string(),
        version: version.to_string(),
        annotations,
        values,
    }
}

/// Install entries for a chart and its CRD chart, CRD chart first
pub fn new_chart_installs_with_crd(
    chart_name: &str,
    crd_chart_name: &str,
    options: &InstallOptions,
    server_url: &str,
    extra_values: &ChartValues,
) -> Vec<ChartInstall> {
    vec![
        new_chart_install(
            crd_chart_name,
            &options.version,
            &options.cluster_id,
            &options.cluster_name,
            server_url,
            extra_values,
        ),
        new_chart_install(
            chart_name,
            &options.version,
            &options.cluster_id,
            &options.cluster_name,
            server_url,
            extra_values,
        ),
    ]
}

pub fn new_chart_install_action(
    namespace: &str,
    project_id: Option<&str>,
    charts: Vec<ChartInstall>,
) -> ChartInstallAction {
    ChartInstallAction {
        timeout: Some("600s".to_string()),
        wait: true,
        disable_hooks: false,
        namespace: namespace.to_string(),
        project_id: project_id.map(String::from),
        charts,
    }
}

pub fn new_chart_upgrade(
    chart_name: &str,
    version: &str,
    cluster_id: &str,
    cluster_name: &str,
    server_url: &str,
    extra_values: &ChartValues,
) -> ChartUpgrade {
    let install = new_chart_install(
        chart_name,
        version,
        cluster_id,
        cluster_name,
        server_url,
        extra_values,
    );
    ChartUpgrade {
        chart_name: install.chart_name,
        release_name: install.release_name,
        version: install.version,
        force: false,
        annotations: install.annotations,
        values: install.values,
    }
}

/// Upgrade entries for a chart and its CRD chart, CRD chart first
pub fn new_chart_upgrades_with_crd(
    chart_name: &str,
    crd_chart_name: &str,
    options: &InstallOptions,
    server_url: &str,
    extra_values: &ChartValues,
) -> Vec<ChartUpgrade> {
    vec![
        new_chart_upgrade(
            crd_chart_name,
            &options.version,
            &options.cluster_id,
            &options.cluster_name,
            server_url,
            extra_values,
        ),
        new_chart_upgrade(
            chart_name,
            &options.version,
            &options.cluster_id,
            &options.cluster_name,
            server_url,
            extra_values,
        ),
    ]
}

pub fn new_chart_upgrade_action(namespace: &str, charts: Vec<ChartUpgrade>) -> ChartUpgradeAction {
    ChartUpgradeAction {
        timeout: Some("600s".to_string()),
        wait: true,
        disable_hooks: false,
        cleanup_on_fail: false,
        namespace: namespace.to_string(),
        charts,
    }
}

/// Looks up whether a release already exists in the cluster
pub async fn get_chart_status(
    catalog: &CatalogClient,
    namespace: &str,
    name: &str,
) -> Result<ChartStatus> {
    match catalog.app(namespace, name).await {
        Ok(app) => Ok(ChartStatus {
            is_already_installed: true,
            chart_details: Some(app),
        }),
        Err(RodeoError::KubeError(kube::Error::Api(err))) if err.code == 404 => {
            Ok(ChartStatus::default())
        }
        Err(err) => Err(err),
    }
}

/// Waits until an app watch event satisfies `check`, resubscribing
/// within the default deadline
pub async fn wait_app_state<F>(
    catalog: &CatalogClient,
    namespace: &str,
    name: &str,
    check: F,
) -> Result<()>
where
    F: FnMut(&WatchEvent<App>) -> Result<bool>,
{
    let apps = catalog.apps(namespace);
    watch_wait_within(
        Duration::from_secs(watch::DEFAULT_DEADLINE_SECS),
        || subscribe_named(apps.clone(), name, watch::DEFAULT_TIMEOUT_SECS),
        check,
    )
    .await
}

/// Waits for one watch window until an app is gone
async fn wait_app_deleted(catalog: &CatalogClient, namespace: &str, name: &str) -> Result<()> {
    let events = subscribe_named(catalog.apps(namespace), name, watch::DEFAULT_TIMEOUT_SECS).await?;
    watch_wait(events, |event| Ok(matches!(event, WatchEvent::Deleted(_)))).await
}

/// Installs a chart together with its CRD chart and waits until the
/// release is deployed. Uninstall of both releases is registered on the
/// session before the install action is posted.
#[instrument(skip(client, options, extra_values), fields(cluster = %options.cluster_name))]
pub async fn install_chart_with_crd(
    client: &RancherClient,
    options: &InstallOptions,
    chart_name: &str,
    crd_chart_name: &str,
    namespace: &str,
    extra_values: &ChartValues,
) -> Result<()> {
    let catalog = client.cluster_catalog(&options.cluster_id).await?;

    {
        let catalog = catalog.clone();
        let chart_name = chart_name.to_string();
        let crd_chart_name = crd_chart_name.to_string();
        let namespace = namespace.to_string();
        client.session().register_cleanup(move || async move {
            let action = ChartUninstallAction::default();
            catalog
                .uninstall_chart(&chart_name, &namespace, &action)
                .await?;
            wait_app_deleted(&catalog, &namespace, &chart_name).await?;
            catalog
                .uninstall_chart(&crd_chart_name, &namespace, &action)
                .await?;
            wait_app_deleted(&catalog, &namespace, &crd_chart_name).await
        });
    }

    let charts = new_chart_installs_with_crd(
        chart_name,
        crd_chart_name,
        options,
        &client.config().server_url(),
        extra_values,
    );
    let action = new_chart_install_action(namespace, options.project_id.as_deref(), charts);
    catalog.install_chart(REPO_NAME, &action).await?;
    info!("Installed {} {}, waiting for deployment", chart_name, options.version);

    wait_app_state(&catalog, namespace, chart_name, |event| match event {
        WatchEvent::Added(app) | WatchEvent::Modified(app) => Ok(app.is_deployed()),
        _ => Ok(false),
    })
    .await
}

/// Installs the rancher-logging chart and waits until it is deployed
pub async fn install_rancher_logging_chart(
    client: &RancherClient,
    options: &InstallOptions,
    logging_opts: &RancherLoggingOpts,
) -> Result<()> {
    install_chart_with_crd(
        client,
        options,
        RANCHER_LOGGING_NAME,
        RANCHER_LOGGING_CRD_NAME,
        RANCHER_LOGGING_NAMESPACE,
        &logging_opts.values(),
    )
    .await
}

/// Installs the rancher-gatekeeper chart and waits until it is deployed
pub async fn install_rancher_gatekeeper_chart(
    client: &RancherClient,
    options: &InstallOptions,
) -> Result<()> {
    install_chart_with_crd(
        client,
        options,
        RANCHER_GATEKEEPER_NAME,
        RANCHER_GATEKEEPER_CRD_NAME,
        RANCHER_GATEKEEPER_NAMESPACE,
        &ChartValues::new(),
    )
    .await
}

/// Upgrades the rancher-gatekeeper chart and follows the release
/// through pending-upgrade to deployed
#[instrument(skip(client, options), fields(cluster = %options.cluster_name))]
pub async fn upgrade_rancher_gatekeeper_chart(
    client: &RancherClient,
    options: &InstallOptions,
) -> Result<()> {
    let catalog = client.cluster_catalog(&options.cluster_id).await?;

    let charts = new_chart_upgrades_with_crd(
        RANCHER_GATEKEEPER_NAME,
        RANCHER_GATEKEEPER_CRD_NAME,
        options,
        &client.config().server_url(),
        &ChartValues::new(),
    );
    let action = new_chart_upgrade_action(RANCHER_GATEKEEPER_NAMESPACE, charts);
    catalog.upgrade_chart(REPO_NAME, &action).await?;
    info!(
        "Upgrading {} to {}",
        RANCHER_GATEKEEPER_NAME, options.version
    );

    wait_app_state(
        &catalog,
        RANCHER_GATEKEEPER_NAMESPACE,
        RANCHER_GATEKEEPER_NAME,
        |event| match event {
            WatchEvent::Added(app) | WatchEvent::Modified(app) => Ok(app.is_pending_upgrade()),
            _ => Ok(false),
        },
    )
    .await?;

    wait_app_state(
        &catalog,
        RANCHER_GATEKEEPER_NAMESPACE,
        RANCHER_GATEKEEPER_NAME,
        |event| match event {
            WatchEvent::Added(app) | WatchEvent::Modified(app) => Ok(app.is_deployed()),
            _ => Ok(false),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{app_json, MockService};

    fn options() -> InstallOptions {
        InstallOptions {
            cluster_id: "c-m-abc123".to_string(),
            cluster_name: "shire".to_string(),
            version: "103.1.0+up3.13.0".to_string(),
            project_id: Some("c-m-abc123:p-xyz".to_string()),
        }
    }

    #[test]
    fn test_chart_install_carries_cluster_values_block() {
        let install = new_chart_install(
            "rancher-gatekeeper",
            "103.1.0+up3.13.0",
            "c-m-abc123",
            "shire",
            "https://rancher.test",
            &ChartValues::new(),
        );

        assert_eq!(install.release_name, "rancher-gatekeeper");
        let cattle = &install.values["global"]["cattle"];
        assert_eq!(cattle["clusterId"], "c-m-abc123");
        assert_eq!(cattle["clusterName"], "shire");
        assert_eq!(cattle["url"], "https://rancher.test");
        assert_eq!(cattle["systemDefaultRegistry"], "");
        assert_eq!(
            install.annotations[UI_SOURCE_REPO], REPO_NAME,
            "repo annotation drives the UI source display"
        );
        assert_eq!(install.annotations[UI_SOURCE_REPO_TYPE], "cluster");
    }

    #[test]
    fn test_chart_install_merges_extra_values() {
        let opts = RancherLoggingOpts {
            additional_logging_sources: true,
        };
        let install = new_chart_install(
            RANCHER_LOGGING_NAME,
            "103.1.0+up4.4.0",
            "c-m-abc123",
            "shire",
            "https://rancher.test",
            &opts.values(),
        );

        assert_eq!(
            install.values["additionalLoggingSources"]["enabled"],
            true
        );
        assert!(install.values.contains_key("global"));
    }

    #[test]
    fn test_crd_chart_installs_first() {
        let charts = new_chart_installs_with_crd(
            RANCHER_GATEKEEPER_NAME,
            RANCHER_GATEKEEPER_CRD_NAME,
            &options(),
            "https://rancher.test",
            &ChartValues::new(),
        );

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].chart_name, RANCHER_GATEKEEPER_CRD_NAME);
        assert_eq!(charts[1].chart_name, RANCHER_GATEKEEPER_NAME);
        assert_eq!(charts[0].version, charts[1].version);
    }

    #[test]
    fn test_crd_chart_upgrades_first() {
        let charts = new_chart_upgrades_with_crd(
            RANCHER_GATEKEEPER_NAME,
            RANCHER_GATEKEEPER_CRD_NAME,
            &options(),
            "https://rancher.test",
            &ChartValues::new(),
        );

        assert_eq!(charts[0].chart_name, RANCHER_GATEKEEPER_CRD_NAME);
        assert_eq!(charts[1].chart_name, RANCHER_GATEKEEPER_NAME);
        assert!(!charts[0].force);
    }

    #[test]
    fn test_install_action_defaults() {
        let action = new_chart_install_action("cattle-gatekeeper-system", Some("c-m-abc123:p-xyz"), vec![]);
        assert_eq!(action.timeout.as_deref(), Some("600s"));
        assert!(action.wait);
        assert!(!action.disable_hooks);
        assert_eq!(action.project_id.as_deref(), Some("c-m-abc123:p-xyz"));
    }

    #[tokio::test]
    async fn test_get_chart_status_installed() {
        let mock = MockService::new().on_get(
            "/v1/catalog.cattle.io.apps/cattle-logging-system/rancher-logging",
            200,
            &app_json("rancher-logging", "cattle-logging-system", "deployed"),
        );
        let catalog = CatalogClient::new(mock.clone().into_client(), "/v1", mock.into_client());

        let status = get_chart_status(&catalog, "cattle-logging-system", "rancher-logging")
            .await
            .unwrap();
        assert!(status.is_already_installed);
        assert!(status.chart_details.is_some());
    }

    #[tokio::test]
    async fn test_get_chart_status_not_installed() {
        let mock = MockService::new();
        let catalog = CatalogClient::new(mock.clone().into_client(), "/v1", mock.into_client());

        let status = get_chart_status(&catalog, "cattle-logging-system", "rancher-logging")
            .await
            .unwrap();
        assert!(!status.is_already_installed);
        assert!(status.chart_details.is_none());
    }
}
