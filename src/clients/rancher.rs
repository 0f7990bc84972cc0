// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Top-level Rancher client.
//!
//! One bearer token and one server host fan out into the three API
//! surfaces: management (v3), Steve (v1) and catalog. Downstream
//! clusters are reached through the server's API proxy under
//! `/k8s/clusters/{id}`, so every client shares the same TLS and auth
//! setup. Construction goes through a synthesized kubeconfig to reuse
//! the standard client machinery.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::clients::catalog::CatalogClient;
use crate::clients::management::ManagementClient;
use crate::clients::steve::SteveApiClient;
use crate::config::{EnvironmentFlags, RancherConfig};
use crate::constants::clusters::LOCAL_CLUSTER_ID;
use crate::error::{Result, RodeoError};
use crate::session::Session;

/// Renders a minimal kubeconfig for a Rancher endpoint with bearer
/// token auth
fn render_kubeconfig(server: &str, token: &str, insecure: bool) -> Result<String> {
    let mut cluster = json!({"server": server});
    if insecure {
        cluster["insecure-skip-tls-verify"] = json!(true);
    }
    let kubeconfig = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{"name": "rancher", "cluster": cluster}],
        "users": [{"name": "rancher", "user": {"token": token}}],
        "contexts": [{
            "name": "rancher",
            "context": {"cluster": "rancher", "user": "rancher"}
        }],
        "current-context": "rancher"
    });
    Ok(serde_yaml::to_string(&kubeconfig)?)
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| RodeoError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| RodeoError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| RodeoError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Client for one Rancher setup, bound to a cleanup session
#[derive(Clone)]
pub struct RancherClient {
    config: RancherConfig,
    token: String,
    session: Arc<Session>,
    transport: Client,
    management: ManagementClient,
    steve: SteveApiClient,
    catalog: CatalogClient,
}

impl RancherClient {
    /// Builds a client from environment configuration
    pub async fn new(bearer_token: Option<&str>, session: Arc<Session>) -> Result<Self> {
        let config = RancherConfig::from_env()
            .map_err(|e| RodeoError::ConfigError(format!("{:#}", e)))?;
        Self::with_config(config, bearer_token, session).await
    }

    /// Builds a client from explicit configuration. When `bearer_token`
    /// is absent the admin token from the configuration is used.
    #[instrument(skip(config, bearer_token, session), fields(host = %config.host))]
    pub async fn with_config(
        config: RancherConfig,
        bearer_token: Option<&str>,
        session: Arc<Session>,
    ) -> Result<Self> {
        let token = bearer_token.unwrap_or(&config.admin_token).to_string();

        let server_kubeconfig = render_kubeconfig(&config.server_url(), &token, config.insecure)?;
        let transport = create_client_from_kubeconfig(&server_kubeconfig).await?;
        debug!("Connected to Rancher at {}", config.server_url());

        let local_kubeconfig = render_kubeconfig(
            &format!("{}/k8s/clusters/{}", config.server_url(), LOCAL_CLUSTER_ID),
            &token,
            config.insecure,
        )?;
        let local = create_client_from_kubeconfig(&local_kubeconfig).await?;

        let management = ManagementClient::new(transport.clone());
        let steve = SteveApiClient::new(transport.clone(), "/v1");
        let catalog = CatalogClient::new(transport.clone(), "/v1", local);

        Ok(RancherClient {
            config,
            token,
            session,
            transport,
            management,
            steve,
            catalog,
        })
    }

    /// Same credentials and configuration, bound to another session
    pub fn with_session(&self, session: Arc<Session>) -> Self {
        let mut client = self.clone();
        client.session = session;
        client
    }

    pub fn config(&self) -> &RancherConfig {
        &self.config
    }

    pub fn flags(&self) -> &EnvironmentFlags {
        &self.config.flags
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Management (v3) API of the Rancher server
    pub fn management(&self) -> &ManagementClient {
        &self.management
    }

    /// Steve (v1) API of the Rancher server
    pub fn steve(&self) -> &SteveApiClient {
        &self.steve
    }

    /// Catalog API of the Rancher server, watching apps on the local
    /// cluster
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Kubernetes client for a downstream cluster through the API proxy
    #[instrument(skip(self))]
    pub async fn downstream(&self, cluster_id: &str) -> Result<Client> {
        let kubeconfig = render_kubeconfig(
            &format!("{}/k8s/clusters/{}", self.config.server_url(), cluster_id),
            &self.token,
            self.config.insecure,
        )?;
        create_client_from_kubeconfig(&kubeconfig).await
    }

    /// Steve (v1) API of a downstream cluster
    pub fn downstream_steve(&self, cluster_id: &str) -> SteveApiClient {
        SteveApiClient::new(
            self.transport.clone(),
            format!("/k8s/clusters/{}/v1", cluster_id),
        )
    }

    /// Catalog API of a downstream cluster
    pub async fn cluster_catalog(&self, cluster_id: &str) -> Result<CatalogClient> {
        let cluster = self.downstream(cluster_id).await?;
        Ok(CatalogClient::new(
            self.transport.clone(),
            format!("/k8s/clusters/{}/v1", cluster_id),
            cluster,
        ))
    }
}
