// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{ListParams, ObjectMeta, PostParams, WatchEvent};
use kube::core::ObjectList;
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::constants::{watch, workloads};
use crate::error::Result;
use crate::wait::{subscribe_named, watch_wait_within};

/// Selector label the Rancher UI stamps on deployments it creates.
pub fn workload_selector(namespace: &str, name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(
        workloads::SELECTOR_LABEL.to_string(),
        format!("{}{namespace}-{name}", workloads::DEPLOYMENT_SELECTOR_PREFIX),
    )])
}

/// Builds a deployment whose selector and pod labels match the way the
/// Rancher UI wires up workloads. Labels already present on the pod
/// template are kept.
pub fn new_deployment_template(
    name: &str,
    namespace: &str,
    mut template: PodTemplateSpec,
    replicas: i32,
) -> Deployment {
    let labels = workload_selector(namespace, name);
    template
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(Default::default)
        .extend(labels.clone());

    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(labels),
                ..Default::default()
            },
            template,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[instrument(skip(cluster, deployment), fields(name = %deployment.name_any()))]
pub async fn create_deployment(
    cluster: &Client,
    namespace: &str,
    deployment: &Deployment,
) -> Result<Deployment> {
    let api: Api<Deployment> = Api::namespaced(cluster.clone(), namespace);
    let created = api.create(&PostParams::default(), deployment).await?;
    info!(namespace, "created deployment");
    Ok(created)
}

pub async fn list_deployments(
    cluster: &Client,
    namespace: &str,
) -> Result<ObjectList<Deployment>> {
    let api: Api<Deployment> = Api::namespaced(cluster.clone(), namespace);
    Ok(api.list(&ListParams::default()).await?)
}

/// A deployment counts as available once every desired replica is.
pub fn is_available(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let available = deployment
        .status
        .as_ref()
        .and_then(|status| status.available_replicas)
        .unwrap_or(0);
    available == desired
}

/// Watches every deployment in the namespace until all replicas are
/// available.
#[instrument(skip(cluster))]
pub async fn watch_and_wait_deployments(cluster: &Client, namespace: &str) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(cluster.clone(), namespace);
    let deployments = api.list(&ListParams::default()).await?;
    for deployment in &deployments.items {
        let name = deployment.name_any();
        watch_wait_within(
            Duration::from_secs(watch::DEFAULT_DEADLINE_SECS),
            || subscribe_named(api.clone(), &name, watch::DEFAULT_TIMEOUT_SECS),
            |event| match event {
                WatchEvent::Added(current) | WatchEvent::Modified(current) => {
                    Ok(is_available(current))
                }
                _ => Ok(false),
            },
        )
        .await?;
        debug!(name, "deployment available");
    }
    Ok(())
}
