// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
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

pub fn workload_selector(namespace: &str, name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(
        workloads::SELECTOR_LABEL.to_string(),
        format!("{}{namespace}-{name}", workloads::DAEMONSET_SELECTOR_PREFIX),
    )])
}

pub fn new_daemonset_template(
    name: &str,
    namespace: &str,
    mut template: PodTemplateSpec,
) -> DaemonSet {
    let labels = workload_selector(namespace, name);
    template
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(Default::default)
        .extend(labels.clone());

    DaemonSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
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

#[instrument(skip(cluster, daemonset), fields(name = %daemonset.name_any()))]
pub async fn create_daemonset(
    cluster: &Client,
    namespace: &str,
    daemonset: &DaemonSet,
) -> Result<DaemonSet> {
    let api: Api<DaemonSet> = Api::namespaced(cluster.clone(), namespace);
    let created = api.create(&PostParams::default(), daemonset).await?;
    info!(namespace, "created daemonset");
    Ok(created)
}

pub async fn list_daemonsets(cluster: &Client, namespace: &str) -> Result<ObjectList<DaemonSet>> {
    let api: Api<DaemonSet> = Api::namespaced(cluster.clone(), namespace);
    Ok(api.list(&ListParams::default()).await?)
}

/// A daemonset counts as available once every scheduled node runs it.
pub fn is_available(daemonset: &DaemonSet) -> bool {
    daemonset.status.as_ref().is_some_and(|status| {
        status.number_available.unwrap_or(0) == status.desired_number_scheduled
    })
}

#[instrument(skip(cluster))]
pub async fn watch_and_wait_daemonsets(cluster: &Client, namespace: &str) -> Result<()> {
    let api: Api<DaemonSet> = Api::namespaced(cluster.clone(), namespace);
    let daemonsets = api.list(&ListParams::default()).await?;
    for daemonset in &daemonsets.items {
        let name = daemonset.name_any();
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
        debug!(name, "daemonset available");
    }
    Ok(())
}
