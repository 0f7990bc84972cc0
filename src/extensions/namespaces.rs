// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management on downstream clusters.
//!
//! Project membership and container limits travel as `field.cattle.io`
//! annotations stamped onto the namespace at creation time.

use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, ListParams, ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::clients::management::Project;
use crate::constants::annotations::{CONTAINER_DEFAULT_RESOURCE_LIMIT, PROJECT_ID};
use crate::error::Result;

/// Namespace object with project and limit annotations applied
pub fn new_namespace_template(
    name: &str,
    container_default_resource_limit: Option<&str>,
    labels: BTreeMap<String, String>,
    mut annotations: BTreeMap<String, String>,
    project: Option<&Project>,
) -> Namespace {
    if let Some(limit) = container_default_resource_limit {
        annotations.insert(CONTAINER_DEFAULT_RESOURCE_LIMIT.to_string(), limit.to_string());
    }
    if let Some(project) = project {
        annotations.insert(PROJECT_ID.to_string(), project.id.clone());
    }

    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: (!labels.is_empty()).then_some(labels),
            annotations: (!annotations.is_empty()).then_some(annotations),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Creates a namespace, optionally placing it in a project
#[instrument(skip(cluster, labels, annotations, project))]
pub async fn create_namespace(
    cluster: &Client,
    name: &str,
    container_default_resource_limit: Option<&str>,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    project: Option<&Project>,
) -> Result<Namespace> {
    let ns = new_namespace_template(
        name,
        container_default_resource_limit,
        labels,
        annotations,
        project,
    );
    let namespaces: Api<Namespace> = Api::all(cluster.clone());
    info!("Creating namespace {}", name);
    Ok(namespaces.create(&PostParams::default(), &ns).await?)
}

/// Fetches a namespace, `None` when it does not exist
pub async fn get_namespace_by_name(cluster: &Client, name: &str) -> Result<Option<Namespace>> {
    let namespaces: Api<Namespace> = Api::all(cluster.clone());
    match namespaces.get(name).await {
        Ok(ns) => Ok(Some(ns)),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_namespaces(cluster: &Client) -> Result<kube::core::ObjectList<Namespace>> {
    let namespaces: Api<Namespace> = Api::all(cluster.clone());
    Ok(namespaces.list(&ListParams::default()).await?)
}

#[instrument(skip(cluster))]
pub async fn delete_namespace(cluster: &Client, name: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(cluster.clone());
    info!("Deleting namespace {}", name);
    namespaces.delete(name, &DeleteParams::default()).await?;
    Ok(())
}
