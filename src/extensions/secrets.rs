// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret templates and management on downstream clusters

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{ListParams, ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::error::Result;

/// Secret object carrying the given data under the given type
pub fn new_secret_template(
    name: &str,
    namespace: &str,
    data: BTreeMap<String, ByteString>,
    secret_type: &str,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(data),
        type_: Some(secret_type.to_string()),
        ..Default::default()
    }
}

#[instrument(skip(cluster, secret), fields(name = %secret.metadata.name.as_deref().unwrap_or("")))]
pub async fn create_secret(cluster: &Client, namespace: &str, secret: &Secret) -> Result<Secret> {
    let secrets: Api<Secret> = Api::namespaced(cluster.clone(), namespace);
    info!("Creating secret in namespace {}", namespace);
    Ok(secrets.create(&PostParams::default(), secret).await?)
}

pub async fn list_secrets(
    cluster: &Client,
    namespace: &str,
) -> Result<kube::core::ObjectList<Secret>> {
    let secrets: Api<Secret> = Api::namespaced(cluster.clone(), namespace);
    Ok(secrets.list(&ListParams::default()).await?)
}

/// Fetches a secret, `None` when it does not exist
pub async fn get_secret_by_name(
    cluster: &Client,
    namespace: &str,
    name: &str,
) -> Result<Option<Secret>> {
    let secrets: Api<Secret> = Api::namespaced(cluster.clone(), namespace);
    match secrets.get(name).await {
        Ok(secret) => Ok(Some(secret)),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}
