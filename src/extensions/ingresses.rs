// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ingress templates, lookup and reachability checks

use http::{Method, Request};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use kube::api::{Api, ListParams, ObjectMeta, PostParams, WatchEvent};
use kube::{Client, ResourceExt};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::constants::watch;
use crate::error::Result;
use crate::wait::{subscribe_named, watch_wait_within};

/// Ingress spec with a single host rule serving the given paths
pub fn new_ingress_template(host: &str, paths: Vec<HTTPIngressPath>) -> IngressSpec {
    IngressSpec {
        rules: Some(vec![IngressRule {
            host: Some(host.to_string()),
            http: Some(HTTPIngressRuleValue { paths }),
        }]),
        ..Default::default()
    }
}

/// Path entry forwarding to a service port
pub fn new_ingress_path_template(
    path_type: &str,
    path: &str,
    service_name: &str,
    service_port: i32,
) -> HTTPIngressPath {
    HTTPIngressPath {
        path: Some(path.to_string()),
        path_type: path_type.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: service_name.to_string(),
                port: Some(ServiceBackendPort {
                    number: Some(service_port),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    }
}

pub async fn create_ingress(
    cluster: &Client,
    name: &str,
    namespace: &str,
    spec: IngressSpec,
) -> Result<Ingress> {
    let ingress = Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(spec),
        status: None,
    };
    let api: Api<Ingress> = Api::namespaced(cluster.clone(), namespace);
    Ok(api.create(&PostParams::default(), &ingress).await?)
}

/// Lists ingresses in a namespace, or across the cluster when none is
/// given
pub async fn list_ingresses(
    cluster: &Client,
    namespace: Option<&str>,
) -> Result<kube::core::ObjectList<Ingress>> {
    let api: Api<Ingress> = match namespace {
        Some(namespace) => Api::namespaced(cluster.clone(), namespace),
        None => Api::all(cluster.clone()),
    };
    Ok(api.list(&ListParams::default()).await?)
}

/// Finds an ingress by name through a namespace listing
pub async fn get_ingress_by_name(
    cluster: &Client,
    namespace: &str,
    name: &str,
) -> Result<Option<Ingress>> {
    let ingresses = list_ingresses(cluster, Some(namespace)).await?;
    Ok(ingresses
        .items
        .into_iter()
        .find(|ingress| ingress.name_any() == name))
}

/// Whether the load balancer has published a hostname or address for
/// the ingress
pub fn has_public_endpoint(ingress: &Ingress) -> bool {
    ingress
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .is_some_and(|entries| {
            entries
                .iter()
                .any(|entry| entry.hostname.is_some() || entry.ip.is_some())
        })
}

/// Waits until an ingress has a public endpoint
#[instrument(skip(cluster))]
pub async fn wait_ingress_endpoint(
    cluster: &Client,
    namespace: &str,
    name: &str,
    deadline: Duration,
) -> Result<()> {
    let api: Api<Ingress> = Api::namespaced(cluster.clone(), namespace);
    watch_wait_within(
        deadline,
        || subscribe_named(api.clone(), name, watch::DEFAULT_TIMEOUT_SECS),
        |event| match event {
            WatchEvent::Added(ingress) | WatchEvent::Modified(ingress) => {
                Ok(has_public_endpoint(ingress))
            }
            _ => Ok(false),
        },
    )
    .await
}

/// Probes an ingress hostname from outside the cluster. `Ok(true)`
/// means the endpoint answered successfully, `Ok(false)` that it
/// answered with an error status; transport failures propagate.
pub async fn access_ingress_externally(hostname: &str, with_tls: bool) -> Result<bool> {
    let scheme = if with_tls { "https" } else { "http" };
    let uri: http::Uri = format!("{}://{}", scheme, hostname)
        .parse()
        .map_err(http::Error::from)?;
    debug!("Probing ingress endpoint {}", uri);

    let mut config = kube::Config::new(uri);
    config.accept_invalid_certs = true;
    let client = Client::try_from(config)?;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Vec::new())?;
    match client.request_text(request).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(_)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}
