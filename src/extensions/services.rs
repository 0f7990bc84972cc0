// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service templates and creation on downstream clusters

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::error::Result;

/// Service spec of the given type exposing the given ports
pub fn new_service_template(
    service_type: &str,
    ports: Vec<ServicePort>,
    selector: BTreeMap<String, String>,
) -> ServiceSpec {
    ServiceSpec {
        type_: Some(service_type.to_string()),
        ports: Some(ports),
        selector: Some(selector),
        ..Default::default()
    }
}

#[instrument(skip(cluster, spec))]
pub async fn create_service(
    cluster: &Client,
    name: &str,
    namespace: &str,
    spec: ServiceSpec,
) -> Result<Service> {
    let service = Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(spec),
        status: None,
    };
    let services: Api<Service> = Api::namespaced(cluster.clone(), namespace);
    info!("Creating service {} in namespace {}", name, namespace);
    Ok(services.create(&PostParams::default(), &service).await?)
}
