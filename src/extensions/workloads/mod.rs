// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload templates and waiting helpers.
//!
//! Pod templates are assembled from parts so suites can mix plain
//! containers with secret-backed volumes and environments.

use k8s_openapi::api::core::v1::{
    Container, EnvFromSource, LocalObjectReference, PodSpec, PodTemplateSpec, SecretEnvSource,
    SecretVolumeSource, Volume, VolumeMount,
};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

pub mod daemonsets;
pub mod deployments;

pub fn new_container(
    name: &str,
    image: &str,
    image_pull_policy: &str,
    volume_mounts: Vec<VolumeMount>,
    env_from: Vec<EnvFromSource>,
) -> Container {
    Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(image_pull_policy.to_string()),
        volume_mounts: (!volume_mounts.is_empty()).then_some(volume_mounts),
        env_from: (!env_from.is_empty()).then_some(env_from),
        ..Default::default()
    }
}

pub fn new_pod_template(
    containers: Vec<Container>,
    volumes: Vec<Volume>,
    image_pull_secrets: Vec<LocalObjectReference>,
    labels: BTreeMap<String, String>,
) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: (!labels.is_empty()).then_some(labels),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers,
            volumes: (!volumes.is_empty()).then_some(volumes),
            image_pull_secrets: (!image_pull_secrets.is_empty()).then_some(image_pull_secrets),
            ..Default::default()
        }),
    }
}

/// Volume backed by a secret
pub fn new_secret_volume(volume_name: &str, secret_name: &str) -> Volume {
    Volume {
        name: volume_name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Environment source pulling every key of a secret
pub fn new_secret_env_source(secret_name: &str) -> EnvFromSource {
    EnvFromSource {
        secret_ref: Some(SecretEnvSource {
            name: Some(secret_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
