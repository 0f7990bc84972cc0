// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

use crate::clients::steve::SteveApiObject;

#[derive(Error, Debug)]
pub enum RodeoError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON conversion failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing failed: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Failed to build HTTP request: {0}")]
    HttpError(#[from] http::Error),

    #[error("Resource {id} has no '{link}' link")]
    MissingLink { id: String, link: String },

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Cannot determine Kubernetes provider for cluster {0}")]
    UnknownProvider(String),

    #[error("Operation not supported for provider {0}")]
    UnsupportedProvider(String),

    #[error("Cluster {cluster} has no {representation} representation loaded")]
    MissingRepresentation {
        cluster: String,
        representation: String,
    },

    #[error("Chart {0} not found in repository index")]
    ChartNotFound(String),

    #[error("Collection listing stopped after {} items: {source}", .partial.len())]
    PartialList {
        partial: Vec<SteveApiObject>,
        source: Box<RodeoError>,
    },

    #[error("Collection exceeded {limit} pages ({} items collected)", .partial.len())]
    PageLimit {
        partial: Vec<SteveApiObject>,
        limit: usize,
    },

    #[error("Watch stream returned an error event: {0}")]
    WatchEventError(String),

    #[error("Timed out waiting on watch condition")]
    WatchTimeout,
}

pub type Result<T> = std::result::Result<T, RodeoError>;
