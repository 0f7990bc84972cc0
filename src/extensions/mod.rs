// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helpers layered on the clients for working with cluster resources

use kube::core::ObjectList;
use kube::ResourceExt;

pub mod bundled_clusters;
pub mod charts;
pub mod clusters;
pub mod ingresses;
pub mod namespaces;
pub mod nodes;
pub mod projects;
pub mod secrets;
pub mod services;
pub mod workloads;

/// Names of the items in a typed list, in list order
pub fn names<K: ResourceExt + Clone>(list: &ObjectList<K>) -> Vec<String> {
    list.items.iter().map(|item| item.name_any()).collect()
}
