// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Steve (v1) API client.
//!
//! Steve serves Kubernetes objects in a norman-flavored envelope: ids,
//! links and a state block around the native metadata, spec and status.
//! Collections paginate through opaque continuation URLs; [`SteveClient::list_all`]
//! follows them so callers always see the full collection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::clients::base::{BaseClient, ListOpts, Pagination};
use crate::constants::steve::MAX_PAGES;
use crate::error::{Result, RodeoError};

/// Object state reported by Steve under `metadata.state`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transitioning: bool,
}

/// Native object metadata plus the Steve state block. Fields the crate
/// does not model round-trip through `extra`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SteveMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One object as served by Steve
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SteveApiObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, String>,
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: SteveMetadata,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub status: Value,
}

impl SteveApiObject {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// State name reported by Steve, when present
    pub fn state_name(&self) -> Option<&str> {
        self.metadata.state.as_ref().map(|s| s.name.as_str())
    }

    /// Converts the untyped spec into a native Kubernetes type
    pub fn spec_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.spec.clone())?)
    }

    /// Converts the untyped status into a native Kubernetes type
    pub fn status_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.status.clone())?)
    }
}

/// One page of a Steve collection, or a fully concatenated collection
/// once the continuation pages have been followed
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SteveCollection {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub collection_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub data: Vec<SteveApiObject>,
}

impl SteveCollection {
    /// Continuation URL for the next page, when the server minted one
    pub fn next_url(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(|p| p.next_url())
    }

    /// Names of the items, in server order
    pub fn names(&self) -> Vec<String> {
        self.data
            .iter()
            .map(|obj| obj.metadata.name.clone())
            .collect()
    }
}

/// Client for one Steve (v1) surface, either the Rancher server's own or
/// a cluster's through the API proxy
#[derive(Clone)]
pub struct SteveApiClient {
    base: BaseClient,
}

impl SteveApiClient {
    pub fn new(client: kube::Client, prefix: impl Into<String>) -> Self {
        SteveApiClient {
            base: BaseClient::new(client, prefix),
        }
    }

    /// Binds the client to one Steve resource type
    pub fn steve_type(&self, resource_type: impl Into<String>) -> SteveClient {
        SteveClient {
            base: self.base.clone(),
            resource_type: resource_type.into(),
        }
    }
}

/// Operations on a single Steve resource type
#[derive(Clone)]
pub struct SteveClient {
    base: BaseClient,
    resource_type: String,
}

impl SteveClient {
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Fetches the first page of the collection
    pub async fn list(&self, opts: &ListOpts) -> Result<SteveCollection> {
        self.base.do_list(&self.resource_type, opts).await
    }

    /// Fetches the page a collection points at, if any
    pub async fn next_page(&self, collection: &SteveCollection) -> Result<Option<SteveCollection>> {
        match collection.next_url() {
            Some(next) => Ok(Some(self.base.do_next(next).await?)),
            None => Ok(None),
        }
    }

    /// Lists the collection and follows every continuation page
    #[instrument(skip(self, opts), fields(resource_type = %self.resource_type))]
    pub async fn list_all(&self, opts: &ListOpts) -> Result<SteveCollection> {
        let first = self.list(opts).await?;
        self.follow_all(first).await
    }

    /// Concatenates every page reachable from an already-fetched first
    /// page, keeping items in server order. When fetching a page fails,
    /// the items gathered so far travel inside the error so callers can
    /// still inspect the partial listing.
    pub async fn follow_all(&self, first_page: SteveCollection) -> Result<SteveCollection> {
        let mut collection = first_page;
        let mut pages = 1usize;
        while let Some(next) = collection.next_url().map(String::from) {
            if pages >= MAX_PAGES {
                return Err(RodeoError::PageLimit {
                    partial: collection.data,
                    limit: MAX_PAGES,
                });
            }
            let page: SteveCollection = match self.base.do_next(&next).await {
                Ok(page) => page,
                Err(err) => {
                    return Err(RodeoError::PartialList {
                        partial: collection.data,
                        source: Box::new(err),
                    })
                }
            };
            collection.data.extend(page.data);
            collection.pagination = page.pagination;
            pages += 1;
            debug!(
                "Followed continuation page {} of {}",
                pages, self.resource_type
            );
        }
        Ok(collection)
    }

    /// GET a single object. Namespaced ids take the `namespace/name` form.
    pub async fn by_id(&self, id: &str) -> Result<SteveApiObject> {
        self.base.do_by_id(&self.resource_type, id).await
    }

    pub async fn create<B: Serialize>(&self, body: &B) -> Result<SteveApiObject> {
        self.base.do_create(&self.resource_type, body).await
    }

    /// PUT an updates object to the resource's self link
    pub async fn update<B: Serialize>(
        &self,
        existing: &SteveApiObject,
        updates: &B,
    ) -> Result<SteveApiObject> {
        self.base
            .do_update(&existing.id, &existing.links, updates)
            .await
    }

    /// PUT the full object back to its own self link
    pub async fn replace(&self, obj: &SteveApiObject) -> Result<SteveApiObject> {
        self.base.do_update(&obj.id, &obj.links, obj).await
    }

    pub async fn delete(&self, obj: &SteveApiObject) -> Result<()> {
        self.base.do_delete(&obj.id, &obj.links).await
    }
}
