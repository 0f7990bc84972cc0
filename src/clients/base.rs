// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Shared HTTP plumbing for the Rancher API surfaces.
//!
//! The management (`/v3`), Steve (`/v1`) and catalog clients all speak
//! norman-style JSON over the same authenticated transport. Everything
//! here goes through [`kube::Client::request`] so auth, TLS and test
//! mocking are uniform across the crate.

use http::{header, Method, Request};
use kube::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use crate::error::{Result, RodeoError};

/// Query filters applied to a collection listing
#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    filters: Vec<(String, String)>,
}

impl ListOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Renders the filters as a query string, without the leading '?'
    pub fn to_query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.filters {
            query.append_pair(key, value);
        }
        query.finish()
    }
}

/// Pagination block returned on collection responses. The next link is an
/// opaque URL minted by the server and is passed back verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
}

impl Pagination {
    /// The continuation URL, if the server handed one out
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|n| !n.is_empty())
    }
}

/// Low-level operations shared by the typed clients. Paths are built
/// under a fixed prefix (`/v3`, `/v1` or a cluster proxy equivalent) and
/// issued relative to the transport's base URL.
#[derive(Clone)]
pub struct BaseClient {
    client: Client,
    prefix: String,
}

impl BaseClient {
    pub fn new(client: Client, prefix: impl Into<String>) -> Self {
        BaseClient {
            client,
            prefix: prefix.into(),
        }
    }

    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    fn collection_path(&self, resource_type: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/{}", self.prefix, resource_type)
        } else {
            format!("{}/{}?{}", self.prefix, resource_type, query)
        }
    }

    fn resource_path(&self, resource_type: &str, id: &str) -> String {
        format!("{}/{}/{}", self.prefix, resource_type, id)
    }

    /// Reduces a server-minted absolute URL to the path and query the
    /// transport expects. The URL is split, never rewritten.
    fn request_target(link: &str) -> Result<String> {
        if link.starts_with('/') {
            return Ok(link.to_string());
        }
        let url = Url::parse(link)?;
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        Ok(target)
    }

    fn self_link<'a>(id: &str, links: &'a BTreeMap<String, String>) -> Result<&'a str> {
        links
            .get("self")
            .map(String::as_str)
            .ok_or_else(|| RodeoError::MissingLink {
                id: id.to_string(),
                link: "self".to_string(),
            })
    }

    async fn get<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        debug!("GET {}", target);
        let request = Request::builder()
            .method(Method::GET)
            .uri(target)
            .header(header::ACCEPT, "application/json")
            .body(Vec::new())?;
        Ok(self.client.request::<T>(request).await?)
    }

    /// GET {prefix}/{type}?{filters}
    pub async fn do_list<T: DeserializeOwned>(
        &self,
        resource_type: &str,
        opts: &ListOpts,
    ) -> Result<T> {
        self.get(&self.collection_path(resource_type, &opts.to_query()))
            .await
    }

    /// Follows a continuation URL handed out by a previous page
    pub async fn do_next<T: DeserializeOwned>(&self, next_link: &str) -> Result<T> {
        self.get(&Self::request_target(next_link)?).await
    }

    /// GET {prefix}/{type}/{id}
    pub async fn do_by_id<T: DeserializeOwned>(&self, resource_type: &str, id: &str) -> Result<T> {
        self.get(&self.resource_path(resource_type, id)).await
    }

    /// POST {prefix}/{type}
    pub async fn do_create<B: Serialize, T: DeserializeOwned>(
        &self,
        resource_type: &str,
        body: &B,
    ) -> Result<T> {
        let target = self.collection_path(resource_type, "");
        debug!("POST {}", target);
        let request = Request::builder()
            .method(Method::POST)
            .uri(target)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(serde_json::to_vec(body)?)?;
        Ok(self.client.request::<T>(request).await?)
    }

    /// PUT to the resource's self link
    pub async fn do_update<B: Serialize, T: DeserializeOwned>(
        &self,
        id: &str,
        links: &BTreeMap<String, String>,
        body: &B,
    ) -> Result<T> {
        let target = Self::request_target(Self::self_link(id, links)?)?;
        debug!("PUT {}", target);
        let request = Request::builder()
            .method(Method::PUT)
            .uri(target)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(serde_json::to_vec(body)?)?;
        Ok(self.client.request::<T>(request).await?)
    }

    /// DELETE the resource's self link
    pub async fn do_delete(&self, id: &str, links: &BTreeMap<String, String>) -> Result<()> {
        let target = Self::request_target(Self::self_link(id, links)?)?;
        debug!("DELETE {}", target);
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(target)
            .header(header::ACCEPT, "application/json")
            .body(Vec::new())?;
        self.client.request_text(request).await?;
        Ok(())
    }

    /// POST {prefix}/{type}/{id}?action={action}. The response body is
    /// returned raw since action outputs vary per action.
    pub async fn do_action<B: Serialize>(
        &self,
        resource_type: &str,
        id: &str,
        action: &str,
        body: &B,
    ) -> Result<String> {
        let target = format!("{}?action={}", self.resource_path(resource_type, id), action);
        debug!("POST {}", target);
        let request = Request::builder()
            .method(Method::POST)
            .uri(target)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(serde_json::to_vec(body)?)?;
        Ok(self.client.request_text(request).await?)
    }

    /// GET a named link on a resource, parsing the response as YAML.
    /// A JSON body parses fine as well.
    pub async fn do_link_yaml<T: DeserializeOwned>(
        &self,
        resource_type: &str,
        id: &str,
        link: &str,
    ) -> Result<T> {
        let target = format!("{}?link={}", self.resource_path(resource_type, id), link);
        debug!("GET {}", target);
        let request = Request::builder()
            .method(Method::GET)
            .uri(target)
            .body(Vec::new())?;
        let body = self.client.request_text(request).await?;
        Ok(serde_yaml::from_str(&body)?)
    }
}
