// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Rancher and Kubernetes API responses.

use http::{Method, Request, Response};
use kube::client::Body;
use kube::Client;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tower::Service;

#[derive(Clone)]
struct Rule {
    method: Method,
    path: String,
    status: u16,
    body: String,
}

/// A mock HTTP service that returns canned responses based on request
/// method and path. Matching considers the query string, tries exact
/// matches first and falls back to prefix matches in registration order.
/// Unmatched requests get a Kubernetes-style 404 status body.
#[derive(Clone)]
pub struct MockService {
    rules: Arc<Mutex<Vec<Rule>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

/// Handle onto the requests a [`MockService`] has served
#[derive(Clone)]
pub struct RequestRecorder {
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl RequestRecorder {
    /// Requests seen so far as (method, path-and-query) pairs
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MockService {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on(Method::GET, path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on(Method::POST, path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on(Method::PUT, path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on(Method::DELETE, path, status, body)
    }

    fn on(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Rule {
                method,
                path: path.to_string(),
                status,
                body: body.to_string(),
            });
        self
    }

    pub fn recorder(&self) -> RequestRecorder {
        RequestRecorder {
            requests: Arc::clone(&self.requests),
        }
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "https://kubernetes.default.svc")
    }

    fn find_response(&self, method: &Method, path: &str) -> Option<(u16, String)> {
        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(rule) = rules
            .iter()
            .find(|r| &r.method == method && r.path == path)
        {
            return Some((rule.status, rule.body.clone()));
        }

        rules
            .iter()
            .find(|r| &r.method == method && path.starts_with(&r.path))
            .map(|r| (r.status, r.body.clone()))
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().clone();
        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((method.to_string(), path.clone()));

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            match response {
                Some((status, body)) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap()),
                None => Ok(Response::builder()
                    .status(404)
                    .header("content-type", "application/json")
                    .body(Body::from(not_found_json().into_bytes()))
                    .unwrap()),
            }
        })
    }
}

/// Kubernetes-style 404 status body
pub fn not_found_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": "not found",
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

fn steve_object_value(resource_type: &str, name: &str, state: &str) -> serde_json::Value {
    serde_json::json!({
        "id": name,
        "type": resource_type,
        "links": {
            "self": format!("https://rancher.test/v1/{resource_type}/{name}")
        },
        "metadata": {
            "name": name,
            "state": {
                "error": false,
                "message": "",
                "name": state,
                "transitioning": false
            }
        }
    })
}

/// One object as the Steve API would serve it
pub fn steve_object_json(resource_type: &str, name: &str, state: &str) -> String {
    steve_object_value(resource_type, name, state).to_string()
}

/// One collection page as the Steve API would serve it. `next` becomes
/// the continuation URL of the page.
pub fn steve_page_json(resource_type: &str, names: &[&str], next: Option<&str>) -> String {
    let data: Vec<_> = names
        .iter()
        .map(|name| steve_object_value(resource_type, name, "active"))
        .collect();
    let mut pagination = serde_json::json!({"limit": 100});
    if let Some(next) = next {
        pagination["next"] = serde_json::json!(next);
    }
    serde_json::json!({
        "type": "collection",
        "links": {"self": format!("https://rancher.test/v1/{resource_type}")},
        "pagination": pagination,
        "data": data
    })
    .to_string()
}

/// A catalog app in the given state
pub fn app_json(name: &str, namespace: &str, state: &str) -> String {
    serde_json::json!({
        "id": format!("{namespace}/{name}"),
        "type": "catalog.cattle.io.app",
        "apiVersion": "catalog.cattle.io/v1",
        "kind": "App",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "state": {"error": false, "message": "", "name": state, "transitioning": false}
        },
        "spec": {
            "name": name,
            "namespace": namespace
        },
        "status": {
            "summary": {"state": state}
        }
    })
    .to_string()
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// A deployment with the given desired and available replica counts
pub fn deployment_json(name: &str, namespace: &str, replicas: i32, available: i32) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1",
            "uid": "test-uid"
        },
        "spec": {
            "replicas": replicas,
            "selector": {"matchLabels": {"app": name}},
            "template": {
                "metadata": {"labels": {"app": name}},
                "spec": {"containers": [{"name": name, "image": "ranchertest/mytestcontainer"}]}
            }
        },
        "status": {
            "replicas": replicas,
            "updatedReplicas": replicas,
            "readyReplicas": available,
            "availableReplicas": available
        }
    })
}

/// Watch response body: one JSON event per line
pub fn watch_events_body(events: &[(&str, serde_json::Value)]) -> String {
    events
        .iter()
        .map(|(kind, object)| {
            serde_json::json!({"type": kind, "object": object}).to_string() + "\n"
        })
        .collect()
}
