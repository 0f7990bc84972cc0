// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch-based condition waiting.
//!
//! [`watch_wait`] drains one watch subscription and hands every event to
//! a check function, in arrival order, each event exactly once. The
//! server expires watches after a fixed window, so [`watch_wait_within`]
//! wraps it with resubscription up to an overall deadline. Conditions
//! that outlive a single watch only surface [`RodeoError::WatchTimeout`]
//! once the deadline is spent.

use futures::stream::BoxStream;
use futures::{Future, Stream, StreamExt};
use kube::api::{Api, WatchEvent, WatchParams};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, RodeoError};

/// Waits until `check` reports a watch event as ready.
///
/// Events reach `check` in stream order. A `true` return resolves the
/// wait; an error return aborts it. An error event that `check` did not
/// already resolve aborts the wait as well, so conditions that expect
/// an error event must claim it themselves. Stream exhaustion without a
/// decision is reported as [`RodeoError::WatchTimeout`]. The
/// subscription is dropped on every exit path.
pub async fn watch_wait<K, S, F>(mut events: S, mut check: F) -> Result<()>
where
    S: Stream<Item = kube::Result<WatchEvent<K>>> + Unpin,
    F: FnMut(&WatchEvent<K>) -> Result<bool>,
{
    while let Some(event) = events.next().await {
        let event = event?;
        if check(&event)? {
            return Ok(());
        }
        if let WatchEvent::Error(err) = &event {
            warn!("Watch delivered an error event: {}", err.message);
            return Err(RodeoError::WatchEventError(format!(
                "{} (code {})",
                err.message, err.code
            )));
        }
    }
    Err(RodeoError::WatchTimeout)
}

/// Runs [`watch_wait`] against fresh subscriptions until the condition
/// resolves or `deadline` has passed.
///
/// `subscribe` is called for the initial subscription and once more
/// every time a watch expires undecided within the deadline. Any other
/// outcome ends the wait immediately.
pub async fn watch_wait_within<K, S, Fut, Sub, F>(
    deadline: Duration,
    mut subscribe: Sub,
    mut check: F,
) -> Result<()>
where
    S: Stream<Item = kube::Result<WatchEvent<K>>> + Unpin,
    Fut: Future<Output = Result<S>>,
    Sub: FnMut() -> Fut,
    F: FnMut(&WatchEvent<K>) -> Result<bool>,
{
    let started = Instant::now();
    loop {
        let events = subscribe().await?;
        match watch_wait(events, &mut check).await {
            Err(RodeoError::WatchTimeout) if started.elapsed() < deadline => {
                debug!("Watch expired without a decision, resubscribing");
            }
            outcome => return outcome,
        }
    }
}

/// Subscribes to watch events for a single named resource
pub async fn subscribe_named<K>(
    api: Api<K>,
    name: &str,
    timeout_secs: u32,
) -> Result<BoxStream<'static, kube::Result<WatchEvent<K>>>>
where
    K: Clone + DeserializeOwned + Debug + Send + 'static,
{
    let params = WatchParams::default()
        .fields(&format!("metadata.name={}", name))
        .timeout(timeout_secs);
    Ok(api.watch(&params, "").await?.boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::app::App;
    use futures::stream;
    use kube::core::ErrorResponse;
    use std::cell::Cell;

    fn app(state: &str) -> App {
        serde_json::from_value(serde_json::json!({
            "metadata": {"name": "rancher-logging", "namespace": "cattle-logging-system"},
            "spec": {},
            "status": {"summary": {"state": state}}
        }))
        .unwrap()
    }

    fn error_event() -> WatchEvent<App> {
        WatchEvent::Error(ErrorResponse {
            status: "Failure".to_string(),
            message: "too old resource version".to_string(),
            reason: "Expired".to_string(),
            code: 410,
        })
    }

    fn deployed(event: &WatchEvent<App>) -> Result<bool> {
        match event {
            WatchEvent::Added(app) | WatchEvent::Modified(app) => Ok(app.is_deployed()),
            _ => Ok(false),
        }
    }

    #[tokio::test]
    async fn test_watch_wait_resolves_on_ready_event() {
        let events = stream::iter(vec![
            Ok(WatchEvent::Added(app("pending-install"))),
            Ok(WatchEvent::Modified(app("deployed"))),
            Ok(WatchEvent::Modified(app("deployed"))),
        ]);

        let seen = Cell::new(0);
        let result = watch_wait(events, |event| {
            seen.set(seen.get() + 1);
            deployed(event)
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(seen.get(), 2, "must stop at the first ready event");
    }

    #[tokio::test]
    async fn test_watch_wait_propagates_check_errors() {
        let events = stream::iter(vec![
            Ok(WatchEvent::Added(app("pending-install"))),
            Ok(WatchEvent::Modified(app("failed"))),
            Ok(WatchEvent::Modified(app("deployed"))),
        ]);

        let seen = Cell::new(0);
        let result = watch_wait(events, |event| {
            seen.set(seen.get() + 1);
            match event {
                WatchEvent::Modified(app) if app.state() == Some("failed") => Err(
                    RodeoError::ConfigError("release entered failed state".to_string()),
                ),
                other => deployed(other),
            }
        })
        .await;

        assert!(matches!(result, Err(RodeoError::ConfigError(_))));
        assert_eq!(seen.get(), 2, "events after the error must not be seen");
    }

    #[tokio::test]
    async fn test_watch_wait_fails_on_unclaimed_error_event() {
        let events = stream::iter(vec![
            Ok(WatchEvent::Added(app("pending-install"))),
            Ok(error_event()),
            Ok(WatchEvent::Modified(app("deployed"))),
        ]);

        let seen = Cell::new(0);
        let result = watch_wait(events, |event| {
            seen.set(seen.get() + 1);
            deployed(event)
        })
        .await;

        match result {
            Err(RodeoError::WatchEventError(msg)) => {
                assert!(msg.contains("too old resource version"));
                assert!(msg.contains("410"));
            }
            other => panic!("expected WatchEventError, got {:?}", other),
        }
        assert_eq!(seen.get(), 2);
    }

    #[tokio::test]
    async fn test_watch_wait_lets_check_claim_error_events() {
        let events = stream::iter(vec![
            Ok(WatchEvent::Added(app("pending-install"))),
            Ok(error_event()),
        ]);

        let result = watch_wait(events, |event| {
            Ok(matches!(event, WatchEvent::Error(_)))
        })
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_watch_wait_times_out_on_exhausted_stream() {
        let events = stream::iter(vec![
            Ok(WatchEvent::Added(app("pending-install"))),
            Ok(WatchEvent::Modified(app("pending-install"))),
        ]);

        let result = watch_wait(events, deployed).await;
        assert!(matches!(result, Err(RodeoError::WatchTimeout)));
    }

    #[tokio::test]
    async fn test_watch_wait_times_out_on_empty_stream() {
        let events = stream::iter(Vec::<kube::Result<WatchEvent<App>>>::new());

        let seen = Cell::new(0);
        let result = watch_wait(events, |_| {
            seen.set(seen.get() + 1);
            Ok(true)
        })
        .await;

        assert!(matches!(result, Err(RodeoError::WatchTimeout)));
        assert_eq!(seen.get(), 0);
    }

    #[tokio::test]
    async fn test_watch_wait_propagates_transport_errors() {
        let events = stream::iter(vec![
            Ok(WatchEvent::Added(app("pending-install"))),
            Err(kube::Error::LinesCodecMaxLineLengthExceeded),
        ]);

        let result = watch_wait(events, deployed).await;
        assert!(matches!(result, Err(RodeoError::KubeError(_))));
    }

    #[tokio::test]
    async fn test_watch_wait_within_resubscribes_after_expiry() {
        let attempts = Cell::new(0usize);
        let result = watch_wait_within(
            Duration::from_secs(30),
            || {
                attempts.set(attempts.get() + 1);
                let events = if attempts.get() == 1 {
                    vec![]
                } else {
                    vec![Ok(WatchEvent::Modified(app("deployed")))]
                };
                std::future::ready(Ok(stream::iter(events)))
            },
            deployed,
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test]
    async fn test_watch_wait_within_stops_at_deadline() {
        let attempts = Cell::new(0usize);
        let result = watch_wait_within(
            Duration::ZERO,
            || {
                attempts.set(attempts.get() + 1);
                std::future::ready(Ok(stream::iter(
                    Vec::<kube::Result<WatchEvent<App>>>::new(),
                )))
            },
            deployed,
        )
        .await;

        assert!(matches!(result, Err(RodeoError::WatchTimeout)));
        assert_eq!(attempts.get(), 1, "a spent deadline still gets one watch");
    }

    #[tokio::test]
    async fn test_watch_wait_within_does_not_retry_other_errors() {
        let attempts = Cell::new(0usize);
        let result = watch_wait_within(
            Duration::from_secs(30),
            || {
                attempts.set(attempts.get() + 1);
                std::future::ready(Ok(stream::iter(vec![Ok(error_event())])))
            },
            deployed,
        )
        .await;

        assert!(matches!(result, Err(RodeoError::WatchEventError(_))));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_watch_wait_within_propagates_subscribe_errors() {
        let result = watch_wait_within(
            Duration::from_secs(30),
            || {
                std::future::ready(Err::<stream::Iter<std::vec::IntoIter<kube::Result<WatchEvent<App>>>>, _>(
                    RodeoError::ClusterNotFound("shire".to_string()),
                ))
            },
            deployed,
        )
        .await;

        assert!(matches!(result, Err(RodeoError::ClusterNotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_waits_are_independent() {
        let first = watch_wait(
            stream::iter(vec![Ok(WatchEvent::Added(app("deployed")))]),
            deployed,
        );
        let second = watch_wait(
            stream::iter(vec![
                Ok(WatchEvent::Added(app("pending-install"))),
                Ok(WatchEvent::Modified(app("deployed"))),
            ]),
            deployed,
        );

        let (a, b) = tokio::join!(first, second);
        assert!(a.is_ok());
        assert!(b.is_ok());
    }
}
