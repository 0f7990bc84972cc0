// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::Result;

type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// Tracks teardown steps for resources created during a test run.
///
/// Steps run in reverse registration order so that dependents are removed
/// before the resources they depend on. Helpers register their own cleanup
/// before creating anything, which keeps a half-finished create from
/// leaking.
pub struct Session {
    cleanup_enabled: bool,
    queue: Mutex<Vec<CleanupFn>>,
}

impl Session {
    pub fn new(cleanup_enabled: bool) -> Arc<Self> {
        Arc::new(Session {
            cleanup_enabled,
            queue: Mutex::new(Vec::new()),
        })
    }

    /// Registers a teardown step. Registration is always recorded; whether
    /// the steps run is decided at cleanup time.
    pub fn register_cleanup<F, Fut>(&self, cleanup: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(move || cleanup().boxed()));
    }

    /// Runs all registered teardown steps, newest first. Failures are
    /// logged and do not stop the remaining steps.
    pub async fn cleanup(&self) {
        if !self.cleanup_enabled {
            debug!("Cleanup disabled, leaving test resources in place");
            return;
        }
        loop {
            let step = self
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop();
            match step {
                Some(step) => {
                    if let Err(err) = step().await {
                        warn!("Cleanup step failed: {}", err);
                    }
                }
                None => break,
            }
        }
    }

    pub fn pending_cleanups(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_runs_in_reverse_order() {
        let session = Session::new(true);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            session.register_cleanup(move || async move {
                order.lock().unwrap().push(i);
                Ok(())
            });
        }

        session.cleanup().await;
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(session.pending_cleanups(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_continues_after_failure() {
        let session = Session::new(true);
        let order = Arc::new(Mutex::new(Vec::new()));

        {
            let order = order.clone();
            session.register_cleanup(move || async move {
                order.lock().unwrap().push("first");
                Ok(())
            });
        }
        session.register_cleanup(|| async {
            Err(crate::error::RodeoError::WatchTimeout)
        });

        session.cleanup().await;
        assert_eq!(*order.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_cleanup_disabled_keeps_queue() {
        let session = Session::new(false);
        session.register_cleanup(|| async { Ok(()) });

        session.cleanup().await;
        assert_eq!(session.pending_cleanups(), 1);
    }
}
