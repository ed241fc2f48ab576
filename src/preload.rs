//! Best-effort cache warming.
//!
//! [`PreloadQueue`] speculatively fetches responses the application is
//! likely to need soon (the current user, the test list) so that the
//! foreground request is a cache hit. Tasks run one at a time on a single
//! background processor to avoid competing with foreground requests for
//! bandwidth.
//!
//! Preloading is a pure optimisation: every outcome, including panics, is
//! absorbed by [`fire_and_forget()`] and never reaches the code that
//! enqueued the task.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::endpoints::catalog::{GET_CURRENT_USER, LIST_TESTS};
use crate::gateway::{FetchGateway, RequestOptions};
use crate::telemetry;
use crate::Result;

/// Default maximum number of queued tasks.
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Configuration for the preload queue.
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Tasks beyond this many are dropped. Default: 256.
    pub max_pending: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl PreloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of queued tasks.
    pub fn max_pending(mut self, n: usize) -> Self {
        self.max_pending = n;
        self
    }
}

/// A request whose response should be warmed into the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadTask {
    pub path: String,
    pub options: RequestOptions,
}

/// What [`PreloadQueue::enqueue()`] did with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Appended; the processor will pick it up.
    Queued,
    /// A fresh cache entry already exists, nothing to do.
    AlreadyCached,
    /// Queue full or no runtime to process it.
    Dropped,
}

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<PreloadTask>,
    draining: bool,
}

struct Shared {
    gateway: FetchGateway,
    config: PreloadConfig,
    state: Mutex<QueueState>,
    idle: Notify,
}

/// FIFO of cache-warming requests with a single sequential processor.
///
/// Cheap to clone; clones share the queue.
#[derive(Clone)]
pub struct PreloadQueue {
    shared: Arc<Shared>,
}

impl PreloadQueue {
    pub fn new(gateway: FetchGateway, config: PreloadConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                gateway,
                config,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue a GET-style warm-up of `path` unless it is already cached.
    ///
    /// Processing starts on the next tick of the current tokio runtime.
    /// Enqueueing while the processor runs extends the current run.
    pub fn enqueue(&self, path: impl Into<String>, options: RequestOptions) -> Enqueued {
        let path = path.into();
        let gateway = &self.shared.gateway;

        let key = gateway.cache_key_for(&path, &options);
        if gateway.cache().contains_fresh(&key) {
            metrics::counter!(telemetry::PRELOAD_TOTAL, "status" => "skipped").increment(1);
            return Enqueued::AlreadyCached;
        }

        let Ok(runtime) = Handle::try_current() else {
            metrics::counter!(telemetry::PRELOAD_TOTAL, "status" => "dropped").increment(1);
            warn!(%path, "no async runtime, preload dropped");
            return Enqueued::Dropped;
        };

        let start = {
            let mut state = self.lock_state();
            if state.tasks.len() >= self.shared.config.max_pending {
                metrics::counter!(telemetry::PRELOAD_TOTAL, "status" => "dropped").increment(1);
                warn!(%path, max_pending = self.shared.config.max_pending, "preload queue full, task dropped");
                return Enqueued::Dropped;
            }
            state.tasks.push_back(PreloadTask { path, options });
            !std::mem::replace(&mut state.draining, true)
        };

        if start {
            let queue = self.clone();
            runtime.spawn(async move {
                tokio::task::yield_now().await;
                queue.drain().await;
            });
        }
        Enqueued::Queued
    }

    /// Warm the responses every screen needs at startup.
    pub fn warm_defaults(&self) {
        for endpoint in [&GET_CURRENT_USER, &LIST_TESTS] {
            self.enqueue(endpoint.path, RequestOptions::new(endpoint.method.clone()));
        }
    }

    /// Tasks not yet picked up by the processor.
    pub fn pending(&self) -> usize {
        self.lock_state().tasks.len()
    }

    /// Whether the queue is empty and the processor has stopped.
    pub fn is_idle(&self) -> bool {
        let state = self.lock_state();
        !state.draining && state.tasks.is_empty()
    }

    /// Resolve once the processor has drained the queue.
    pub async fn wait_idle(&self) {
        loop {
            let mut notified = std::pin::pin!(self.shared.idle.notified());
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    async fn drain(&self) {
        loop {
            let task = {
                let mut state = self.lock_state();
                match state.tasks.pop_front() {
                    Some(task) => task,
                    None => {
                        state.draining = false;
                        break;
                    }
                }
            };
            let request = self
                .shared
                .gateway
                .request(&task.path, &task.options, false);
            fire_and_forget(&task.path, request).await;
        }
        self.shared.idle.notify_waiters();
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Await `fut` and discard its outcome.
///
/// Errors and panics are logged at debug/warn level and counted, never
/// propagated. Used for work whose only purpose is a side effect the
/// caller can live without.
pub async fn fire_and_forget<T, F>(label: &str, fut: F)
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(_)) => {
            metrics::counter!(telemetry::PRELOAD_TOTAL, "status" => "ok").increment(1);
            debug!(label, "preloaded");
        }
        Ok(Err(e)) => {
            metrics::counter!(telemetry::PRELOAD_TOTAL, "status" => "error").increment(1);
            debug!(label, error = %e, "preload failed, ignored");
        }
        Err(_) => {
            metrics::counter!(telemetry::PRELOAD_TOTAL, "status" => "error").increment(1);
            warn!(label, "preload panicked, ignored");
        }
    }
}
