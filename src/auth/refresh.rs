//! Single-flight access token refresh.
//!
//! [`RefreshCoordinator`] guarantees at most one outstanding refresh call.
//! The first caller to see an expired session becomes the flight; every
//! caller that arrives while it is in the air joins a FIFO waiter queue and
//! receives the same outcome.
//!
//! ```text
//!          ensure_fresh_credential()
//!   Idle ───────────────────────────▶ Refreshing { waiters }
//!    ▲                                     │
//!    │     Resolved(token) / Failed(err)   │
//!    └─────────────────────────────────────┘
//! ```
//!
//! On failure the coordinator purges the stored credential and the whole
//! response cache. It never navigates; callers decide what a rejected
//! session means for them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::credential::{CredentialStore, StoredCredential};
use crate::cache::CacheStore;
use crate::telemetry;
use crate::{Result, SatchelError};

/// Performs the refresh network call.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Obtain a new access token from the server.
    async fn refresh(&self) -> Result<String>;
}

type Waiter = oneshot::Sender<Result<String>>;

/// Coordinator state. Waiters exist only while refreshing.
#[derive(Debug, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing { waiters: VecDeque<Waiter> },
}

/// How a refresh cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Resolved(String),
    Failed(SatchelError),
}

impl RefreshOutcome {
    pub fn into_result(self) -> Result<String> {
        match self {
            RefreshOutcome::Resolved(token) => Ok(token),
            RefreshOutcome::Failed(err) => Err(err),
        }
    }
}

/// Process-wide refresh coordinator, owned by the gateway.
pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<CacheStore>,
    state: Mutex<RefreshState>,
    /// Completed cycles; bumped under the state lock when a flight lands.
    landings: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        credentials: Arc<dyn CredentialStore>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            refresher,
            credentials,
            cache,
            state: Mutex::new(RefreshState::Idle),
            landings: AtomicU64::new(0),
        }
    }

    /// Return a token the server has not yet rejected, refreshing if needed.
    ///
    /// `rejected` is the token the caller's request was refused with
    /// (`None` if it carried none). If the store already holds a different
    /// token, a previous cycle has landed since that request went out and
    /// the stored token is returned without a new refresh.
    ///
    /// Otherwise, if no refresh is in flight this call starts one; if one
    /// is in flight, the call waits for it and shares its outcome.
    ///
    /// The credential store is read outside the state lock, so a slow
    /// store never blocks other callers.
    pub async fn ensure_fresh_credential(&self, rejected: Option<&str>) -> Result<String> {
        let waiter = loop {
            let seen = self.landings.load(Ordering::Acquire);
            let current = self.credentials.access_token();

            let mut state = self.lock_state();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push_back(tx);
                    metrics::counter!(telemetry::REFRESH_WAITERS_TOTAL).increment(1);
                    debug!(waiters = waiters.len(), "joined in-flight token refresh");
                    break Some(rx);
                }
                // A cycle landed after `current` was read: read again.
                RefreshState::Idle if self.landings.load(Ordering::Acquire) != seen => continue,
                RefreshState::Idle => {
                    if let Some(current) = current {
                        if rejected != Some(current.as_str()) {
                            return Ok(current);
                        }
                    }
                    *state = RefreshState::Refreshing {
                        waiters: VecDeque::new(),
                    };
                    break None;
                }
            }
        };

        match waiter {
            Some(rx) => rx.await.unwrap_or(Err(SatchelError::RefreshAbandoned)),
            None => self.fly().await,
        }
    }

    /// Whether a refresh call is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Number of callers waiting on the in-flight refresh.
    pub fn pending_waiters(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Run the refresh call as the single flight and fan out its outcome.
    async fn fly(&self) -> Result<String> {
        let flight = Flight {
            state: &self.state,
            landings: &self.landings,
            landed: false,
        };

        let outcome = match self.refresher.refresh().await {
            Ok(token) => match self.credentials.save(&StoredCredential::issued_now(&token)) {
                Ok(()) => RefreshOutcome::Resolved(token),
                Err(e) => RefreshOutcome::Failed(e),
            },
            Err(e) => RefreshOutcome::Failed(e),
        };

        match &outcome {
            RefreshOutcome::Resolved(_) => {
                metrics::counter!(telemetry::REFRESH_TOTAL, "status" => "ok").increment(1);
            }
            RefreshOutcome::Failed(err) => {
                metrics::counter!(telemetry::REFRESH_TOTAL, "status" => "error").increment(1);
                warn!(error = %err, "token refresh failed, clearing session");
                self.purge_session();
            }
        }

        let waiters = flight.land();
        if matches!(outcome, RefreshOutcome::Resolved(_)) {
            info!(waiters = waiters.len(), "access token refreshed");
        }
        let result = outcome.into_result();
        for waiter in waiters {
            // A waiter whose request was dropped no longer listens.
            let _ = waiter.send(result.clone());
        }
        result
    }

    fn purge_session(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear stored credential");
        }
        self.cache.clear();
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        lock(&self.state)
    }
}

// The state is replaced wholesale on every transition, so a poisoned lock
// still holds a coherent value.
fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_waiters(state: &Mutex<RefreshState>, landings: &AtomicU64) -> VecDeque<Waiter> {
    let mut guard = lock(state);
    landings.fetch_add(1, Ordering::Release);
    match std::mem::take(&mut *guard) {
        RefreshState::Refreshing { waiters } => waiters,
        RefreshState::Idle => VecDeque::new(),
    }
}

/// Marks the coordinator as refreshing for as long as the flight lives.
///
/// Dropped without landing (the leading request was cancelled), it returns
/// the coordinator to idle and drops every waiter, which then sees
/// [`SatchelError::RefreshAbandoned`].
struct Flight<'a> {
    state: &'a Mutex<RefreshState>,
    landings: &'a AtomicU64,
    landed: bool,
}

impl Flight<'_> {
    /// Back to idle, handing over the waiters in subscription order.
    fn land(mut self) -> VecDeque<Waiter> {
        self.landed = true;
        take_waiters(self.state, self.landings)
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.landed {
            let abandoned = take_waiters(self.state, self.landings);
            warn!(waiters = abandoned.len(), "token refresh abandoned");
        }
    }
}
