//! Single-flight token refresh.
//!
//! When several requests see a 401 at the same time only one of them may
//! call the refresh endpoint. The first caller becomes the leader and gets a
//! [`RefreshLease`]; everyone after it gets a [`RefreshWaiter`] that resolves
//! to whatever the leader settles with. Waiters are released in arrival order.

use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use praxia_core::error::AuthError;
use praxia_core::{AccessToken, Error, Result};

const ABANDONED: &str = "token refresh was abandoned";

type Outcome = Result<AccessToken>;

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<Outcome>>,
    },
}

/// Coordinates access-token refreshes so at most one is in flight.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Result of [`RefreshCoordinator::acquire_or_wait`].
#[derive(Debug)]
pub enum Acquire<'a> {
    /// The caller must perform the refresh and settle the lease.
    Lead(RefreshLease<'a>),
    /// A refresh is already running; wait for its outcome.
    Wait(RefreshWaiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the refresh leader, or queue behind the one in flight.
    ///
    /// The state lock is released before this returns, so callers never
    /// hold it across an await.
    pub fn acquire_or_wait(&self) -> Acquire<'_> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            trace!(queued = waiters.len(), "Waiting on in-flight token refresh");
            return Acquire::Wait(RefreshWaiter { rx });
        }

        *state = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        debug!("Starting token refresh");
        Acquire::Lead(RefreshLease {
            coordinator: self,
            settled: false,
        })
    }

    /// Returns true while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(
            *self
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            RefreshState::Refreshing { .. }
        )
    }

    /// Number of callers queued behind the current refresh.
    pub fn pending(&self) -> usize {
        match &*self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
        {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    fn settle(&self, outcome: &Outcome) {
        let previous = std::mem::take(
            &mut *self
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        if let RefreshState::Refreshing { waiters } = previous {
            debug!(
                waiters = waiters.len(),
                success = outcome.is_ok(),
                "Token refresh settled"
            );
            for waiter in waiters {
                // A waiter whose request was dropped no longer cares.
                let _ = waiter.send(outcome.clone());
            }
        }
    }
}

/// Held by the single caller performing a refresh.
///
/// Dropping the lease without settling it releases every waiter with an
/// authentication failure, so a cancelled leader cannot strand them.
#[derive(Debug)]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Publish the refresh outcome to every waiter and return it.
    pub fn settle(mut self, outcome: Outcome) -> Outcome {
        self.settled = true;
        self.coordinator.settle(&outcome);
        outcome
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator
                .settle(&Err(Error::from(AuthError::expired(ABANDONED))));
        }
    }
}

/// Handle for a caller queued behind an in-flight refresh.
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<Outcome>,
}

impl RefreshWaiter {
    /// Wait for the leader's outcome.
    pub async fn wait(self) -> Outcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::expired(ABANDONED).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(coordinator: &RefreshCoordinator) -> RefreshLease<'_> {
        match coordinator.acquire_or_wait() {
            Acquire::Lead(lease) => lease,
            Acquire::Wait(_) => panic!("expected to lead"),
        }
    }

    fn wait(coordinator: &RefreshCoordinator) -> RefreshWaiter {
        match coordinator.acquire_or_wait() {
            Acquire::Wait(waiter) => waiter,
            Acquire::Lead(_) => panic!("expected to wait"),
        }
    }

    #[tokio::test]
    async fn waiters_receive_the_leaders_token() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(&coordinator);
        let waiters: Vec<_> = (0..4).map(|_| wait(&coordinator)).collect();

        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 4);

        let token = lease.settle(Ok(AccessToken::new("fresh"))).unwrap();
        assert_eq!(token.as_str(), "fresh");
        assert!(!coordinator.is_refreshing());

        for waiter in waiters {
            assert_eq!(waiter.wait().await.unwrap().as_str(), "fresh");
        }
    }

    #[tokio::test]
    async fn failure_is_broadcast() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(&coordinator);
        let first = wait(&coordinator);
        let second = wait(&coordinator);

        let _ = lease.settle(Err(AuthError::expired("refresh rejected").into()));

        for waiter in [first, second] {
            let err = waiter.wait().await.unwrap_err();
            assert!(err.is_auth_expired());
            assert!(err.to_string().contains("refresh rejected"));
        }
    }

    #[tokio::test]
    async fn dropped_lease_releases_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(&coordinator);
        let waiter = wait(&coordinator);

        drop(lease);

        let err = waiter.wait().await.unwrap_err();
        assert!(err.is_auth_expired());
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn next_expiry_starts_a_new_refresh() {
        let coordinator = RefreshCoordinator::new();
        let _ = lead(&coordinator).settle(Ok(AccessToken::new("one")));

        let lease = lead(&coordinator);
        let _ = lease.settle(Ok(AccessToken::new("two")));
        assert_eq!(coordinator.pending(), 0);
    }
}
