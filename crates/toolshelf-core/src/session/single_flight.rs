//! Single-flight wrapper around a [`TokenRefresher`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use crate::traits::{RefreshGrant, TokenRefresher};
use crate::{RefreshToken, Result};

type SharedRefresh = Shared<BoxFuture<'static, Result<RefreshGrant>>>;

/// Ensures at most one refresh request per refresh token is in flight.
///
/// Callers arriving while a refresh for the same token is pending await that
/// same operation and receive a clone of its result. Owned by one session
/// machine; there is no process-wide state.
pub struct SingleFlightRefresher {
    refresher: Arc<dyn TokenRefresher>,
    in_flight: Mutex<Option<(RefreshToken, SharedRefresh)>>,
}

impl SingleFlightRefresher {
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            refresher,
            in_flight: Mutex::new(None),
        }
    }

    /// Refresh, joining an in-flight request for the same token if there is one.
    pub async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant> {
        let operation = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some((token, pending)) if token == refresh_token && pending.peek().is_none() => {
                    debug!("Joining in-flight refresh");
                    pending.clone()
                }
                _ => {
                    let refresher = Arc::clone(&self.refresher);
                    let token = refresh_token.clone();
                    let pending = async move { refresher.refresh(&token).await }
                        .boxed()
                        .shared();
                    *slot = Some((refresh_token.clone(), pending.clone()));
                    pending
                }
            }
        };

        let result = operation.clone().await;

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot
            .as_ref()
            .is_some_and(|(_, pending)| pending.ptr_eq(&operation))
        {
            *slot = None;
        }

        result
    }

    /// Best-effort revocation, passed straight through.
    pub async fn revoke(&self, refresh_token: &RefreshToken) -> Result<()> {
        self.refresher.revoke(refresh_token).await
    }
}

impl fmt::Debug for SingleFlightRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let busy = self
            .in_flight
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("SingleFlightRefresher")
            .field("in_flight", &busy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessToken;
    use crate::error::AuthError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct GatedRefresher {
        calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl TokenRefresher for GatedRefresher {
        async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if refresh_token.as_str() == "bad" {
                return Err(AuthError::RefreshInvalid.into());
            }
            Ok(RefreshGrant {
                access_token: AccessToken::new(format!("access-{}", call)).unwrap(),
                refresh_token: None,
                user: None,
            })
        }
    }

    fn gated() -> Arc<GatedRefresher> {
        Arc::new(GatedRefresher {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        })
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_request() {
        let inner = gated();
        let single = SingleFlightRefresher::new(inner.clone());
        let token = RefreshToken::new("r1").unwrap();

        let first = single.refresh(&token);
        let second = single.refresh(&token);
        let release = async {
            tokio::task::yield_now().await;
            inner.gate.notify_one();
        };

        let (a, b, ()) = tokio::join!(first, second, release);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().access_token.as_str(), "access-0");
        assert_eq!(b.unwrap().access_token.as_str(), "access-0");
    }

    #[tokio::test]
    async fn failure_is_shared_and_slot_is_released() {
        let inner = gated();
        let single = SingleFlightRefresher::new(inner.clone());
        let bad = RefreshToken::new("bad").unwrap();

        inner.gate.notify_one();
        let err = single.refresh(&bad).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::RefreshInvalid);

        // A later call starts a fresh request.
        inner.gate.notify_one();
        assert!(single.refresh(&bad).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
