//! Async shell of the session machine.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::error::AuthError;
use crate::traits::{SessionVerifier, TokenRefresher, TokenStore};
use crate::{AccessToken, Result};

use super::single_flight::SingleFlightRefresher;
use super::transition::{Completion, Effect, MachineCore};
use super::{AuthEvent, AuthState, Session};

/// Coordinates session checking, token refresh and explicit login/logout.
///
/// Cheap to clone; clones share the same session. State is published on a
/// [`watch`] channel after every transition, so dependents observe the
/// machine without it knowing about them.
///
/// A check cycle makes at most two verify calls and one refresh call. Results
/// that arrive after the cycle was superseded (by a logout, a login, or a new
/// check) are dropped.
#[derive(Clone)]
pub struct AuthSessionMachine {
    inner: Arc<MachineInner>,
}

struct MachineInner {
    store: Arc<dyn TokenStore>,
    verifier: Arc<dyn SessionVerifier>,
    refresher: SingleFlightRefresher,
    core: Mutex<MachineCore>,
    sessions: watch::Sender<Session>,
}

impl AuthSessionMachine {
    /// Create a machine in the `checking` state with tokens read from `store`.
    ///
    /// Nothing is verified until [`start`](Self::start) is called.
    pub fn new(
        store: Arc<dyn TokenStore>,
        verifier: Arc<dyn SessionVerifier>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let core = MachineCore::new(store.as_ref());
        let (sessions, _) = watch::channel(core.session().clone());

        Self {
            inner: Arc::new(MachineInner {
                store,
                verifier,
                refresher: SingleFlightRefresher::new(refresher),
                core: Mutex::new(core),
                sessions,
            }),
        }
    }

    /// Run the boot-time session check.
    pub async fn start(&self) -> AuthState {
        self.check().await
    }

    /// Enter `checking` and verify the stored access token.
    ///
    /// Returns the state the machine is in once this cycle is over, which may
    /// differ from this cycle's own outcome if it was superseded.
    #[instrument(skip(self))]
    pub async fn check(&self) -> AuthState {
        let (epoch, effect) = self.update(|core, store| core.begin_check(store));
        self.drive(epoch, effect).await;
        self.state()
    }

    /// Deliver an event. Events are applied in the order they are sent.
    pub async fn send(&self, event: AuthEvent) {
        match event {
            AuthEvent::Logout => self.logout().await,
            AuthEvent::SetAuthenticated {
                user,
                access_token,
                refresh_token,
            } => {
                self.update(|core, store| {
                    core.set_authenticated(store, user, access_token, refresh_token)
                });
            }
        }
    }

    /// Clear all tokens locally, settle in `unauthenticated`, then revoke the
    /// old refresh token on the backend.
    ///
    /// Safe to call in any state and any number of times.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let (revoked, (epoch, effect)) = self.update(|core, store| {
            let revoked = core.logout(store);
            (revoked, core.begin_check(store))
        });
        self.drive(epoch, effect).await;

        if let Some(refresh_token) = revoked
            && let Err(e) = self.inner.refresher.revoke(&refresh_token).await
        {
            warn!(error = %e, "Backend logout failed; local session already cleared");
        }
    }

    /// Obtain a new access token for an authenticated session.
    ///
    /// Shares any refresh already in flight for the same refresh token. A
    /// rejected refresh token ends the session.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<AccessToken> {
        let (epoch, refresh_token) = {
            let core = self.lock();
            (core.epoch(), core.session().refresh_token.clone())
        };
        let refresh_token = refresh_token.ok_or(AuthError::RefreshInvalid)?;

        match self.inner.refresher.refresh(&refresh_token).await {
            Ok(grant) => self
                .update(|core, store| core.accept_refresh(store, epoch, grant))
                .ok_or_else(|| AuthError::RefreshInvalid.into()),
            Err(e) => {
                if e.kind() == crate::ErrorKind::RefreshInvalid {
                    self.update(|core, store| core.expire(store, epoch, &e));
                }
                Err(e)
            }
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.inner.sessions.borrow().clone()
    }

    pub fn state(&self) -> AuthState {
        self.inner.sessions.borrow().state
    }

    /// Subscribe to session snapshots, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.sessions.subscribe()
    }

    /// The store this machine persists tokens to.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    async fn drive(&self, epoch: u64, mut effect: Effect) {
        loop {
            let completion = match effect {
                Effect::Done => return,
                Effect::Verify(access_token) => {
                    debug!(epoch, "Verifying session");
                    match self.inner.verifier.verify(&access_token).await {
                        Ok(response) => Completion::VerifySucceeded(response),
                        Err(e) => Completion::VerifyFailed(e),
                    }
                }
                Effect::Refresh(refresh_token) => {
                    debug!(epoch, "Refreshing access token");
                    match self.inner.refresher.refresh(&refresh_token).await {
                        Ok(grant) => Completion::RefreshSucceeded(grant),
                        Err(e) => Completion::RefreshFailed(e),
                    }
                }
            };

            effect = self.update(|core, store| core.complete(store, epoch, completion));
        }
    }

    /// Run one synchronous transition and publish the resulting session.
    fn update<T>(&self, f: impl FnOnce(&mut MachineCore, &dyn TokenStore) -> T) -> T {
        let mut core = self.lock();
        let result = f(&mut *core, self.inner.store.as_ref());
        self.inner.sessions.send_if_modified(|current| {
            if *current != *core.session() {
                *current = core.session().clone();
                true
            } else {
                false
            }
        });
        result
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MachineCore> {
        self.inner.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AuthSessionMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSessionMachine")
            .field("state", &self.state())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
