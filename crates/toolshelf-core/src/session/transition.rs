//! Synchronous transition core of the session machine.
//!
//! Every method runs to completion without awaiting. Remote work is requested
//! by returning an [`Effect`]; its outcome comes back as a [`Completion`].

use tracing::{debug, info, warn};

use crate::error::{Error, ProtocolError};
use crate::store::StoredTokens;
use crate::traits::{RefreshGrant, TokenStore, VerifyResponse};
use crate::types::UserRecord;
use crate::{AccessToken, RefreshToken};

use super::{AuthState, Session};

/// Remote work the shell must perform next.
#[derive(Debug)]
pub(crate) enum Effect {
    Verify(AccessToken),
    Refresh(RefreshToken),
    Done,
}

/// Outcome of an [`Effect`], delivered back to the core.
#[derive(Debug)]
pub(crate) enum Completion {
    VerifySucceeded(VerifyResponse),
    VerifyFailed(Error),
    RefreshSucceeded(RefreshGrant),
    RefreshFailed(Error),
}

/// Position inside a check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Verifying { after_refresh: bool },
    Refreshing,
}

/// Pick the refresh token to keep after the backend answered.
///
/// Precedence: the token at the response root, then the one embedded in the
/// user record, then the one we already had.
pub(crate) fn resolve_refresh_token(
    root: Option<RefreshToken>,
    user: Option<&UserRecord>,
    previous: Option<RefreshToken>,
) -> Option<RefreshToken> {
    root.or_else(|| user.and_then(|u| RefreshToken::from_optional(u.refresh_token.clone())))
        .or(previous)
}

#[derive(Debug)]
pub(crate) struct MachineCore {
    session: Session,
    epoch: u64,
    phase: Phase,
}

impl MachineCore {
    pub(crate) fn new(store: &dyn TokenStore) -> Self {
        let tokens = load_tokens(store);
        Self {
            session: Session::initial(tokens.access_token, tokens.refresh_token),
            epoch: 0,
            phase: Phase::Idle,
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Enter `checking` and start a new cycle.
    pub(crate) fn begin_check(&mut self, store: &dyn TokenStore) -> (u64, Effect) {
        self.epoch += 1;
        self.session.state = AuthState::Checking;
        self.session.is_authenticated = false;
        self.session.last_error = None;

        let tokens = load_tokens(store);
        self.session.access_token = tokens.access_token.clone();
        self.session.refresh_token = tokens.refresh_token;

        let Some(access_token) = tokens.access_token else {
            debug!("No stored access token");
            self.settle_unauthenticated(store, None);
            return (self.epoch, Effect::Done);
        };

        self.session.is_loading = true;
        self.phase = Phase::Verifying {
            after_refresh: false,
        };
        (self.epoch, Effect::Verify(access_token))
    }

    /// Apply the outcome of a remote call started in cycle `epoch`.
    pub(crate) fn complete(
        &mut self,
        store: &dyn TokenStore,
        epoch: u64,
        completion: Completion,
    ) -> Effect {
        if epoch != self.epoch || self.session.state != AuthState::Checking {
            debug!(
                epoch,
                current = self.epoch,
                state = %self.session.state,
                "Discarding stale completion"
            );
            return Effect::Done;
        }

        match (self.phase, completion) {
            (Phase::Verifying { .. }, Completion::VerifySucceeded(response)) => {
                self.store_user_data(store, response)
            }
            (Phase::Verifying { after_refresh }, Completion::VerifyFailed(err)) => {
                let refreshable = !after_refresh && err.is_refreshable();
                match self.session.refresh_token.clone().filter(|_| refreshable) {
                    Some(refresh_token) => {
                        info!("Access token rejected, refreshing");
                        self.phase = Phase::Refreshing;
                        Effect::Refresh(refresh_token)
                    }
                    None => {
                        warn!(error = %err, after_refresh, "Session check failed");
                        self.settle_unauthenticated(store, Some(&err));
                        Effect::Done
                    }
                }
            }
            (Phase::Refreshing, Completion::RefreshSucceeded(grant)) => {
                let refresh_token = resolve_refresh_token(
                    grant.refresh_token,
                    grant.user.as_ref(),
                    self.session.refresh_token.take(),
                );
                self.persist(store, Some(grant.access_token.clone()), refresh_token);
                self.phase = Phase::Verifying {
                    after_refresh: true,
                };
                debug!("Refreshed, verifying new access token");
                Effect::Verify(grant.access_token)
            }
            (Phase::Refreshing, Completion::RefreshFailed(err)) => {
                warn!(error = %err, "Token refresh failed");
                self.settle_unauthenticated(store, Some(&err));
                Effect::Done
            }
            (phase, completion) => {
                warn!(?phase, ?completion, "Completion does not match current phase");
                Effect::Done
            }
        }
    }

    /// Explicit login or registration.
    pub(crate) fn set_authenticated(
        &mut self,
        store: &dyn TokenStore,
        user: UserRecord,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) {
        if self.session.state == AuthState::Checking && self.phase != Phase::Idle {
            debug!("Login supersedes in-flight session check");
        }
        // Any in-flight check belongs to a previous cycle from here on.
        self.epoch += 1;

        // The held refresh token only carries over to the same user.
        let same_user = self.session.user_id() == Some(user.id.as_str());
        let previous = self.session.refresh_token.take().filter(|_| same_user);
        let refresh_token = resolve_refresh_token(refresh_token, Some(&user), previous);
        self.persist(store, Some(access_token), refresh_token);
        self.enter_authenticated(user);
    }

    /// Clear everything and re-enter `checking`.
    ///
    /// Returns the refresh token that was in use so the caller can revoke it.
    pub(crate) fn logout(&mut self, store: &dyn TokenStore) -> Option<RefreshToken> {
        let previous = self
            .session
            .refresh_token
            .take()
            .or_else(|| load_tokens(store).refresh_token);

        self.epoch += 1;
        clear_tokens(store);
        self.session = Session::initial(None, None);
        self.phase = Phase::Idle;
        info!("Logged out");
        previous
    }

    /// Adopt tokens from a refresh made outside a check cycle.
    ///
    /// Ignored unless the machine is still authenticated in cycle `epoch`.
    pub(crate) fn accept_refresh(
        &mut self,
        store: &dyn TokenStore,
        epoch: u64,
        grant: RefreshGrant,
    ) -> Option<AccessToken> {
        if epoch != self.epoch || self.session.state != AuthState::Authenticated {
            debug!("Discarding refresh for a session that has ended");
            return None;
        }

        let refresh_token = resolve_refresh_token(
            grant.refresh_token,
            grant.user.as_ref(),
            self.session.refresh_token.take(),
        );
        self.persist(store, Some(grant.access_token.clone()), refresh_token);
        if let Some(user) = grant.user {
            self.session.user = Some(user);
        }
        Some(grant.access_token)
    }

    /// End an authenticated session whose refresh token was rejected.
    pub(crate) fn expire(&mut self, store: &dyn TokenStore, epoch: u64, err: &Error) {
        if epoch == self.epoch && self.session.state == AuthState::Authenticated {
            self.epoch += 1;
            self.settle_unauthenticated(store, Some(err));
        }
    }

    // storeUserData
    fn store_user_data(&mut self, store: &dyn TokenStore, response: VerifyResponse) -> Effect {
        // Guard: only a response carrying a user is a valid session.
        let Some(user) = response.user else {
            let err = Error::Protocol(ProtocolError::malformed("session check returned no user"));
            warn!(error = %err, "Session check failed");
            self.settle_unauthenticated(store, Some(&err));
            return Effect::Done;
        };

        let access_token = response.access_token.or(self.session.access_token.take());
        let refresh_token = resolve_refresh_token(
            response.refresh_token,
            Some(&user),
            self.session.refresh_token.take(),
        );
        self.persist(store, access_token, refresh_token);
        self.enter_authenticated(user);
        Effect::Done
    }

    fn enter_authenticated(&mut self, user: UserRecord) {
        info!(user = %user.id, "Authenticated");
        self.session.user = Some(user);
        self.session.state = AuthState::Authenticated;
        self.session.is_authenticated = self.session.access_token.is_some();
        self.session.is_loading = false;
        self.session.last_error = None;
        self.phase = Phase::Idle;
    }

    fn settle_unauthenticated(&mut self, store: &dyn TokenStore, err: Option<&Error>) {
        clear_tokens(store);
        self.session = Session::anonymous(err.map(Error::kind));
        self.phase = Phase::Idle;
        debug!("Unauthenticated");
    }

    fn persist(
        &mut self,
        store: &dyn TokenStore,
        access_token: Option<AccessToken>,
        refresh_token: Option<RefreshToken>,
    ) {
        let tokens = StoredTokens {
            access_token,
            refresh_token,
        };
        if let Err(e) = tokens.save(store) {
            warn!(error = %e, "Failed to persist tokens");
        }
        self.session.access_token = tokens.access_token;
        self.session.refresh_token = tokens.refresh_token;
    }
}

// An unreadable store counts as an empty one.
fn load_tokens(store: &dyn TokenStore) -> StoredTokens {
    StoredTokens::load(store).unwrap_or_else(|e| {
        warn!(error = %e, "Token store unavailable, treating as signed out");
        StoredTokens::default()
    })
}

fn clear_tokens(store: &dyn TokenStore) {
    if let Err(e) = StoredTokens::clear(store) {
        warn!(error = %e, "Failed to clear stored tokens");
    }
}
