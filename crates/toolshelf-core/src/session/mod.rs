//! Authentication session lifecycle.
//!
//! [`AuthSessionMachine`] moves between three states:
//!
//! ```text
//!            start / LOGOUT
//!                 │
//!                 ▼
//!   ┌────────── checking ──────────┐
//!   │ verify ok   │ 401 → refresh  │ no token / failure
//!   ▼             │  → verify once ▼
//! authenticated ◄─┘          unauthenticated
//!   ▲                              │
//!   └──────── SET_AUTHENTICATED ───┘
//! ```
//!
//! State changes are made synchronously by the transition core while holding
//! a lock that is never held across an `.await`; remote calls are performed by
//! the machine shell, and their completions are fed back tagged with the
//! check cycle (epoch) that started them so late results can be dropped.

mod machine;
mod single_flight;
mod transition;

pub use machine::AuthSessionMachine;
pub use single_flight::SingleFlightRefresher;

use std::fmt;

use crate::error::ErrorKind;
use crate::types::UserRecord;
use crate::{AccessToken, RefreshToken};

/// State of the authentication machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    /// Initial state; stored tokens are being verified.
    Checking,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Checking => write!(f, "checking"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

/// Snapshot of the running client's authentication.
///
/// `is_authenticated` implies both `user` and `access_token` are present.
/// `is_loading` is only set while a verify or refresh call is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: AuthState,
    pub user: Option<UserRecord>,
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<ErrorKind>,
}

impl Session {
    /// The not-yet-checked session a process starts with.
    pub(crate) fn initial(
        access_token: Option<AccessToken>,
        refresh_token: Option<RefreshToken>,
    ) -> Self {
        Self {
            state: AuthState::Checking,
            user: None,
            access_token,
            refresh_token,
            is_authenticated: false,
            is_loading: false,
            last_error: None,
        }
    }

    /// A logged-out session carrying the error that ended the previous one.
    pub(crate) fn anonymous(last_error: Option<ErrorKind>) -> Self {
        Self {
            state: AuthState::Unauthenticated,
            user: None,
            access_token: None,
            refresh_token: None,
            is_authenticated: false,
            is_loading: false,
            last_error,
        }
    }

    /// Id of the signed-in user, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// Events accepted by [`AuthSessionMachine::send`].
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// Clear all tokens and return to the anonymous experience.
    Logout,

    /// A login or registration succeeded elsewhere.
    SetAuthenticated {
        user: UserRecord,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    },
}
