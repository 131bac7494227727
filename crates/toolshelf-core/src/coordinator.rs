//! Keeps per-user collections in step with the session.
//!
//! The coordinator depends on the session machine only through its
//! [`watch`] channel. It fetches owned and bookmarked tool ids when a user
//! signs in with an empty cache, clears them once the user is fully signed
//! out or a different user signs in, and drops fetch results that arrive after the session they were
//! requested for has ended.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::collections::{CollectionKind, ToolIds, UserState};
use crate::error::ErrorKind;
use crate::session::{AuthState, Session};
use crate::store::{self, StoredTokens, USER_STATE_KEY};
use crate::traits::{CollectionFetcher, TokenStore};

/// Snapshot of the cached collections and their last fetch errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionsView {
    pub tools: ToolIds,
    pub bookmarked_tools: ToolIds,
    pub tools_error: Option<ErrorKind>,
    pub bookmarks_error: Option<ErrorKind>,
}

impl CollectionsView {
    pub fn error(&self, kind: CollectionKind) -> Option<ErrorKind> {
        match kind {
            CollectionKind::OwnedTools => self.tools_error,
            CollectionKind::Bookmarks => self.bookmarks_error,
        }
    }
}

/// Fetches, caches and clears the signed-in user's collections.
#[derive(Clone)]
pub struct DependentDataCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    store: Arc<dyn TokenStore>,
    fetcher: Arc<dyn CollectionFetcher>,
    sessions: watch::Receiver<Session>,
    state: Mutex<CoordinatorState>,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    collections: UserState,
    tools_error: Option<ErrorKind>,
    bookmarks_error: Option<ErrorKind>,
    generation: u64,
    last_seen: Option<(AuthState, Option<String>)>,
    /// User the cached collections were loaded for.
    owner: Option<String>,
    clear_deferred: bool,
}

impl CoordinatorState {
    fn error_mut(&mut self, kind: CollectionKind) -> &mut Option<ErrorKind> {
        match kind {
            CollectionKind::OwnedTools => &mut self.tools_error,
            CollectionKind::Bookmarks => &mut self.bookmarks_error,
        }
    }
}

impl DependentDataCoordinator {
    /// Create a coordinator seeded from the cached `userState`.
    ///
    /// `sessions` is the machine's channel (see
    /// [`AuthSessionMachine::subscribe`](crate::AuthSessionMachine::subscribe)).
    pub fn new(
        store: Arc<dyn TokenStore>,
        fetcher: Arc<dyn CollectionFetcher>,
        sessions: watch::Receiver<Session>,
    ) -> Self {
        let collections = store::load_user_state(store.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable cached collections");
            UserState::default()
        });

        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                fetcher,
                sessions,
                state: Mutex::new(CoordinatorState {
                    collections,
                    ..CoordinatorState::default()
                }),
            }),
        }
    }

    /// Follow the session channel until the machine is dropped.
    pub async fn run(&self) {
        let mut sessions = self.inner.sessions.clone();
        loop {
            let session = sessions.borrow_and_update().clone();
            self.observe(&session).await;
            if sessions.changed().await.is_err() {
                debug!("Session machine dropped, coordinator stopping");
                return;
            }
        }
    }

    /// React to one session snapshot.
    ///
    /// Repeated snapshots of the same state and user are ignored, except that
    /// a deferred clear is retried.
    #[instrument(skip(self, session), fields(state = %session.state))]
    pub async fn observe(&self, session: &Session) {
        let key = (session.state, session.user_id().map(str::to_string));
        let generation = {
            let mut state = self.lock();
            let retry_clear =
                session.state == AuthState::Unauthenticated && state.clear_deferred;
            if state.last_seen.as_ref() == Some(&key) && !retry_clear {
                return;
            }
            state.last_seen = Some(key);
            state.generation += 1;

            if session.state == AuthState::Authenticated
                && let Some(user_id) = session.user_id()
            {
                if state.owner.as_deref().is_some_and(|owner| owner != user_id) {
                    info!(user = user_id, "Signed-in user changed, dropping cached collections");
                    self.reset(&mut state);
                }
                state.owner = Some(user_id.to_string());
            }
            state.generation
        };

        match session.state {
            AuthState::Authenticated => self.on_authenticated(session, generation).await,
            AuthState::Unauthenticated => self.on_unauthenticated(),
            AuthState::Checking => {}
        }
    }

    /// Current collections and error flags.
    pub fn view(&self) -> CollectionsView {
        let state = self.lock();
        CollectionsView {
            tools: state.collections.tools.clone(),
            bookmarked_tools: state.collections.bookmarked_tools.clone(),
            tools_error: state.tools_error,
            bookmarks_error: state.bookmarks_error,
        }
    }

    /// Put a newly created tool at the front of the owned list.
    pub fn record_owned_tool(&self, id: impl Into<String>) {
        let mut state = self.lock();
        state.collections.tools.insert_front(id);
        self.persist(&state);
    }

    /// Flip the bookmark on `id`. Returns whether it is now bookmarked.
    pub fn toggle_bookmark(&self, id: &str) -> bool {
        let mut state = self.lock();
        let bookmarks = &mut state.collections.bookmarked_tools;
        let bookmarked = if bookmarks.remove(id) {
            false
        } else {
            bookmarks.insert_front(id);
            true
        };
        self.persist(&state);
        bookmarked
    }

    async fn on_authenticated(&self, session: &Session, generation: u64) {
        let (Some(access_token), Some(user_id)) = (&session.access_token, session.user_id())
        else {
            return;
        };

        let wanted: Vec<CollectionKind> = {
            let mut state = self.lock();
            state.clear_deferred = false;
            CollectionKind::ALL
                .into_iter()
                .filter(|kind| state.collections.collection(*kind).is_empty())
                .collect()
        };

        if wanted.is_empty() {
            debug!("Cached collections present, skipping fetch");
            return;
        }

        let fetcher = &self.inner.fetcher;
        let results = join_all(wanted.into_iter().map(|kind| async move {
            debug!(%kind, "Fetching collection");
            (kind, fetcher.fetch(kind, access_token).await)
        }))
        .await;

        let mut state = self.lock();
        if state.generation != generation || !self.still_signed_in(user_id) {
            debug!("Discarding collection results for an ended session");
            return;
        }

        for (kind, result) in results {
            match result {
                Ok(ids) => {
                    let collection = state.collections.collection_mut(kind);
                    for id in ids {
                        collection.insert(id);
                    }
                    *state.error_mut(kind) = None;
                    info!(%kind, count = state.collections.collection(kind).len(), "Collection loaded");
                }
                Err(e) => {
                    warn!(%kind, error = %e, "Collection fetch failed");
                    *state.error_mut(kind) = Some(e.kind());
                }
            }
        }
        self.persist(&state);
    }

    fn on_unauthenticated(&self) {
        // Storage failures count as no tokens left.
        let tokens_remain = StoredTokens::load(self.inner.store.as_ref())
            .map(|tokens| !tokens.is_empty())
            .unwrap_or(false);

        let mut state = self.lock();
        if tokens_remain {
            debug!("Tokens still stored, deferring collection clear");
            state.clear_deferred = true;
            return;
        }

        self.reset(&mut state);
        state.owner = None;
        info!("Cleared cached collections");
    }

    fn reset(&self, state: &mut CoordinatorState) {
        state.collections = UserState::default();
        state.tools_error = None;
        state.bookmarks_error = None;
        state.clear_deferred = false;
        if let Err(e) = self.inner.store.remove(USER_STATE_KEY) {
            warn!(error = %e, "Failed to remove cached collections");
        }
    }

    fn still_signed_in(&self, user_id: &str) -> bool {
        let current = self.inner.sessions.borrow();
        current.is_authenticated && current.user_id() == Some(user_id)
    }

    fn persist(&self, state: &CoordinatorState) {
        if let Err(e) = store::save_user_state(self.inner.store.as_ref(), &state.collections) {
            warn!(error = %e, "Failed to persist cached collections");
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DependentDataCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependentDataCoordinator")
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}
