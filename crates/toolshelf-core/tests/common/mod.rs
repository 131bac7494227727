//! Scripted fakes for the capability traits.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use toolshelf_core::error::{AuthError, ProtocolError, TransportError};
use toolshelf_core::{
    AccessToken, CollectionFetcher, CollectionKind, Error, RefreshGrant, RefreshToken, Result,
    SessionVerifier, TokenRefresher, UserRecord, VerifyResponse,
};

pub fn user(id: &str) -> UserRecord {
    UserRecord::with_id(id)
}

pub fn access(token: &str) -> AccessToken {
    AccessToken::new(token).unwrap()
}

pub fn refresh(token: &str) -> RefreshToken {
    RefreshToken::new(token).unwrap()
}

pub fn verified(id: &str) -> Result<VerifyResponse> {
    Ok(VerifyResponse {
        user: Some(user(id)),
        access_token: None,
        refresh_token: None,
    })
}

pub fn rejected(status: u16) -> Result<VerifyResponse> {
    Err(AuthError::SessionInvalid { status }.into())
}

pub fn network_down() -> Error {
    TransportError::Connection {
        message: "connection refused".into(),
    }
    .into()
}

pub fn server_error() -> Error {
    ProtocolError::new(Some(500), "internal error").into()
}

/// A pause point: the fake signals `entered` and then waits for `release`.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct FakeVerifier {
    responses: Mutex<HashMap<String, Result<VerifyResponse>>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Gate>,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each verify call pauses at the returned gate.
    pub fn gated() -> Self {
        Self {
            gate: Some(Gate::default()),
            ..Self::default()
        }
    }

    pub fn on(self, token: &str, response: Result<VerifyResponse>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(token.to_string(), response);
        self
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("verifier is not gated")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionVerifier for FakeVerifier {
    async fn verify(&self, access_token: &AccessToken) -> Result<VerifyResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(access_token.as_str().to_string());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(access_token.as_str())
            .cloned()
            .unwrap_or_else(|| rejected(401))
    }
}

#[derive(Default)]
pub struct FakeRefresher {
    responses: Mutex<HashMap<String, Result<RefreshGrant>>>,
    calls: Mutex<Vec<String>>,
    revoked: Mutex<Vec<String>>,
    fail_revoke: bool,
    gate: Option<Gate>,
}

impl FakeRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each refresh call pauses at the returned gate. Revocation does not.
    pub fn gated() -> Self {
        Self {
            gate: Some(Gate::default()),
            ..Self::default()
        }
    }

    pub fn failing_revoke() -> Self {
        Self {
            fail_revoke: true,
            ..Self::default()
        }
    }

    pub fn on(self, token: &str, response: Result<RefreshGrant>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(token.to_string(), response);
        self
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("refresher is not gated")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant> {
        self.calls
            .lock()
            .unwrap()
            .push(refresh_token.as_str().to_string());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(refresh_token.as_str())
            .cloned()
            .unwrap_or_else(|| Err(AuthError::RefreshInvalid.into()))
    }

    async fn revoke(&self, refresh_token: &RefreshToken) -> Result<()> {
        self.revoked
            .lock()
            .unwrap()
            .push(refresh_token.as_str().to_string());
        if self.fail_revoke {
            return Err(network_down());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<CollectionKind, Result<Vec<String>>>>,
    by_token: Mutex<HashMap<(String, CollectionKind), Result<Vec<String>>>>,
    calls: Mutex<Vec<CollectionKind>>,
    gate: Option<Gate>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Gate::default()),
            ..Self::default()
        }
    }

    pub fn on(self, kind: CollectionKind, response: Result<Vec<String>>) -> Self {
        self.responses.lock().unwrap().insert(kind, response);
        self
    }

    /// Answer `kind` requests made with `token`, ahead of [`on`](Self::on).
    pub fn on_token(self, token: &str, kind: CollectionKind, response: Result<Vec<String>>) -> Self {
        self.by_token
            .lock()
            .unwrap()
            .insert((token.to_string(), kind), response);
        self
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("fetcher is not gated")
    }

    pub fn calls(&self) -> Vec<CollectionKind> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CollectionFetcher for FakeFetcher {
    async fn fetch(
        &self,
        kind: CollectionKind,
        access_token: &AccessToken,
    ) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(kind);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        let scoped = self
            .by_token
            .lock()
            .unwrap()
            .get(&(access_token.as_str().to_string(), kind))
            .cloned();
        if let Some(response) = scoped {
            return response;
        }
        self.responses
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
