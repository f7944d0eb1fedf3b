// File: toastbot-core/src/models/credential.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// An app access token from the client-credentials grant. App tokens carry
/// no refresh token; renewal is a fresh grant, so the whole credential is
/// replaced on every successful refresh.
#[derive(Debug, Clone)]
pub struct AppCredential {
    pub access_token: String,
    pub obtained_at: DateTime<Utc>,
}

impl AppCredential {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            obtained_at: Utc::now(),
        }
    }
}

/// Shared handle to the current credential. Readers see whichever token the
/// refresh task installed last; a failed refresh leaves the old one in place.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<RwLock<Option<AppCredential>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set(&self, cred: AppCredential) {
        let mut guard = self.inner.write().await;
        *guard = Some(cred);
    }

    pub async fn current(&self) -> Option<AppCredential> {
        self.inner.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
