// File: toastbot-core/src/platforms/twitch/requests/mod.rs

pub mod subscriptions;
pub mod token;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;

use crate::models::{AppCredential, UserProfile};
use crate::Error;
use subscriptions::{SubscriptionOutcome, SubscriptionRequest};

/// The slice of the Twitch HTTP surface the session needs. Kept behind a
/// trait so runtimes can be driven against a stub in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HelixApi: Send + Sync {
    /// POST /oauth2/token with the client-credentials grant.
    async fn fetch_app_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AppCredential, Error>;

    /// POST /helix/eventsub/subscriptions.
    async fn create_subscription(
        &self,
        access_token: &str,
        client_id: &str,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionOutcome, Error>;

    /// GET /helix/users?id=...
    async fn fetch_user(
        &self,
        access_token: &str,
        client_id: &str,
        user_id: &str,
    ) -> Result<Option<UserProfile>, Error>;
}

/// Reqwest-backed implementation of [`HelixApi`]. One shared HTTP client
/// serves every endpoint.
pub struct HelixClient {
    http: Arc<ReqwestClient>,
}

impl HelixClient {
    pub fn new() -> Self {
        Self {
            http: Arc::new(ReqwestClient::new()),
        }
    }
}

impl Default for HelixClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HelixApi for HelixClient {
    async fn fetch_app_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AppCredential, Error> {
        token::fetch_app_access_token(&self.http, client_id, client_secret).await
    }

    async fn create_subscription(
        &self,
        access_token: &str,
        client_id: &str,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionOutcome, Error> {
        subscriptions::create_subscription(&self.http, access_token, client_id, request).await
    }

    async fn fetch_user(
        &self,
        access_token: &str,
        client_id: &str,
        user_id: &str,
    ) -> Result<Option<UserProfile>, Error> {
        users::fetch_user(&self.http, access_token, client_id, user_id).await
    }
}
