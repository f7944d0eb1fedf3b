// File: toastbot-core/src/test_utils.rs
//
// Helpers shared by unit and integration tests: canned feed messages and a
// recording HelixApi stub that never touches the network.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::{sleep, Duration, Instant};

use crate::models::{AppCredential, UserProfile};
use crate::platforms::twitch::requests::subscriptions::{
    SubscriptionOutcome, SubscriptionRequest,
};
use crate::platforms::twitch::requests::HelixApi;
use crate::Error;

pub fn welcome_json(session_id: &str) -> serde_json::Value {
    json!({
        "metadata": { "message_type": "session_welcome" },
        "payload": { "session": { "id": session_id } }
    })
}

pub fn notification_json(kind: &str, event: serde_json::Value) -> serde_json::Value {
    json!({
        "metadata": { "message_type": "notification" },
        "payload": { "subscription": { "type": kind }, "event": event }
    })
}

pub fn reconnect_json(url: &str) -> serde_json::Value {
    json!({
        "metadata": { "message_type": "websocket_reconnect" },
        "payload": { "websocket": { "url": url } }
    })
}

/// Polls `cond` until it holds, panicking with `what` after a few seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        sleep(Duration::from_millis(20)).await;
    }
}

/// A [`HelixApi`] that answers from canned data and records every call.
pub struct RecordingHelix {
    token_response: Mutex<Result<String, String>>,
    subscription_response: Mutex<SubscriptionOutcome>,
    pub token_calls: Mutex<u32>,
    pub subscription_calls: Mutex<Vec<(String, String)>>,
    pub user_lookups: Mutex<Vec<String>>,
}

impl RecordingHelix {
    pub fn new() -> Self {
        Self {
            token_response: Mutex::new(Ok("test-token".to_string())),
            subscription_response: Mutex::new(SubscriptionOutcome::Accepted),
            token_calls: Mutex::new(0),
            subscription_calls: Mutex::new(Vec::new()),
            user_lookups: Mutex::new(Vec::new()),
        }
    }

    /// A stub whose token grant always fails with the given message.
    pub fn failing_token(message: &str) -> Self {
        let helix = Self::new();
        *helix.token_response.lock().unwrap() = Err(message.to_string());
        helix
    }

    pub fn set_subscription_response(&self, outcome: SubscriptionOutcome) {
        *self.subscription_response.lock().unwrap() = outcome;
    }

    pub fn token_call_count(&self) -> u32 {
        *self.token_calls.lock().unwrap()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscription_calls.lock().unwrap().len()
    }

    pub fn subscription_kinds(&self) -> Vec<String> {
        self.subscription_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, _)| kind.clone())
            .collect()
    }

    pub fn lookup_count(&self) -> usize {
        self.user_lookups.lock().unwrap().len()
    }
}

impl Default for RecordingHelix {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HelixApi for RecordingHelix {
    async fn fetch_app_access_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
    ) -> Result<AppCredential, Error> {
        *self.token_calls.lock().unwrap() += 1;
        match self.token_response.lock().unwrap().clone() {
            Ok(token) => Ok(AppCredential::new(token)),
            Err(message) => Err(Error::Auth(message)),
        }
    }

    async fn create_subscription(
        &self,
        _access_token: &str,
        _client_id: &str,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionOutcome, Error> {
        self.subscription_calls.lock().unwrap().push((
            request.kind.as_helix_type().to_string(),
            request.session_id.clone(),
        ));
        Ok(self.subscription_response.lock().unwrap().clone())
    }

    async fn fetch_user(
        &self,
        _access_token: &str,
        _client_id: &str,
        user_id: &str,
    ) -> Result<Option<UserProfile>, Error> {
        self.user_lookups.lock().unwrap().push(user_id.to_string());
        Ok(Some(UserProfile {
            id: user_id.to_string(),
            display_name: format!("user-{user_id}"),
            profile_image_url: format!("https://cdn/{user_id}.png"),
            ..Default::default()
        }))
    }
}
