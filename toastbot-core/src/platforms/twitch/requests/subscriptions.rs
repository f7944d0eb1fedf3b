//! Helix ⟶ POST /eventsub/subscriptions.

use std::collections::BTreeMap;

use reqwest::Client as ReqwestClient;
use serde_json::json;

use crate::platforms::twitch::events::EventKind;
use crate::Error;

pub const SUBSCRIPTIONS_URL: &str = "https://api.twitch.tv/helix/eventsub/subscriptions";

/// One registration to submit for the current socket session.
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub kind: EventKind,
    pub condition: BTreeMap<String, String>,
    pub session_id: String,
}

/// How Helix answered a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Accepted,
    /// HTTP 429. The caller should abandon the rest of the batch.
    RateLimited,
    Rejected { status: u16, message: String },
}

/// The registrations for one socket session, in submission order.
pub fn subscription_plan(broadcaster_user_id: &str, session_id: &str) -> Vec<SubscriptionRequest> {
    EventKind::ALL
        .iter()
        .map(|kind| SubscriptionRequest {
            kind: *kind,
            condition: kind.condition(broadcaster_user_id),
            session_id: session_id.to_string(),
        })
        .collect()
}

pub async fn create_subscription(
    http: &ReqwestClient,
    access_token: &str,
    client_id: &str,
    request: &SubscriptionRequest,
) -> Result<SubscriptionOutcome, Error> {
    let body = json!({
        "type": request.kind.as_helix_type(),
        "version": request.kind.version(),
        "condition": request.condition,
        "transport": {
            "method": "websocket",
            "session_id": request.session_id,
        },
    });

    let resp = http
        .post(SUBSCRIPTIONS_URL)
        .header("Client-Id", client_id)
        .header("Authorization", format!("Bearer {}", access_token))
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            Error::Platform(format!(
                "Error posting subscribe for {}: {e}",
                request.kind.as_helix_type()
            ))
        })?;

    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    Ok(decode_subscription_response(status, &text))
}

/// 202 is the documented acceptance code for this endpoint. Rejections carry
/// a JSON `message` when Helix felt like explaining itself.
pub(crate) fn decode_subscription_response(status: u16, body: &str) -> SubscriptionOutcome {
    match status {
        202 => SubscriptionOutcome::Accepted,
        429 => SubscriptionOutcome::RateLimited,
        _ => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| body.to_string());
            SubscriptionOutcome::Rejected { status, message }
        }
    }
}
