// File: toastbot-core/src/platforms/twitch/events/base.rs

use serde::Deserialize;

/// The subscription half of a notification. Only `type` is guaranteed by
/// the feed; the condition may be absent entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDescriptor {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub condition: serde_json::Value,
}

/// The top-level wrapper of a "notification" message payload:
/// `{ "subscription": { ... }, "event": { ... } }`. An absent `event`
/// decodes as null rather than failing the whole notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub subscription: SubscriptionDescriptor,

    #[serde(default)]
    pub event: serde_json::Value,
}
