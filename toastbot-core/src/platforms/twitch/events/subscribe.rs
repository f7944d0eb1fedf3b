// File: toastbot-core/src/platforms/twitch/events/subscribe.rs

use serde::Deserialize;

/// "channel.subscribe" event. The feed owes us nothing beyond what it
/// sends, so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelSubscribe {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub tier: Option<String>,
    pub is_gift: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
