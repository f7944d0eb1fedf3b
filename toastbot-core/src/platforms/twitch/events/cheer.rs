// File: toastbot-core/src/platforms/twitch/events/cheer.rs

use serde::Deserialize;

/// "channel.cheer" event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelCheer {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub is_anonymous: Option<bool>,
    pub bits: Option<u64>,
    pub message: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
