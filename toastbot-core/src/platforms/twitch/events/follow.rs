// File: toastbot-core/src/platforms/twitch/events/follow.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// "channel.follow" event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelFollow {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub followed_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
