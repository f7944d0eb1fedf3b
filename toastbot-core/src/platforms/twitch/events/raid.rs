// File: toastbot-core/src/platforms/twitch/events/raid.rs

use serde::Deserialize;

/// "channel.raid" event. Raids identify the raider through the
/// `from_broadcaster_*` fields rather than `user_*`, but some feeds
/// attach a plain `user_id` as well, so we keep both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelRaid {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub from_broadcaster_user_id: Option<String>,
    pub from_broadcaster_user_login: Option<String>,
    pub from_broadcaster_user_name: Option<String>,
    pub to_broadcaster_user_id: Option<String>,
    pub to_broadcaster_user_name: Option<String>,
    pub viewers: Option<u64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
