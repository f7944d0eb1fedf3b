// File: toastbot-core/src/platforms/twitch/events/mod.rs

pub mod base;
pub mod cheer;
pub mod follow;
pub mod raid;
pub mod subscribe;

pub use base::{NotificationEnvelope, SubscriptionDescriptor};
pub use cheer::ChannelCheer;
pub use follow::ChannelFollow;
pub use raid::ChannelRaid;
pub use subscribe::ChannelSubscribe;

use std::collections::BTreeMap;

/// The alert kinds this crate registers for, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Subscribe,
    Follow,
    Cheer,
    Raid,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Subscribe,
        EventKind::Follow,
        EventKind::Cheer,
        EventKind::Raid,
    ];

    pub fn as_helix_type(&self) -> &'static str {
        match self {
            EventKind::Subscribe => "channel.subscribe",
            EventKind::Follow => "channel.follow",
            EventKind::Cheer => "channel.cheer",
            EventKind::Raid => "channel.raid",
        }
    }

    pub fn from_helix_type(kind: &str) -> Option<EventKind> {
        match kind {
            "channel.subscribe" => Some(EventKind::Subscribe),
            "channel.follow" => Some(EventKind::Follow),
            "channel.cheer" => Some(EventKind::Cheer),
            "channel.raid" => Some(EventKind::Raid),
            _ => None,
        }
    }

    /// Helix subscription version. channel.follow is only served as v2.
    pub fn version(&self) -> &'static str {
        match self {
            EventKind::Follow => "2",
            _ => "1",
        }
    }

    /// Condition object for the subscription request. Every kind names the
    /// broadcaster; follow and raid each add one more field on top.
    pub fn condition(&self, broadcaster_user_id: &str) -> BTreeMap<String, String> {
        let mut cond = BTreeMap::new();
        cond.insert(
            "broadcaster_user_id".to_string(),
            broadcaster_user_id.to_string(),
        );
        match self {
            EventKind::Follow => {
                cond.insert(
                    "moderator_user_id".to_string(),
                    broadcaster_user_id.to_string(),
                );
            }
            EventKind::Raid => {
                cond.insert(
                    "to_broadcaster_user_id".to_string(),
                    broadcaster_user_id.to_string(),
                );
            }
            _ => {}
        }
        cond
    }
}

/// Parsed form of a notification's `event` payload, keyed by subscription type.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Subscribe(ChannelSubscribe),
    Follow(ChannelFollow),
    Cheer(ChannelCheer),
    Raid(ChannelRaid),
    /// Anything we did not register for, or a payload that refused to parse.
    Other(serde_json::Map<String, serde_json::Value>),
}

impl StreamEvent {
    /// ID of the user behind the event, when the feed included one.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Subscribe(e) => e.user_id.as_deref(),
            StreamEvent::Follow(e) => e.user_id.as_deref(),
            StreamEvent::Cheer(e) => e.user_id.as_deref(),
            StreamEvent::Raid(e) => e.user_id.as_deref(),
            StreamEvent::Other(map) => map.get("user_id").and_then(|v| v.as_str()),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            StreamEvent::Subscribe(e) => e.display_name.as_deref(),
            StreamEvent::Follow(e) => e.display_name.as_deref(),
            StreamEvent::Cheer(e) => e.display_name.as_deref(),
            StreamEvent::Raid(e) => e.extra.get("display_name").and_then(|v| v.as_str()),
            StreamEvent::Other(map) => map.get("display_name").and_then(|v| v.as_str()),
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        match self {
            StreamEvent::Subscribe(e) => e.user_name.as_deref(),
            StreamEvent::Follow(e) => e.user_name.as_deref(),
            StreamEvent::Cheer(e) => e.user_name.as_deref(),
            StreamEvent::Raid(e) => e.extra.get("user_name").and_then(|v| v.as_str()),
            StreamEvent::Other(map) => map.get("user_name").and_then(|v| v.as_str()),
        }
    }
}

/// Turns a raw notification `event` object into a [`StreamEvent`]. Never
/// fails: payloads we cannot type end up in [`StreamEvent::Other`] so the
/// alert still reaches subscribers.
pub fn parse_stream_event(kind: &str, event: &serde_json::Value) -> StreamEvent {
    let parsed = match EventKind::from_helix_type(kind) {
        Some(EventKind::Subscribe) => serde_json::from_value(event.clone())
            .ok()
            .map(StreamEvent::Subscribe),
        Some(EventKind::Follow) => serde_json::from_value(event.clone())
            .ok()
            .map(StreamEvent::Follow),
        Some(EventKind::Cheer) => serde_json::from_value(event.clone())
            .ok()
            .map(StreamEvent::Cheer),
        Some(EventKind::Raid) => serde_json::from_value(event.clone())
            .ok()
            .map(StreamEvent::Raid),
        None => None,
    };
    parsed.unwrap_or_else(|| StreamEvent::Other(event.as_object().cloned().unwrap_or_default()))
}
