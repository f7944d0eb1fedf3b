// File: toastbot-core/src/platforms/twitch/mod.rs

pub mod events;
pub mod requests;
pub mod runtime;

/// Production EventSub websocket endpoint.
pub const EVENTSUB_WS_URL: &str = "wss://eventsub.wss.twitch.tv/ws";
