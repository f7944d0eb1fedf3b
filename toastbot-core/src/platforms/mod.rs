// File: toastbot-core/src/platforms/mod.rs

pub mod twitch;

/// Where the websocket session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Open,
    Closed,
}
