// File: toastbot-server/src/renderer.rs
//
// Turns bus alerts into toast lines for the overlay log.

use tracing::info;

use toastbot_core::eventbus::StreamAlert;
use toastbot_core::platforms::twitch::events::StreamEvent;

/// Builds the toast line for an alert. Kinds without a template render
/// nothing.
pub fn toast_line(alert: &StreamAlert) -> Option<String> {
    let username = alert
        .event
        .display_name()
        .or_else(|| alert.event.user_name())
        .unwrap_or("Unknown User");

    match &alert.event {
        StreamEvent::Subscribe(_) => Some(format!("{} just subscribed!", username)),
        StreamEvent::Follow(_) => Some(format!("{} just followed the channel!", username)),
        StreamEvent::Cheer(e) => Some(format!(
            "{} cheered {} bits!",
            username,
            e.bits.unwrap_or(0)
        )),
        StreamEvent::Raid(e) => Some(format!(
            "{} raided with {} viewers!",
            username,
            e.viewers.unwrap_or(0)
        )),
        StreamEvent::Other(_) => None,
    }
}

pub fn render(alert: &StreamAlert) {
    let Some(line) = toast_line(alert) else {
        info!("[Toast] no template for {}; skipping", alert.kind);
        return;
    };
    let stamp = alert.received_at.format("%H:%M:%S");
    match &alert.avatar_url {
        Some(url) => info!("[Toast {}] {} (avatar {})", stamp, line, url),
        None => info!("[Toast {}] {}", stamp, line),
    }
}
