// File: toastbot-core/src/config.rs

use crate::platforms::twitch::EVENTSUB_WS_URL;
use crate::Error;

/// Session configuration, sourced from the environment:
///
/// * `TWITCH_CLIENT_ID` / `TWITCH_CLIENT_SECRET` drive the client-credentials
///   grant. The secret may be left unset when a pre-provisioned token is
///   supplied; the 50-minute refresh will then fail (and log) each cycle
///   while the seeded token stays in place.
/// * `TWITCH_BROADCASTER_USER_ID` names the channel whose events we watch.
/// * `TWITCH_ACCESS_TOKEN` (optional) seeds the credential store so the
///   session comes up without hitting the token endpoint first.
/// * `TWITCH_EVENTSUB_URL` (optional) overrides the feed endpoint.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub client_id: String,
    pub client_secret: String,
    pub broadcaster_user_id: String,
    pub seed_access_token: Option<String>,
    pub eventsub_url: String,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, Error> {
        let client_id = std::env::var("TWITCH_CLIENT_ID").unwrap_or_default();
        let client_secret = std::env::var("TWITCH_CLIENT_SECRET").unwrap_or_default();
        let broadcaster_user_id =
            std::env::var("TWITCH_BROADCASTER_USER_ID").unwrap_or_default();
        let seed_access_token = std::env::var("TWITCH_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        let eventsub_url = std::env::var("TWITCH_EVENTSUB_URL")
            .unwrap_or_else(|_| EVENTSUB_WS_URL.to_string());

        if client_id.is_empty() {
            return Err(Error::Config("TWITCH_CLIENT_ID is not set".into()));
        }
        if client_secret.is_empty() && seed_access_token.is_none() {
            return Err(Error::Config(
                "TWITCH_CLIENT_SECRET is not set and no TWITCH_ACCESS_TOKEN was provided".into(),
            ));
        }
        if broadcaster_user_id.is_empty() {
            return Err(Error::Config("TWITCH_BROADCASTER_USER_ID is not set".into()));
        }

        Ok(Self {
            client_id,
            client_secret,
            broadcaster_user_id,
            seed_access_token,
            eventsub_url,
        })
    }
}
