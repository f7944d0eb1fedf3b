//! OAuth ⟶ POST /oauth2/token (client-credentials grant).

use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::debug;

use crate::models::AppCredential;
use crate::Error;

pub const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// The token endpoint answers with one shape for success and another for
/// failure, so every field here is optional and we sort it out afterwards.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    message: Option<String>,
}

/// Exchanges app credentials for an app access token.
pub async fn fetch_app_access_token(
    http: &ReqwestClient,
    client_id: &str,
    client_secret: &str,
) -> Result<AppCredential, Error> {
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(Error::Auth("Missing Twitch API credentials".into()));
    }

    let params = [
        ("client_id",     client_id),
        ("client_secret", client_secret),
        ("grant_type",    "client_credentials"),
    ];

    let resp = http
        .post(TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| Error::Auth(format!("HTTP error fetching app token: {e}")))?;

    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    decode_token_response(status, &body)
}

/// The endpoint reports failures as JSON with a `message` field; that message
/// becomes the error text verbatim so callers see what Twitch said.
pub(crate) fn decode_token_response(status: u16, body: &str) -> Result<AppCredential, Error> {
    let parsed: TokenResponse = serde_json::from_str(body)?;

    if !(200..300).contains(&status) {
        let message = parsed
            .message
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Error::Auth(message));
    }

    let access_token = parsed
        .access_token
        .ok_or_else(|| Error::Auth("Token response had no access_token".to_string()))?;
    debug!("app token issued; expires_in={:?}s", parsed.expires_in);
    Ok(AppCredential::new(access_token))
}
