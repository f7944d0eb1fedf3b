//! Helix ⟶ GET /users (avatar lookup).

use reqwest::Client as ReqwestClient;

use crate::models::UserProfile;
use crate::Error;

pub const USERS_URL: &str = "https://api.twitch.tv/helix/users";

/// Fetches the profile record for one user id. Helix answers with a list;
/// only the first record matters here.
pub async fn fetch_user(
    http: &ReqwestClient,
    access_token: &str,
    client_id: &str,
    user_id: &str,
) -> Result<Option<UserProfile>, Error> {
    let resp = http
        .get(USERS_URL)
        .query(&[("id", user_id)])
        .header("Client-Id", client_id)
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .map_err(|e| Error::Platform(format!("Error fetching user {}: {e}", user_id)))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(Error::Platform(format!(
            "GET /helix/users for {user_id} => HTTP {status} => {text}"
        )));
    }

    let body = resp.text().await?;
    decode_user_record(&body)
}

pub(crate) fn decode_user_record(body: &str) -> Result<Option<UserProfile>, Error> {
    let parsed: serde_json::Value = serde_json::from_str(body)?;
    let record = parsed.pointer("/data/0").cloned();
    match record {
        Some(v) => Ok(Some(serde_json::from_value(v)?)),
        None => Ok(None),
    }
}
