// File: toastbot-core/src/models/profile.rs

use serde::Deserialize;

/// A Helix `GET /users` record. Only the fields this system reads are
/// typed; everything else rides along untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub id: String,

    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub profile_image_url: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
