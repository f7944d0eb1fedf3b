// tests/credential_tests.rs
//
// Session-level credential behavior: seeding, the initial grant, and
// what happens when that grant fails.

use std::sync::Arc;

use tokio::time::{timeout, Duration};

use toastbot_core::config::SessionConfig;
use toastbot_core::eventbus::AlertBus;
use toastbot_core::test_utils::RecordingHelix;
use toastbot_core::AlertSession;

// Nothing listens here; dials fail fast and the runtime keeps cycling
// until teardown.
const DEAD_FEED: &str = "ws://127.0.0.1:9";

fn config_with_seed(seed: Option<&str>) -> SessionConfig {
    SessionConfig {
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        broadcaster_user_id: "42".to_string(),
        seed_access_token: seed.map(|s| s.to_string()),
        eventsub_url: DEAD_FEED.to_string(),
    }
}

#[tokio::test]
async fn a_seeded_token_skips_the_initial_grant() {
    let helix = Arc::new(RecordingHelix::new());
    let bus = Arc::new(AlertBus::new());

    let session =
        AlertSession::start_with_api(config_with_seed(Some("seed-tok")), bus.clone(), helix.clone())
            .await;

    assert_eq!(session.access_token().await.as_deref(), Some("seed-tok"));
    assert_eq!(helix.token_call_count(), 0);

    timeout(Duration::from_secs(5), session.teardown())
        .await
        .expect("teardown should finish promptly");
}

#[tokio::test]
async fn the_initial_grant_installs_an_app_token() {
    let helix = Arc::new(RecordingHelix::new());
    let bus = Arc::new(AlertBus::new());

    let session =
        AlertSession::start_with_api(config_with_seed(None), bus.clone(), helix.clone()).await;

    assert_eq!(session.access_token().await.as_deref(), Some("test-token"));
    assert_eq!(helix.token_call_count(), 1);

    timeout(Duration::from_secs(5), session.teardown())
        .await
        .expect("teardown should finish promptly");
}

#[tokio::test]
async fn a_failed_grant_leaves_the_session_alive_and_tokenless() {
    let helix = Arc::new(RecordingHelix::failing_token("invalid_client"));
    let bus = Arc::new(AlertBus::new());

    let session =
        AlertSession::start_with_api(config_with_seed(None), bus.clone(), helix.clone()).await;

    assert_eq!(session.access_token().await, None);
    assert_eq!(helix.token_call_count(), 1);
    assert!(session.is_running(), "the runtime idles instead of dying");

    timeout(Duration::from_secs(5), session.teardown())
        .await
        .expect("teardown should finish promptly");
}
