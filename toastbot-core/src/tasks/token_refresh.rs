use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::eventbus::AlertBus;
use crate::models::CredentialStore;
use crate::platforms::twitch::requests::HelixApi;

/// Fixed renewal cadence, independent of the token's actual expiry.
pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

/// Spawns a background task that re-runs the client-credentials grant on a
/// fixed schedule and swaps the stored token on success. A failed renewal
/// keeps the previous token in place; the next tick simply tries again.
pub fn spawn_token_refresh_task(
    helix: Arc<dyn HelixApi>,
    credentials: CredentialStore,
    client_id: String,
    client_secret: String,
    bus: Arc<AlertBus>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut shutdown_rx = bus.shutdown_rx.clone();
        let mut ticker = interval(TOKEN_REFRESH_INTERVAL);
        // The first tick completes immediately and the session already
        // holds a token at this point, so consume it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match helix.fetch_app_access_token(&client_id, &client_secret).await {
                        Ok(cred) => {
                            info!("[TokenRefresh] app token renewed");
                            credentials.set(cred).await;
                        }
                        Err(e) => {
                            let kept = credentials.current().await.map(|c| c.obtained_at);
                            error!(
                                "[TokenRefresh] renewal failed: {:?}; keeping token obtained at {:?}",
                                e, kept
                            );
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("[TokenRefresh] shutting down");
                    break;
                }
            }
        }
    })
}
