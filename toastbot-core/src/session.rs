// File: toastbot-core/src/session.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::SessionConfig;
use crate::eventbus::AlertBus;
use crate::models::{AppCredential, CredentialStore};
use crate::platforms::twitch::requests::{HelixApi, HelixClient};
use crate::platforms::twitch::runtime::EventSubRuntime;
use crate::tasks::token_refresh::spawn_token_refresh_task;

/// One live alert session: the credential provider plus the socket runtime,
/// joined back together at teardown.
pub struct AlertSession {
    bus: Arc<AlertBus>,
    credentials: CredentialStore,
    runtime_handle: JoinHandle<()>,
    refresh_handle: JoinHandle<()>,
}

impl AlertSession {
    /// Starts a session against the real Twitch endpoints.
    pub async fn start(config: SessionConfig, bus: Arc<AlertBus>) -> AlertSession {
        Self::start_with_api(config, bus, Arc::new(HelixClient::new())).await
    }

    /// Starts a session against any [`HelixApi`]; tests hand in a stub here.
    pub async fn start_with_api(
        config: SessionConfig,
        bus: Arc<AlertBus>,
        helix: Arc<dyn HelixApi>,
    ) -> AlertSession {
        let credentials = CredentialStore::new();

        if let Some(token) = config.seed_access_token.clone() {
            info!("[Session] using pre-provisioned access token");
            credentials.set(AppCredential::new(token)).await;
        } else {
            match helix
                .fetch_app_access_token(&config.client_id, &config.client_secret)
                .await
            {
                Ok(cred) => {
                    info!("[Session] app access token acquired");
                    credentials.set(cred).await;
                }
                Err(e) => {
                    // Not fatal: the runtime idles until the refresh task
                    // manages to install a token.
                    error!("Error fetching app access token: {:?}", e);
                }
            }
        }

        let refresh_handle = spawn_token_refresh_task(
            helix.clone(),
            credentials.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            bus.clone(),
        );

        let mut runtime = EventSubRuntime::new(config, credentials.clone(), bus.clone(), helix);
        let runtime_handle = tokio::spawn(async move {
            runtime.start_loop().await;
        });

        AlertSession {
            bus,
            credentials,
            runtime_handle,
            refresh_handle,
        }
    }

    /// The token currently in use, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.credentials.access_token().await
    }

    pub fn is_running(&self) -> bool {
        !self.runtime_handle.is_finished()
    }

    /// Stops everything: signals the bus, then waits for the runtime and the
    /// refresh task to wind down.
    pub async fn teardown(self) {
        info!("[Session] tearing down");
        self.bus.shutdown();
        let _ = self.runtime_handle.await;
        let _ = self.refresh_handle.await;
        info!("[Session] stopped");
    }
}
