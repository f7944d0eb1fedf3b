// twitch/runtime.rs

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::cache::{DedupSet, ProfileCache};
use crate::config::SessionConfig;
use crate::eventbus::{AlertBus, AlertEvent};
use crate::models::CredentialStore;
use crate::platforms::twitch::events::{parse_stream_event, NotificationEnvelope};
use crate::platforms::twitch::requests::subscriptions::{subscription_plan, SubscriptionOutcome};
use crate::platforms::twitch::requests::HelixApi;
use crate::platforms::ConnectionStatus;
use crate::Error;

const CLOSE_ABNORMAL: u16 = 1006;
const CLOSE_UNUSED_CONNECTION: u16 = 4003;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const INITIAL_CONNECT_DELAY: Duration = Duration::from_secs(1);
const CREDENTIAL_POLL_INTERVAL: Duration = Duration::from_secs(5);
const SUBSCRIPTION_STAGGER: Duration = Duration::from_millis(250);
const MAX_SUBSCRIPTION_ATTEMPTS: u32 = 4;

/// 1006 (abnormal closure) and 4003 (connection unused) earn one retry after
/// a fixed delay. Every other close code, including a missing one, is
/// terminal.
fn reconnect_delay_for(code: Option<u16>) -> Option<Duration> {
    match code {
        Some(CLOSE_ABNORMAL) | Some(CLOSE_UNUSED_CONNECTION) => Some(RECONNECT_DELAY),
        _ => None,
    }
}

/// Why the read loop handed the socket back.
#[derive(Debug)]
enum ReadOutcome {
    /// Twitch asked us to hop to a new URL; registrations carry over.
    Hop(String),
    /// The socket ended, with the close code if a close frame carried one.
    Closed(Option<u16>),
    /// Bus shutdown observed mid-read.
    Shutdown,
}

/// EventSubRuntime owns the socket, the handshake state, and the per-session
/// caches. One instance serves the whole lifetime of an alert session, across
/// any number of reconnects; only teardown ends it.
pub struct EventSubRuntime {
    config: SessionConfig,
    credentials: CredentialStore,
    bus: Arc<AlertBus>,
    helix: Arc<dyn HelixApi>,
    pub connection_status: ConnectionStatus,
    session_id: Option<String>,
    session_established: bool,
    dedup: DedupSet,
    profiles: Arc<ProfileCache>,
    subscription_attempts: Arc<AtomicU32>,
    generation: Arc<AtomicU64>,
}

impl EventSubRuntime {
    pub fn new(
        config: SessionConfig,
        credentials: CredentialStore,
        bus: Arc<AlertBus>,
        helix: Arc<dyn HelixApi>,
    ) -> Self {
        Self {
            config,
            credentials,
            bus,
            helix,
            connection_status: ConnectionStatus::Idle,
            session_id: None,
            session_established: false,
            dedup: DedupSet::new(),
            profiles: Arc::new(ProfileCache::new()),
            subscription_attempts: Arc::new(AtomicU32::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The socket session id from the last welcome, while one is live.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Entrypoint — owns the socket until teardown, hopping and retrying
    /// per the close-code policy.
    pub async fn start_loop(&mut self) {
        // Let the process settle before the first dial.
        if !self.sleep_unless_shutdown(INITIAL_CONNECT_DELAY).await {
            return;
        }

        // Idle until a credential exists. The initial fetch may have failed;
        // the refresh task will install one eventually.
        while self.credentials.access_token().await.is_none() {
            self.connection_status = ConnectionStatus::Idle;
            debug!("[EventSub] waiting for a credential before dialing");
            if !self.sleep_unless_shutdown(CREDENTIAL_POLL_INTERVAL).await {
                return;
            }
        }

        let mut url = self.config.eventsub_url.clone();

        loop {
            if self.bus.is_shutdown() {
                self.connection_status = ConnectionStatus::Closed;
                break;
            }
            self.connection_status = ConnectionStatus::Connecting;

            let mut ws = match connect_async(&url).await {
                Ok((ws, _)) => ws,
                Err(e) => {
                    error!("[EventSub] connect error: {}", e);
                    // A failed dial walks the same path as an abnormal close.
                    if !self.handle_socket_end(Some(CLOSE_ABNORMAL), &mut url).await {
                        break;
                    }
                    continue;
                }
            };

            info!("[EventSub] connected → {}", url);
            self.connection_status = ConnectionStatus::Open;

            match self.run_read_loop(&mut ws).await {
                Ok(ReadOutcome::Hop(new_url)) => {
                    warn!("[EventSub] reconnect requested → {}", new_url);
                    // Registrations carry over on a hop: the session stays
                    // established and no retry delay applies.
                    self.end_socket();
                    url = new_url;
                }
                Ok(ReadOutcome::Shutdown) => {
                    let _ = ws.close(None).await;
                    self.end_socket();
                    break;
                }
                Ok(ReadOutcome::Closed(code)) => {
                    if !self.handle_socket_end(code, &mut url).await {
                        break;
                    }
                }
                Err(e) => {
                    error!("[EventSub] socket error: {}", e);
                    if !self.handle_socket_end(Some(CLOSE_ABNORMAL), &mut url).await {
                        break;
                    }
                }
            }
        }

        self.connection_status = ConnectionStatus::Closed;
        info!("[EventSub] runtime stopped");
    }

    /// Reads until the socket ends, Twitch asks for a hop, or the bus shuts
    /// down.
    async fn run_read_loop(
        &mut self,
        ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    ) -> Result<ReadOutcome, Error> {
        if self.bus.is_shutdown() {
            return Ok(ReadOutcome::Shutdown);
        }
        let mut shutdown_rx = self.bus.shutdown_rx.clone();

        loop {
            let next = tokio::select! {
                m = ws.next() => m,
                _ = shutdown_rx.changed() => return Ok(ReadOutcome::Shutdown),
            };

            // EOF without a close frame reads as an abnormal closure.
            let Some(msg_res) = next else {
                return Ok(ReadOutcome::Closed(Some(CLOSE_ABNORMAL)));
            };
            let msg = msg_res.map_err(|e| Error::Platform(format!("ws error: {e}")))?;

            // control frames
            if let Message::Close(frame) = &msg {
                let code = frame.as_ref().map(|f| u16::from(f.code));
                return Ok(ReadOutcome::Closed(code));
            }
            if msg.is_ping() || msg.is_pong() {
                continue;
            }

            // text frames
            let Message::Text(txt) = msg else { continue };
            let parsed: serde_json::Value = match serde_json::from_str(&txt) {
                Ok(v) => v,
                Err(e) => {
                    warn!("[EventSub] bad json on the feed: {e}");
                    continue;
                }
            };

            if let Some(hop_url) = self.process_message(&parsed).await {
                return Ok(ReadOutcome::Hop(hop_url));
            }
        }
    }

    /// Handles one parsed text frame. Returns the URL to hop to when the
    /// feed requests a reconnect.
    pub async fn process_message(&mut self, parsed: &serde_json::Value) -> Option<String> {
        match parsed
            .get("metadata")
            .and_then(|m| m.get("message_type"))
            .and_then(|v| v.as_str())
        {
            Some("session_welcome") => {
                if let Some(id) = parsed
                    .pointer("/payload/session/id")
                    .and_then(|v| v.as_str())
                {
                    self.handle_welcome(id).await;
                }
                None
            }
            Some("notification") => {
                if let Some(payload) = parsed.get("payload") {
                    self.handle_notification(payload).await;
                }
                None
            }
            Some("websocket_reconnect") => {
                let raw = parsed
                    .pointer("/payload/websocket/url")
                    .and_then(|v| v.as_str());
                match raw {
                    Some(raw) => match Url::parse(raw) {
                        Ok(u) if matches!(u.scheme(), "ws" | "wss") => Some(raw.to_string()),
                        _ => {
                            warn!("[EventSub] ignoring reconnect with bad url: {raw}");
                            None
                        }
                    },
                    None => {
                        warn!("[EventSub] reconnect message without a url");
                        None
                    }
                }
            }
            Some("revocation") => {
                let kind = parsed
                    .pointer("/payload/subscription/type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                warn!("[EventSub] subscription revoked for {kind} – check scopes");
                None
            }
            Some("session_keepalive") => {
                trace!("keepalive");
                None
            }
            other => {
                debug!("unhandled message_type={:?}", other);
                None
            }
        }
    }

    async fn handle_welcome(&mut self, session_id: &str) {
        info!("[EventSub] session {} established", session_id);
        self.session_id = Some(session_id.to_string());
        self.bus
            .publish(AlertEvent::System(format!(
                "eventsub session {session_id} established"
            )))
            .await;

        if self.credentials.access_token().await.is_none()
            || self.config.broadcaster_user_id.is_empty()
        {
            warn!("[EventSub] Cannot subscribe: missing credential or broadcaster id");
            return;
        }
        if self.session_established {
            debug!("[EventSub] welcome for an established session; registrations carry over");
            return;
        }
        self.session_established = true;
        self.spawn_registration_batch(session_id.to_string());
    }

    /// Submits the four registrations for this handshake as a spawned batch,
    /// staggered, bounded by the per-handshake budget, and tagged with the
    /// current socket generation so a superseded batch stops early.
    fn spawn_registration_batch(&self, session_id: String) {
        let helix = self.helix.clone();
        let bus = self.bus.clone();
        let credentials = self.credentials.clone();
        let attempts = self.subscription_attempts.clone();
        let generation = self.generation.clone();
        let batch_generation = generation.load(Ordering::SeqCst);
        let client_id = self.config.client_id.clone();
        let plan = subscription_plan(&self.config.broadcaster_user_id, &session_id);

        tokio::spawn(async move {
            for (i, request) in plan.iter().enumerate() {
                if i > 0 {
                    sleep(SUBSCRIPTION_STAGGER).await;
                }
                if bus.is_shutdown() || generation.load(Ordering::SeqCst) != batch_generation {
                    debug!("[EventSub] registration batch superseded; stopping");
                    // The socket-end path owns the attempt reset here.
                    return;
                }
                if attempts.load(Ordering::SeqCst) >= MAX_SUBSCRIPTION_ATTEMPTS {
                    warn!("[EventSub] registration budget exhausted for this handshake");
                    break;
                }
                attempts.fetch_add(1, Ordering::SeqCst);

                let token = match credentials.access_token().await {
                    Some(t) => t,
                    None => {
                        warn!("[EventSub] no token mid-batch; abandoning registrations");
                        break;
                    }
                };

                match helix.create_subscription(&token, &client_id, request).await {
                    Ok(SubscriptionOutcome::Accepted) => {
                        debug!(
                            "[EventSub] subscribed to {} OK",
                            request.kind.as_helix_type()
                        );
                    }
                    Ok(SubscriptionOutcome::RateLimited) => {
                        warn!("[EventSub] rate limited; abandoning remaining registrations");
                        break;
                    }
                    Ok(SubscriptionOutcome::Rejected { status, message }) => {
                        warn!(
                            "[EventSub] Could not subscribe to {} => HTTP {} => {}",
                            request.kind.as_helix_type(),
                            status,
                            message
                        );
                    }
                    Err(e) => {
                        warn!(
                            "[EventSub] subscribe call failed for {}: {:?}",
                            request.kind.as_helix_type(),
                            e
                        );
                    }
                }
            }
            attempts.store(0, Ordering::SeqCst);
        });
    }

    async fn handle_notification(&mut self, payload: &serde_json::Value) {
        let envelope: NotificationEnvelope = match serde_json::from_value(payload.clone()) {
            Ok(env) => env,
            Err(e) => {
                warn!("[EventSub] notification with bad envelope: {e}");
                return;
            }
        };
        let kind = envelope.subscription.kind;
        let event = envelope.event;

        let key = DedupSet::event_key(&kind, event.get("id").and_then(|v| v.as_str()), Utc::now());
        if !self.dedup.insert(key) {
            debug!("[EventSub] duplicate {} delivery dropped", kind);
            return;
        }

        debug!("[EventSub] {} event accepted", kind);
        self.spawn_alert_publish(kind, event);
    }

    /// Avatar enrichment and publishing run off the read loop so a slow
    /// profile lookup never stalls the socket.
    fn spawn_alert_publish(&self, kind: String, event: serde_json::Value) {
        let helix = self.helix.clone();
        let bus = self.bus.clone();
        let credentials = self.credentials.clone();
        let profiles = self.profiles.clone();
        let client_id = self.config.client_id.clone();

        tokio::spawn(async move {
            let stream_event = parse_stream_event(&kind, &event);
            let avatar_url = match stream_event.user_id() {
                Some(user_id) => {
                    resolve_avatar(
                        helix.as_ref(),
                        &credentials,
                        &profiles,
                        &client_id,
                        user_id,
                    )
                    .await
                }
                None => None,
            };

            // An event that earned its spot still publishes even if its
            // socket died meanwhile; only a torn-down bus discards it.
            if bus.is_shutdown() {
                return;
            }
            bus.publish_alert(&kind, stream_event, avatar_url).await;
        });
    }

    /// Bookkeeping for a socket that just ended: late completions from it
    /// must not touch the next one.
    fn end_socket(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.session_id = None;
        self.connection_status = ConnectionStatus::Closed;
    }

    /// Applies the close-code policy. Returns false when the loop should
    /// stop for good.
    async fn handle_socket_end(&mut self, code: Option<u16>, url: &mut String) -> bool {
        self.end_socket();
        self.subscription_attempts.store(0, Ordering::SeqCst);

        match reconnect_delay_for(code) {
            Some(delay) => {
                warn!(
                    "[EventSub] socket closed (code={:?}); retrying in {:?}",
                    code, delay
                );
                self.session_established = false;
                *url = self.config.eventsub_url.clone();
                self.sleep_unless_shutdown(delay).await
            }
            None => {
                warn!("[EventSub] socket closed (code={:?}); not reconnecting", code);
                false
            }
        }
    }

    /// Sleeps for `d`, cutting the nap short when the bus shuts down.
    /// Returns false when shutdown fired.
    async fn sleep_unless_shutdown(&self, d: Duration) -> bool {
        if self.bus.is_shutdown() {
            return false;
        }
        let mut shutdown_rx = self.bus.shutdown_rx.clone();
        tokio::select! {
            _ = sleep(d) => true,
            _ = shutdown_rx.changed() => false,
        }
    }
}

/// Avatar lookup with cache. Any failure here is logged and yields no
/// avatar; the alert itself still goes out.
async fn resolve_avatar(
    helix: &dyn HelixApi,
    credentials: &CredentialStore,
    profiles: &ProfileCache,
    client_id: &str,
    user_id: &str,
) -> Option<String> {
    if let Some(profile) = profiles.get(user_id) {
        if profile.profile_image_url.is_empty() {
            return None;
        }
        return Some(profile.profile_image_url);
    }

    let token = match credentials.access_token().await {
        Some(t) => t,
        None => {
            warn!("[EventSub] no token for avatar lookup of {user_id}");
            return None;
        }
    };

    match helix.fetch_user(&token, client_id, user_id).await {
        Ok(Some(profile)) => {
            let avatar = profile.profile_image_url.clone();
            profiles.insert(profile);
            if avatar.is_empty() {
                None
            } else {
                Some(avatar)
            }
        }
        Ok(None) => {
            debug!("[EventSub] no profile record for {user_id}");
            None
        }
        Err(e) => {
            warn!("[EventSub] avatar lookup failed for {user_id}: {:?}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppCredential, UserProfile};
    use crate::platforms::twitch::events::StreamEvent;
    use crate::platforms::twitch::requests::MockHelixApi;
    use crate::platforms::twitch::EVENTSUB_WS_URL;
    use crate::test_utils::{notification_json, wait_until, welcome_json};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use tokio::time::timeout;

    fn test_config() -> SessionConfig {
        SessionConfig {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            broadcaster_user_id: "42".to_string(),
            seed_access_token: None,
            eventsub_url: EVENTSUB_WS_URL.to_string(),
        }
    }

    async fn seeded_store(token: &str) -> CredentialStore {
        let store = CredentialStore::new();
        store.set(AppCredential::new(token.to_string())).await;
        store
    }

    #[test]
    fn retry_policy_covers_exactly_the_two_recoverable_codes() {
        assert_eq!(reconnect_delay_for(Some(1006)), Some(RECONNECT_DELAY));
        assert_eq!(reconnect_delay_for(Some(4003)), Some(RECONNECT_DELAY));
        assert_eq!(reconnect_delay_for(Some(1000)), None);
        assert_eq!(reconnect_delay_for(Some(1005)), None);
        assert_eq!(reconnect_delay_for(Some(4000)), None);
        assert_eq!(reconnect_delay_for(None), None);
    }

    #[tokio::test]
    async fn welcome_registers_all_four_kinds_bound_to_the_session() {
        type Captured = (String, String, std::collections::BTreeMap<String, String>);
        let calls: Arc<StdMutex<Vec<Captured>>> = Arc::new(StdMutex::new(Vec::new()));

        let mut helix = MockHelixApi::new();
        let sink = calls.clone();
        helix.expect_create_subscription().returning(move |_, _, req| {
            sink.lock().unwrap().push((
                req.kind.as_helix_type().to_string(),
                req.session_id.clone(),
                req.condition.clone(),
            ));
            Ok(SubscriptionOutcome::Accepted)
        });

        let bus = Arc::new(AlertBus::new());
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );
        assert_eq!(runtime.connection_status, ConnectionStatus::Idle);

        runtime.process_message(&welcome_json("sess-1")).await;
        assert_eq!(runtime.session_id(), Some("sess-1"));

        let probe = calls.clone();
        wait_until(move || probe.lock().unwrap().len() == 4, "four registrations").await;

        let captured = calls.lock().unwrap().clone();
        let kinds: Vec<&str> = captured.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "channel.subscribe",
                "channel.follow",
                "channel.cheer",
                "channel.raid"
            ]
        );
        assert!(captured.iter().all(|c| c.1 == "sess-1"));

        let follow = &captured[1].2;
        assert_eq!(follow.get("moderator_user_id").map(String::as_str), Some("42"));
        let raid = &captured[3].2;
        assert_eq!(raid.get("broadcaster_user_id").map(String::as_str), Some("42"));
        assert_eq!(raid.get("to_broadcaster_user_id").map(String::as_str), Some("42"));

        // A repeat welcome on an established session must not register again.
        runtime.process_message(&welcome_json("sess-1b")).await;
        sleep(Duration::from_millis(1200)).await;
        assert_eq!(calls.lock().unwrap().len(), 4);

        bus.shutdown();
    }

    #[tokio::test]
    async fn rate_limit_abandons_the_rest_of_the_batch() {
        let count = Arc::new(StdMutex::new(0u32));

        let mut helix = MockHelixApi::new();
        let tally = count.clone();
        helix.expect_create_subscription().returning(move |_, _, _| {
            let mut n = tally.lock().unwrap();
            *n += 1;
            if *n == 1 {
                Ok(SubscriptionOutcome::Accepted)
            } else {
                Ok(SubscriptionOutcome::RateLimited)
            }
        });

        let bus = Arc::new(AlertBus::new());
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        runtime.process_message(&welcome_json("sess-2")).await;
        // Long enough for the full stagger schedule to have elapsed.
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(*count.lock().unwrap(), 2);

        bus.shutdown();
    }

    #[tokio::test]
    async fn welcome_without_credential_skips_registration_until_one_exists() {
        let count = Arc::new(StdMutex::new(0u32));

        let mut helix = MockHelixApi::new();
        let tally = count.clone();
        helix.expect_create_subscription().returning(move |_, _, _| {
            *tally.lock().unwrap() += 1;
            Ok(SubscriptionOutcome::Accepted)
        });

        let store = CredentialStore::new();
        let bus = Arc::new(AlertBus::new());
        let mut runtime =
            EventSubRuntime::new(test_config(), store.clone(), bus.clone(), Arc::new(helix));

        runtime.process_message(&welcome_json("sess-3")).await;
        sleep(Duration::from_millis(200)).await;
        assert_eq!(*count.lock().unwrap(), 0);

        // Once a token lands, the next welcome registers normally.
        store.set(AppCredential::new("tok".to_string())).await;
        runtime.process_message(&welcome_json("sess-3")).await;
        let probe = count.clone();
        wait_until(move || *probe.lock().unwrap() == 4, "four registrations").await;

        bus.shutdown();
    }

    #[tokio::test]
    async fn duplicate_deliveries_collapse_to_one_alert() {
        let mut helix = MockHelixApi::new();
        helix.expect_fetch_user().times(1).returning(|_, _, uid| {
            Ok(Some(UserProfile {
                id: uid.to_string(),
                profile_image_url: "https://cdn/5.png".to_string(),
                ..Default::default()
            }))
        });

        let bus = Arc::new(AlertBus::new());
        let mut rx = bus.subscribe(Some(8)).await;
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        let note = notification_json(
            "channel.cheer",
            json!({ "id": "evt-1", "user_id": "5", "bits": 100 }),
        );
        runtime.process_message(&note).await;
        runtime.process_message(&note).await;

        let first = timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("first alert should arrive")
            .expect("bus should be open");
        match first {
            AlertEvent::Alert(alert) => {
                assert_eq!(alert.kind, "channel.cheer");
                assert_eq!(alert.avatar_url.as_deref(), Some("https://cdn/5.png"));
            }
            other => panic!("expected an alert, got {:?}", other),
        }

        let second = timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(second.is_err(), "the duplicate must not publish");

        bus.shutdown();
    }

    #[tokio::test]
    async fn avatar_lookups_hit_the_cache_on_repeat_users() {
        let mut helix = MockHelixApi::new();
        helix.expect_fetch_user().times(1).returning(|_, _, uid| {
            Ok(Some(UserProfile {
                id: uid.to_string(),
                profile_image_url: "https://cdn/9.png".to_string(),
                ..Default::default()
            }))
        });

        let bus = Arc::new(AlertBus::new());
        let mut rx = bus.subscribe(Some(8)).await;
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        for id in ["f-1", "f-2"] {
            let note = notification_json(
                "channel.follow",
                json!({ "id": id, "user_id": "9", "user_name": "niner" }),
            );
            runtime.process_message(&note).await;
        }

        for _ in 0..2 {
            let evt = timeout(Duration::from_secs(3), rx.recv())
                .await
                .expect("alert should arrive")
                .expect("bus should be open");
            match evt {
                AlertEvent::Alert(alert) => {
                    assert_eq!(alert.avatar_url.as_deref(), Some("https://cdn/9.png"));
                }
                other => panic!("expected an alert, got {:?}", other),
            }
        }

        bus.shutdown();
    }

    #[tokio::test]
    async fn raid_notification_resolves_the_raider_profile() {
        let looked_up: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));

        let mut helix = MockHelixApi::new();
        let sink = looked_up.clone();
        helix.expect_fetch_user().returning(move |_, _, uid| {
            sink.lock().unwrap().push(uid.to_string());
            Ok(Some(UserProfile {
                id: uid.to_string(),
                profile_image_url: "https://cdn/99.png".to_string(),
                ..Default::default()
            }))
        });

        let bus = Arc::new(AlertBus::new());
        let mut rx = bus.subscribe(Some(8)).await;
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        let note = notification_json("channel.raid", json!({ "viewers": 42, "user_id": "99" }));
        runtime.process_message(&note).await;

        let evt = timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("alert should arrive")
            .expect("bus should be open");
        match evt {
            AlertEvent::Alert(alert) => {
                assert_eq!(alert.kind, "channel.raid");
                assert_eq!(alert.avatar_url.as_deref(), Some("https://cdn/99.png"));
                match alert.event {
                    StreamEvent::Raid(raid) => assert_eq!(raid.viewers, Some(42)),
                    other => panic!("expected a raid, got {:?}", other),
                }
            }
            other => panic!("expected an alert, got {:?}", other),
        }
        assert_eq!(looked_up.lock().unwrap().as_slice(), ["99".to_string()]);

        bus.shutdown();
    }

    #[tokio::test]
    async fn failed_avatar_lookup_still_delivers_the_alert() {
        let mut helix = MockHelixApi::new();
        helix
            .expect_fetch_user()
            .returning(|_, _, _| Err(Error::Platform("helix is down".to_string())));

        let bus = Arc::new(AlertBus::new());
        let mut rx = bus.subscribe(Some(8)).await;
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        let note = notification_json(
            "channel.subscribe",
            json!({ "id": "s-1", "user_id": "7", "display_name": "Seven" }),
        );
        runtime.process_message(&note).await;

        let evt = timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("alert should arrive")
            .expect("bus should be open");
        match evt {
            AlertEvent::Alert(alert) => {
                assert_eq!(alert.kind, "channel.subscribe");
                assert!(alert.avatar_url.is_none());
            }
            other => panic!("expected an alert, got {:?}", other),
        }

        bus.shutdown();
    }

    #[tokio::test]
    async fn unknown_kinds_still_reach_the_bus_untyped() {
        let helix = MockHelixApi::new();

        let bus = Arc::new(AlertBus::new());
        let mut rx = bus.subscribe(Some(8)).await;
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        // No user_id, so no profile lookup happens either.
        let note = notification_json("channel.goal.begin", json!({ "current_amount": 3 }));
        runtime.process_message(&note).await;

        let evt = timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("alert should arrive")
            .expect("bus should be open");
        match evt {
            AlertEvent::Alert(alert) => {
                assert_eq!(alert.kind, "channel.goal.begin");
                assert!(alert.avatar_url.is_none());
                assert!(matches!(alert.event, StreamEvent::Other(_)));
            }
            other => panic!("expected an alert, got {:?}", other),
        }

        bus.shutdown();
    }

    #[tokio::test]
    async fn reconnect_message_yields_the_hop_url_only_when_sane() {
        let helix = MockHelixApi::new();
        let bus = Arc::new(AlertBus::new());
        let mut runtime = EventSubRuntime::new(
            test_config(),
            seeded_store("tok").await,
            bus.clone(),
            Arc::new(helix),
        );

        let hop = json!({
            "metadata": { "message_type": "websocket_reconnect" },
            "payload": { "websocket": { "url": "wss://eventsub.wss.twitch.tv/ws?challenge=abc" } }
        });
        assert_eq!(
            runtime.process_message(&hop).await.as_deref(),
            Some("wss://eventsub.wss.twitch.tv/ws?challenge=abc")
        );

        let bad_scheme = json!({
            "metadata": { "message_type": "websocket_reconnect" },
            "payload": { "websocket": { "url": "https://not-a-socket" } }
        });
        assert_eq!(runtime.process_message(&bad_scheme).await, None);

        let missing = json!({
            "metadata": { "message_type": "websocket_reconnect" },
            "payload": {}
        });
        assert_eq!(runtime.process_message(&missing).await, None);

        bus.shutdown();
    }
}
