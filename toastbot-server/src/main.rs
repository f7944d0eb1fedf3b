// File: toastbot-server/src/main.rs

use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use toastbot_core::config::SessionConfig;
use toastbot_core::eventbus::{AlertBus, AlertEvent};
use toastbot_core::AlertSession;

mod renderer;

#[derive(Parser, Debug, Clone)]
#[command(name = "toastbot")]
#[command(author, version, about = "Toastbot - Twitch EventSub alert overlay")]
struct Args {
    /// Broadcaster user id to watch (overrides TWITCH_BROADCASTER_USER_ID)
    #[arg(long)]
    broadcaster_id: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("toastbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let mut config = SessionConfig::from_env()?;
    if let Some(id) = args.broadcaster_id {
        config.broadcaster_user_id = id;
    }
    info!(
        "Starting Toastbot for broadcaster {}",
        config.broadcaster_user_id
    );

    let bus = Arc::new(AlertBus::new());
    // Subscribe before the session starts so the first alerts land here.
    let mut rx = bus.subscribe(None).await;

    let bus_for_signal = bus.clone();
    let _ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; shutting down alert bus...");
        bus_for_signal.shutdown();
    });

    let session = AlertSession::start(config, bus.clone()).await;

    let mut shutdown_rx = bus.shutdown_rx.clone();
    loop {
        tokio::select! {
            maybe_evt = rx.recv() => {
                match maybe_evt {
                    Some(AlertEvent::Alert(alert)) => renderer::render(&alert),
                    Some(AlertEvent::System(note)) => info!("[System] {}", note),
                    None => break,
                }
            }
            Ok(_) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signaled; exiting alert loop.");
                    break;
                }
            }
        }
    }

    session.teardown().await;
    info!("Toastbot stopped. Goodbye!");
    Ok(())
}
