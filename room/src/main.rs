//! Auction room server - main entry point.

use auction_room::{server, MemoryStore, RoomArgs, RoomRegistry, SystemTimeProvider};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = RoomArgs::parse();

    let store = match &args.seed_file {
        Some(path) => MemoryStore::from_seed_file(path)?,
        None => {
            warn!("No seed file given; every auction lookup will miss");
            MemoryStore::new()
        }
    };
    info!("Serving {} auction(s)", store.auction_count());

    let registry = RoomRegistry::new(store, SystemTimeProvider::new());
    let shutdown = CancellationToken::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down..."),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        signal.cancel();
    });

    server::serve(args.bind, registry, shutdown).await
}
