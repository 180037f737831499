use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use wg_monitor::config::Args;
use wg_monitor::core::{PeerDirectory, WgMonitor};
use wg_monitor::logging::TransitionLog;
use wg_monitor::net::{NotificationThrottle, Webhook, WgShowCommand};
use wg_monitor::storage::{Ownership, StateStore};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // Everything below is startup resolution; any failure here is a
    // misconfiguration and fatal before the first tick.
    let ownership = Ownership::resolve(args.owner.as_deref(), &args.group)
        .context("resolving snapshot ownership")?;
    let names = PeerDirectory::load(&args.ip_map).context("loading peer name map")?;
    tracing::info!(peers = names.len(), map = %args.ip_map.display(), "peer name map loaded");

    let store = StateStore::new(args.state_file, ownership).context("preparing snapshot store")?;
    let log = TransitionLog::open(args.log_dir).context("opening transition log")?;

    let throttle = if args.notify {
        tracing::info!(url = %args.webhook_url, "sending updates to webhook");
        let transport = Webhook::new(args.webhook_url).context("building webhook client")?;
        Some(NotificationThrottle::new(
            Box::new(transport),
            Duration::from_secs(args.cooldown),
        ))
    } else {
        tracing::info!(url = %args.webhook_url, "webhook notification disabled");
        None
    };

    let source = WgShowCommand::new(args.wg_path, args.interface);
    let mut monitor = WgMonitor::new(
        Box::new(source),
        names,
        store,
        log,
        throttle,
        Duration::from_secs(args.interval),
        args.wall,
    );

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.notify_one();
        }
    });

    monitor.run(shutdown).await;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
