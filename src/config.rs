use std::path::PathBuf;

use clap::Parser;

/// Connectivity monitor for a WireGuard mesh.
///
/// Samples `wg show` on a fixed interval, publishes the peer snapshot as
/// JSON and records every connectivity transition.
#[derive(Parser, Debug)]
#[command(name = "wg-monitor", version, about)]
pub struct Args {
    /// Seconds between polling ticks.
    #[arg(long, env = "INTERVAL", default_value_t = 5)]
    pub interval: u64,

    /// WireGuard interface to sample.
    #[arg(long, default_value = "wg0")]
    pub interface: String,

    /// Path of the wg executable.
    #[arg(long, default_value = "wg")]
    pub wg_path: PathBuf,

    /// JSON file mapping allowed addresses to peer names.
    #[arg(long, default_value = "config/ip-map.json")]
    pub ip_map: PathBuf,

    /// Where the peer snapshot is published.
    #[arg(long, default_value = "tmp/state.json")]
    pub state_file: PathBuf,

    /// Directory receiving updates.log and errors.log.
    #[arg(long, default_value = "log")]
    pub log_dir: PathBuf,

    /// Owner applied to the snapshot file; defaults to the current user.
    #[arg(long, env = "WGMON_OWNER")]
    pub owner: Option<String>,

    /// Group applied to the snapshot file.
    #[arg(long, env = "WGMON_GROUP", default_value = "serv-api")]
    pub group: String,

    /// Send transition batches to the webhook.
    #[arg(long, env = "WEBEXT")]
    pub notify: bool,

    /// Webhook receiving transition batches.
    #[arg(
        long,
        env = "WEBHOOK",
        default_value = "http://localhost:5000/api/wg/update"
    )]
    pub webhook_url: String,

    /// Minimum seconds between webhook batches.
    #[arg(long, env = "WEB_COOLDOWN", default_value_t = 6)]
    pub cooldown: u64,

    /// Broadcast newly connected peers with wall(1).
    #[arg(long)]
    pub wall: bool,
}
