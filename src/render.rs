//! Operator-facing status view.
//!
//! Owns stdout and redraws from scratch every tick; diagnostics go to
//! stderr so they never tear the view.

use std::io::{self, Write};

use colored::Colorize;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};

use crate::core::diff::TransitionEvent;
use crate::core::peer::{PeerRecord, Snapshot};

/// Clears the screen and prints the current view.
pub fn draw(snapshot: &Snapshot, events: &[TransitionEvent]) -> io::Result<()> {
    let mut out = io::stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    write!(out, "{}", compose(snapshot, events))?;
    out.flush()
}

/// The full view as text: banner, connected peers, disconnected peers,
/// then the tick's transition notices.
pub fn compose(snapshot: &Snapshot, events: &[TransitionEvent]) -> String {
    let mut view = String::new();
    view.push_str(&format!("{0}Peer Status{0}\n", "=".repeat(20)));

    for peer in snapshot.values().filter(|peer| peer.connected) {
        view.push_str(&connected_line(peer));
        view.push('\n');
    }
    for peer in snapshot.values().filter(|peer| !peer.connected) {
        view.push_str(&disconnected_line(peer));
        view.push('\n');
    }
    for event in events {
        view.push_str(&format!("  {} {event}\n", "[NOTIFICATION]:".yellow()));
    }
    view
}

fn connected_line(peer: &PeerRecord) -> String {
    let endpoint = peer
        .endpoint
        .as_ref()
        .map(|ep| format!("{}:{}", ep.ip, ep.port))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} {} - recent handshake {}s ago from {} ({} {} down / {} {} up)",
        "[+]".green().bold(),
        peer.name.bold(),
        peer.last_handshake_seconds,
        endpoint,
        peer.transfer.received.amount,
        peer.transfer.received.unit,
        peer.transfer.sent.amount,
        peer.transfer.sent.unit,
    )
}

fn disconnected_line(peer: &PeerRecord) -> String {
    format!(
        "{} {} - disconnected (last handshake {}s ago)",
        "[-]".red().bold(),
        peer.name,
        peer.last_handshake_seconds,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::core::peer::{Transfer, TransferAmount};

    fn record(name: &str, connected: bool, age: u64) -> PeerRecord {
        PeerRecord {
            name: name.to_string(),
            ip: "10.0.0.2".to_string(),
            endpoint: None,
            connected,
            last_handshake_seconds: age,
            transfer: Transfer {
                received: TransferAmount::new("1.20", "MiB"),
                sent: TransferAmount::new("3.40", "KiB"),
            },
            public_key: None,
        }
    }

    #[test]
    fn view_lists_connected_before_disconnected() {
        colored::control::set_override(false);
        let mut snapshot = Snapshot::new();
        snapshot.insert("zoe".to_string(), record("zoe", true, 3));
        snapshot.insert("bob".to_string(), record("bob", false, 400));

        let view = compose(&snapshot, &[]);
        let lines: Vec<&str> = view.lines().collect();
        assert_eq!(lines[0], format!("{0}Peer Status{0}", "=".repeat(20)));
        assert!(lines[1].starts_with("[+] zoe - recent handshake 3s ago from unknown"));
        assert!(lines[2].starts_with("[-] bob - disconnected (last handshake 400s ago)"));
    }

    #[test]
    fn transition_notices_follow_the_roster() {
        colored::control::set_override(false);
        let mut snapshot = Snapshot::new();
        snapshot.insert("zoe".to_string(), record("zoe", true, 3));

        let event = TransitionEvent {
            connected: true,
            name: "zoe".to_string(),
            ip: "10.0.0.2".to_string(),
            endpoint_ip: None,
            timestamp: Local::now(),
        };
        let view = compose(&snapshot, &[event]);
        let notice = view.lines().last().unwrap();
        assert!(notice.starts_with("  [NOTIFICATION]: [+] UP zoe"));
    }
}
