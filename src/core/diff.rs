use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::core::peer::{PeerRecord, Snapshot};

/// Names that changed connectivity between two consecutive samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    pub newly_connected: BTreeSet<String>,
    pub newly_disconnected: BTreeSet<String>,
}

impl StateDiff {
    /// Set difference in both directions. Equal inputs produce an empty diff.
    pub fn between(previous: &BTreeSet<String>, current: &BTreeSet<String>) -> Self {
        Self {
            newly_connected: current.difference(previous).cloned().collect(),
            newly_disconnected: previous.difference(current).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.newly_connected.is_empty() && self.newly_disconnected.is_empty()
    }
}

/// Full records for a tick's transitions, grouped by direction.
#[derive(Debug, Clone, Default)]
pub struct PeerChanges {
    pub connected: Vec<PeerRecord>,
    pub disconnected: Vec<PeerRecord>,
}

impl PeerChanges {
    /// Looks up every changed name in the current snapshot.
    ///
    /// A previously connected peer that no longer appears in the report at
    /// all (removed from the interface) has no record to log; it is dropped
    /// from the grouping with a warning instead of failing the tick.
    pub fn collect(diff: &StateDiff, snapshot: &Snapshot) -> Self {
        let mut changes = Self::default();
        for name in &diff.newly_connected {
            if let Some(record) = snapshot.get(name) {
                changes.connected.push(record.clone());
            }
        }
        for name in &diff.newly_disconnected {
            match snapshot.get(name) {
                Some(record) => changes.disconnected.push(record.clone()),
                None => {
                    tracing::warn!(peer = %name, "peer left the interface, omitting from transition report");
                }
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.connected.is_empty() && self.disconnected.is_empty()
    }
}

/// A single connectivity transition, fixed at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionEvent {
    /// true when the peer came up, false when it dropped.
    pub connected: bool,
    pub name: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_ip: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl TransitionEvent {
    pub fn now(record: &PeerRecord, connected: bool) -> Self {
        Self {
            connected,
            name: record.name.clone(),
            ip: record.ip.clone(),
            endpoint_ip: record.endpoint.as_ref().map(|ep| ep.ip.clone()),
            timestamp: Local::now(),
        }
    }

    pub fn status_tag(&self) -> &'static str {
        if self.connected { "[+] UP" } else { "[-] DOWN" }
    }
}

impl fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] from [{}] - {}",
            self.status_tag(),
            self.name,
            self.ip,
            self.endpoint_ip.as_deref().unwrap_or("unknown"),
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::core::peer::{Endpoint, Transfer, TransferAmount};

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn record(name: &str, endpoint: Option<Endpoint>) -> PeerRecord {
        PeerRecord {
            name: name.to_string(),
            ip: "10.0.0.2".to_string(),
            endpoint,
            connected: true,
            last_handshake_seconds: 0,
            transfer: Transfer {
                received: TransferAmount::new("0", "B"),
                sent: TransferAmount::new("0", "B"),
            },
            public_key: None,
        }
    }

    #[test]
    fn diff_splits_both_directions() {
        let diff = StateDiff::between(&names(&["alice", "bob"]), &names(&["bob", "carol"]));
        assert_eq!(diff.newly_connected, names(&["carol"]));
        assert_eq!(diff.newly_disconnected, names(&["alice"]));
    }

    #[test]
    fn equal_sets_diff_to_empty() {
        let set = names(&["alice", "bob"]);
        assert!(StateDiff::between(&set, &set).is_empty());
    }

    #[test]
    fn collect_drops_peers_missing_from_snapshot() {
        let diff = StateDiff::between(&names(&["ghost"]), &BTreeSet::new());
        let changes = PeerChanges::collect(&diff, &Snapshot::new());
        assert!(changes.is_empty());
    }

    #[test]
    fn up_line_includes_endpoint_ip() {
        let endpoint = Endpoint {
            ip: "203.0.113.9".to_string(),
            port: "51820".to_string(),
        };
        let mut event = TransitionEvent::now(&record("alice", Some(endpoint)), true);
        event.timestamp = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            event.to_string(),
            "[+] UP alice [10.0.0.2] from [203.0.113.9] - 2025-01-02 03:04:05"
        );
    }

    #[test]
    fn down_line_without_endpoint_reads_unknown() {
        let mut event = TransitionEvent::now(&record("bob", None), false);
        event.timestamp = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            event.to_string(),
            "[-] DOWN bob [10.0.0.2] from [unknown] - 2025-01-02 03:04:05"
        );
    }
}
