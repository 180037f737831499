use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// All peers observed in one polling tick, keyed by resolved peer name.
///
/// Built fresh every tick; only the connected-name set survives into the
/// next tick.
pub type Snapshot = BTreeMap<String, PeerRecord>;

/// One peer as reported by a single `wg show` sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub name: String,
    /// Allowed-address of the peer with the CIDR suffix stripped.
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    /// Derived: true iff the last handshake is recent enough.
    pub connected: bool,
    /// Seconds since the last handshake, where 0 means "just now".
    pub last_handshake_seconds: u64,
    pub transfer: Transfer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Remote address the peer last connected from. Absent for peers that have
/// never completed a handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: String,
    pub port: String,
}

/// Byte counters exactly as reported by the interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub received: TransferAmount,
    pub sent: TransferAmount,
}

/// A single reported quantity. The amount is kept as the source text
/// ("1.20" stays "1.20", not 1.2) so persisted snapshots never reformat
/// what the interface printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferAmount {
    pub amount: String,
    pub unit: String,
}

impl TransferAmount {
    pub fn new(amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            unit: unit.into(),
        }
    }
}

/// Names of all peers in the snapshot currently classified as connected.
pub fn connected_names(snapshot: &Snapshot) -> BTreeSet<String> {
    snapshot
        .values()
        .filter(|peer| peer.connected)
        .map(|peer| peer.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, connected: bool) -> PeerRecord {
        PeerRecord {
            name: name.to_string(),
            ip: "10.0.0.2".to_string(),
            endpoint: None,
            connected,
            last_handshake_seconds: 0,
            transfer: Transfer {
                received: TransferAmount::new("0", "B"),
                sent: TransferAmount::new("0", "B"),
            },
            public_key: None,
        }
    }

    #[test]
    fn connected_names_filters_disconnected_peers() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("alice".to_string(), record("alice", true));
        snapshot.insert("bob".to_string(), record("bob", false));

        let names = connected_names(&snapshot);
        assert_eq!(names.len(), 1);
        assert!(names.contains("alice"));
    }

    #[test]
    fn absent_endpoint_is_omitted_from_json() {
        let json = serde_json::to_string(&record("alice", true)).unwrap();
        assert!(!json.contains("endpoint"));
        assert!(!json.contains("public_key"));
    }
}
