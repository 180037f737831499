use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Name reported for peers whose allowed address has no map entry.
pub const UNKNOWN_PEER: &str = "Unknown peer";

/// Static allowed-address to human-name lookup, loaded once at startup
/// from a JSON object (`"10.0.0.2": "alice"`).
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    names: HashMap<String, String>,
}

impl PeerDirectory {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading peer name map {}", path.display()))?;
        let names = serde_json::from_str(&raw)
            .with_context(|| format!("parsing peer name map {}", path.display()))?;
        Ok(Self { names })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            names: entries
                .into_iter()
                .map(|(ip, name)| (ip.into(), name.into()))
                .collect(),
        }
    }

    /// Resolved name for an allowed address. Every unmapped address shares
    /// the [`UNKNOWN_PEER`] sentinel.
    pub fn name_for(&self, ip: &str) -> &str {
        self.names.get(ip).map(String::as_str).unwrap_or(UNKNOWN_PEER)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
