use crate::core::names::PeerDirectory;
use crate::core::peer::{Endpoint, PeerRecord, Snapshot, Transfer, TransferAmount};
use crate::protocol::{ParseError, handshake};

/// Interface banner lines preceding the first peer block.
pub const HEADER_LINES: usize = 3;

/// A block without all three markers belongs to a peer that has never
/// completed a handshake.
const BLOCK_MARKERS: [&str; 3] = ["allowed ips", "latest handshake", "transfer"];

/// Parses one `wg show` report into a snapshot keyed by resolved name.
///
/// Blocks missing a required marker are skipped silently; accepted blocks
/// that fail field parsing are skipped with a warning so one garbled peer
/// cannot fail the whole tick. Empty input is an empty snapshot.
pub fn parse_report(raw: &str, names: &PeerDirectory) -> Result<Snapshot, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Snapshot::new());
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < HEADER_LINES {
        return Err(ParseError::MissingHeader);
    }

    let body = lines[HEADER_LINES..].join("\n");
    let mut peers = Snapshot::new();
    for block in body.split("\n\n") {
        if !BLOCK_MARKERS.iter().all(|marker| block.contains(marker)) {
            continue;
        }
        match parse_block(block, names) {
            Ok(record) => {
                peers.insert(record.name.clone(), record);
            }
            Err(err) => tracing::warn!(%err, "skipping unparseable peer block"),
        }
    }
    Ok(peers)
}

fn parse_block(block: &str, names: &PeerDirectory) -> Result<PeerRecord, ParseError> {
    let mut public_key = None;
    let mut ip = None;
    let mut endpoint = None;
    let mut age = None;
    let mut transfer = None;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(ParseError::UnkeyedLine(line.to_string()));
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "peer" => public_key = Some(value.to_string()),
            "allowed ips" => ip = Some(strip_cidr(value).to_string()),
            "latest handshake" => age = Some(handshake::parse_handshake_age(value)?),
            "transfer" => transfer = Some(parse_transfer(value)?),
            "endpoint" => endpoint = Some(parse_endpoint(value)?),
            _ => {}
        }
    }

    let ip = ip.ok_or(ParseError::MissingField("allowed ips"))?;
    let age = age.ok_or(ParseError::MissingField("latest handshake"))?;
    let transfer = transfer.ok_or(ParseError::MissingField("transfer"))?;

    Ok(PeerRecord {
        name: names.name_for(&ip).to_string(),
        ip,
        endpoint,
        connected: handshake::is_recent(age),
        last_handshake_seconds: age,
        transfer,
        public_key,
    })
}

/// Allowed addresses carry a CIDR suffix ("10.0.0.2/32"); only the address
/// before the first slash identifies the peer.
fn strip_cidr(value: &str) -> &str {
    match value.split_once('/') {
        Some((ip, _)) => ip,
        None => value,
    }
}

/// Both halves of "1.20 MiB received, 3.40 KiB sent". Assignment trusts
/// the printed keywords and only falls back to the printed order
/// (received first) when a keyword is unrecognized.
fn parse_transfer(value: &str) -> Result<Transfer, ParseError> {
    let bad = || ParseError::BadTransfer(value.to_string());
    let (first, second) = value.split_once(", ").ok_or_else(bad)?;
    let (first, first_keyword) = parse_transfer_half(first).ok_or_else(bad)?;
    let (second, second_keyword) = parse_transfer_half(second).ok_or_else(bad)?;

    if first_keyword == "sent" || second_keyword == "received" {
        Ok(Transfer {
            received: second,
            sent: first,
        })
    } else {
        Ok(Transfer {
            received: first,
            sent: second,
        })
    }
}

fn parse_transfer_half(half: &str) -> Option<(TransferAmount, &str)> {
    let mut words = half.split_whitespace();
    let amount = words.next()?;
    let unit = words.next()?;
    let keyword = words.next().unwrap_or("");
    Some((TransferAmount::new(amount, unit), keyword))
}

fn parse_endpoint(value: &str) -> Result<Endpoint, ParseError> {
    let mut parts = value.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(ip), Some(port), None) if !ip.is_empty() && !port.is_empty() => Ok(Endpoint {
            ip: ip.to_string(),
            port: port.to_string(),
        }),
        _ => Err(ParseError::BadEndpoint(value.to_string())),
    }
}
