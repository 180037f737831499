use crate::protocol::ParseError;

/// Oldest handshake age, in seconds, still classified as connected.
///
/// A live tunnel renews its handshake at least every two minutes; the
/// extra ten seconds absorb polling jitter.
pub const RECENT_HANDSHAKE_MAX_AGE: u64 = 130;

/// Turns a textual handshake age ("5 minutes, 3 seconds ago") into total
/// seconds. The literal `Now` means zero regardless of anything else on
/// the line.
pub fn parse_handshake_age(value: &str) -> Result<u64, ParseError> {
    let trimmed = value.trim();
    if trimmed.contains("Now") {
        return Ok(0);
    }

    let mut total = 0u64;
    for token in trimmed.trim_end_matches(" ago").split(", ") {
        let mut words = token.split_whitespace();
        let (Some(count), Some(label)) = (words.next(), words.next()) else {
            return Err(ParseError::BadHandshake(value.to_string()));
        };
        let count: u64 = count
            .parse()
            .map_err(|_| ParseError::BadHandshake(value.to_string()))?;
        total = count
            .checked_mul(unit_seconds(label))
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(|| ParseError::BadHandshake(value.to_string()))?;
    }
    Ok(total)
}

/// Seconds per reported unit. Labels outside the day range contribute
/// nothing, matching the interface's own wording.
fn unit_seconds(label: &str) -> u64 {
    match label.trim_end_matches('s') {
        "second" => 1,
        "minute" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        _ => 0,
    }
}

pub fn is_recent(total_seconds: u64) -> bool {
    total_seconds <= RECENT_HANDSHAKE_MAX_AGE
}
