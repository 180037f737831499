pub mod handshake;
pub mod report;

pub use handshake::{RECENT_HANDSHAKE_MAX_AGE, is_recent, parse_handshake_age};
pub use report::{HEADER_LINES, parse_report};

use thiserror::Error;

/// Failure to turn raw `wg show` text into peer records.
///
/// [`ParseError::MissingHeader`] rejects the whole report; every other
/// variant is block-level and skips only the block that produced it.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("report too short to contain the interface header")]
    MissingHeader,
    #[error("peer block is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("line has no key/value separator: {0:?}")]
    UnkeyedLine(String),
    #[error("unparseable handshake age: {0:?}")]
    BadHandshake(String),
    #[error("unparseable transfer counters: {0:?}")]
    BadTransfer(String),
    #[error("unparseable endpoint address: {0:?}")]
    BadEndpoint(String),
}
