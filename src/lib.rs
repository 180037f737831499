//! Connectivity monitor for a WireGuard mesh.
//!
//! Samples peer handshake state from `wg show`, classifies peers as
//! connected or disconnected by handshake recency, detects transitions
//! between polling ticks, persists the latest snapshot atomically and
//! forwards transition batches to an optional webhook under a cooldown.

pub mod config;
pub mod core;
pub mod logging;
pub mod net;
pub mod protocol;
pub mod render;
pub mod storage;
