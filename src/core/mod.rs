pub mod diff;
pub mod monitor;
pub mod names;
pub mod peer;

pub use diff::{PeerChanges, StateDiff, TransitionEvent};
pub use monitor::WgMonitor;
pub use names::PeerDirectory;
pub use peer::{PeerRecord, Snapshot};
