pub mod notifier;
pub mod source;

pub use notifier::{NotificationThrottle, Notify, NotifyError, Webhook};
pub use source::{CommandError, PeerSource, WgShowCommand};
