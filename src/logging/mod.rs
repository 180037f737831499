pub mod transitions;

pub use transitions::{LogError, TransitionLog};
