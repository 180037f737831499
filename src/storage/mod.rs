pub mod state;

pub use state::{Ownership, PersistError, StateStore};
