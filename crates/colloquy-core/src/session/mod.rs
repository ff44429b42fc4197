//! Session lifecycle and history storage

mod store;

pub use store::{Session, SessionError, SessionStore, TurnLock};
