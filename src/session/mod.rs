//! Session lifecycle
//!
//! Owns the bearer token and the signed-in user profile, persists the
//! token across process restarts, and drives the
//! `Unauthenticated → Verifying → Authenticated` state machine.

mod store;
mod store_file;

pub use store::{LoginOutcome, SessionStatus, SessionStore, UserProfile};
pub use store_file::SessionFile;
