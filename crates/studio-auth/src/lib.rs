//! End-user session management for the studio client.
//!
//! [`SessionManager`] holds the single signed-in session, persists it through
//! a [`studio_storage::SessionStore`], and notifies subscribers with
//! [`AuthChangeEvent`]s. Its [`SessionManager::send`] wrapper is the only way
//! requests reach the custom backend with the user's bearer token; the
//! PostgREST client never sees that token.

mod error;
mod events;
mod manager;
mod session_fsm;
mod types;

pub use error::{AuthError, AuthResult};
pub use events::{AuthCallback, AuthChangeEvent, Subscription};
pub use manager::{read_json, SessionManager};
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionStatus};
pub use types::{SessionData, UserData};
