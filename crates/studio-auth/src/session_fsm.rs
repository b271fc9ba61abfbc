//! Session state machine using rust-fsm.
//!
//! ```text
//!              SessionSaved / SessionRestored
//!   Anonymous ────────────────────────────────► Authenticated
//!       ▲                                            │
//!       └──────────── SignedOut / Unauthorized ──────┘
//! ```
//!
//! Every input is accepted in both states so that repeated saves and
//! sign-outs are no-ops rather than errors.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Anonymous)

    Anonymous => {
        SessionSaved => Authenticated,
        SessionRestored => Authenticated,
        SignedOut => Anonymous,
        Unauthorized => Anonymous
    },
    Authenticated => {
        SessionSaved => Authenticated,
        SessionRestored => Authenticated,
        SignedOut => Anonymous,
        Unauthorized => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated)
    }
}

impl From<&SessionMachineState> for SessionStatus {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Anonymous => SessionStatus::Anonymous,
            SessionMachineState::Authenticated => SessionStatus::Authenticated,
        }
    }
}
