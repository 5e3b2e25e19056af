/// Signup orchestration: a guarded three-phase state machine over the
/// identity and profile stores
mod orchestrator;

pub use orchestrator::SignupOrchestrator;

use crate::db::models::{Account, Session};
use serde::{Deserialize, Serialize};

/// Outcome of a successful credentials step: the caller is signed in and
/// parked at the profile step
#[derive(Debug)]
pub struct StartedSignup {
    pub step: SignupStep,
    pub account: Account,
    pub session: Session,
}

/// Where a signup currently stands
///
/// The server holds no per-signup state; the step is derived from storage
/// (does the authenticated account have a profile yet) plus the caller's
/// position in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupStep {
    Credentials,
    Profile,
    Avatar,
    Complete,
}

impl SignupStep {
    /// The legal edges: linear forward, one step back, never a skip
    pub fn can_transition_to(self, next: SignupStep) -> bool {
        use SignupStep::*;
        matches!(
            (self, next),
            (Credentials, Profile)
                | (Profile, Avatar)
                | (Avatar, Complete)
                | (Profile, Credentials)
                | (Avatar, Profile)
        )
    }

    pub const ALL: [SignupStep; 4] = [
        SignupStep::Credentials,
        SignupStep::Profile,
        SignupStep::Avatar,
        SignupStep::Complete,
    ];
}
