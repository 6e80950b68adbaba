use std::fmt;
use std::path::PathBuf;

use crate::types::HookEventPayload;

// ===================================================================
// Output: what a Stop hook should do with its stdin payload
// ===================================================================

#[derive(Debug, PartialEq, Eq)]
pub enum StopDecision {
    /// The payload did not parse. Never act on it.
    Malformed(String),
    /// `stop_hook_active` was `true` or missing.
    Suppressed,
    /// Go ahead; read the message from this transcript if there is one.
    Act { transcript_path: Option<PathBuf> },
}

impl fmt::Display for StopDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopDecision::Malformed(err) => write!(f, "malformed payload ({err})"),
            StopDecision::Suppressed => write!(f, "stop hook already active"),
            StopDecision::Act {
                transcript_path: Some(p),
            } => write!(f, "act on {}", p.display()),
            StopDecision::Act {
                transcript_path: None,
            } => write!(f, "act without transcript"),
        }
    }
}

// ===================================================================
// Pure entry point
// ===================================================================

pub fn decide_stop(input: &str) -> StopDecision {
    let payload: HookEventPayload = match serde_json::from_str(input) {
        Ok(p) => p,
        Err(e) => return StopDecision::Malformed(e.to_string()),
    };
    if !payload.may_act() {
        return StopDecision::Suppressed;
    }
    StopDecision::Act {
        transcript_path: payload
            .transcript_path
            .filter(|p| !p.is_empty())
            .map(PathBuf::from),
    }
}

#[cfg(test)]
mod tests;
