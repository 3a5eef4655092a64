use serde::{Deserialize, Serialize};

/// Trial lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Created,
    Setup,
    Running,
    AnimationComplete,
    ResponseCollected,
    Cleared,
}

/// Answers to the probe questionnaire, verbatim as clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub noticed: String,
    pub shape: String,
    pub color: String,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial_id: usize,
    /// Bounces made by the attended-colour tracked objects.
    pub bounces: u32,
    /// Participant's reported count.
    pub count: u32,
    pub probe: Option<ProbeReport>,
}
