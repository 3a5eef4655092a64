/// Session phases, in order.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Waiting,
    Instructions,
    Trial,
    Saving,
    Debrief,
    Finished,
}

impl SessionPhase {
    /// Phase that follows this one. Instructions and trials alternate until
    /// the driver moves to `Saving`, so `Trial` loops back to `Instructions`.
    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Waiting => Instructions,
            Instructions => Trial,
            Trial => Instructions,
            Saving => Debrief,
            Debrief => Finished,
            Finished => return None,
        })
    }
}
