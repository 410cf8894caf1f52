//! Operator decisions and the per-stage state machine states.

/// Reply to "proceed with this stage?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceedDecision {
    Proceed,
    Skip,
    Quit,
}

impl ProceedDecision {
    /// Parse an operator reply. Returns `None` for anything unrecognized.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" | "proceed" => Some(Self::Proceed),
            "s" | "skip" => Some(Self::Skip),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Reply to "apply this response?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyDecision {
    Apply,
    Retry,
    Discard,
}

impl ApplyDecision {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" | "apply" => Some(Self::Apply),
            "r" | "retry" => Some(Self::Retry),
            "n" | "no" | "discard" => Some(Self::Discard),
            _ => None,
        }
    }
}

/// States of a single stage while the controller drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageState {
    AwaitingProceedDecision,
    Calling,
    /// Holds the response text returned by the service.
    AwaitingApplyDecision(String),
    Committed,
    SkippedOrDiscarded,
    Aborted,
}

impl StageState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageState::Committed | StageState::SkippedOrDiscarded | StageState::Aborted
        )
    }
}

/// How a stage ended, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Applied: files written and output recorded.
    Committed,
    /// Skipped before calling the service; nothing recorded.
    Skipped,
    /// Response recorded as context, nothing written.
    Discarded,
    /// Operator quit; the run stops here.
    Aborted,
}
