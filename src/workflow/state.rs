//! Pure workflow state and transition table
//!
//! Two signals feed the machine: the cosmetic dwell timer (`Tick`) and the
//! real submission outcome. `Complete` requires both the last step to have
//! dwelled and a result id to be bound, whichever happens later.

use serde::Serialize;

/// Number of narrated processing steps
pub const STEP_COUNT: u8 = 5;

/// Index of the final processing step
pub const LAST_STEP: u8 = STEP_COUNT - 1;

/// Labels for the narrated steps, in order
pub const PROCESSING_STEPS: [&str; STEP_COUNT as usize] = [
    "Reading your document",
    "Analyzing medical content",
    "Simplifying the language",
    "Preparing follow-up Q&A",
    "Ready to review and export",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Uploading,
    Processing { step: u8 },
    Complete { result_id: String },
    Failed { reason: String },
}

/// Inputs to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// User started a submission
    Submit,
    /// Dwell timer elapsed
    Tick,
    SubmissionSucceeded { result_id: String },
    SubmissionFailed { reason: String },
    /// Teardown or explicit cancellation
    Cancel,
    /// User dismissed a failure
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    phase: Phase,
    result_id: Option<String>,
    #[serde(skip)]
    last_step_dwelled: bool,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            result_id: None,
            last_step_dwelled: false,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current step, only while processing
    pub fn step_index(&self) -> Option<u8> {
        match self.phase {
            Phase::Processing { step } => Some(step),
            _ => None,
        }
    }

    /// Bound once the submission succeeds, possibly before `Complete`
    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// A submission is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Uploading | Phase::Processing { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete { .. })
    }

    /// Where navigation should go once the interpretation is ready
    pub fn completion_route(&self) -> Option<String> {
        match &self.phase {
            Phase::Complete { result_id } => Some(format!("/interpret/{}", result_id)),
            _ => None,
        }
    }

    /// Apply an event. Returns `true` if the visible state changed.
    ///
    /// Events that make no sense in the current phase are ignored.
    pub fn apply(&mut self, event: WorkflowEvent) -> bool {
        use WorkflowEvent as E;

        let next = match (&self.phase, event) {
            (Phase::Idle, E::Submit) => {
                self.result_id = None;
                self.last_step_dwelled = false;
                Some(Phase::Uploading)
            }

            (Phase::Uploading, E::Tick) => Some(Phase::Processing { step: 0 }),
            (Phase::Uploading, E::SubmissionSucceeded { result_id }) => {
                self.result_id = Some(result_id);
                Some(Phase::Processing { step: 0 })
            }

            (Phase::Processing { step }, E::Tick) if *step < LAST_STEP => {
                Some(Phase::Processing { step: step + 1 })
            }
            (Phase::Processing { .. }, E::Tick) => {
                self.last_step_dwelled = true;
                self.try_complete()
            }
            (Phase::Processing { .. }, E::SubmissionSucceeded { result_id }) => {
                if self.result_id.is_none() {
                    self.result_id = Some(result_id);
                }
                self.try_complete()
            }

            (Phase::Uploading | Phase::Processing { .. }, E::SubmissionFailed { reason }) => {
                self.result_id = None;
                Some(Phase::Failed { reason })
            }
            (Phase::Uploading | Phase::Processing { .. }, E::Cancel) => {
                self.result_id = None;
                self.last_step_dwelled = false;
                Some(Phase::Idle)
            }

            (Phase::Failed { .. }, E::Reset) => {
                self.result_id = None;
                self.last_step_dwelled = false;
                Some(Phase::Idle)
            }

            _ => None,
        };

        match next {
            Some(phase) if phase != self.phase => {
                tracing::debug!(from = ?self.phase, to = ?phase, "Workflow transition");
                self.phase = phase;
                true
            }
            _ => false,
        }
    }

    /// `Complete` only once the last step has dwelled and a result is bound
    fn try_complete(&self) -> Option<Phase> {
        match (&self.phase, &self.result_id) {
            (Phase::Processing { step }, Some(result_id))
                if *step == LAST_STEP && self.last_step_dwelled =>
            {
                Some(Phase::Complete {
                    result_id: result_id.clone(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowEvent as E;

    fn succeeded(id: &str) -> WorkflowEvent {
        E::SubmissionSucceeded {
            result_id: id.to_string(),
        }
    }

    fn assert_invariant(state: &WorkflowState) {
        if let Phase::Complete { result_id } = state.phase() {
            assert_eq!(state.result_id(), Some(result_id.as_str()));
        }
    }

    #[test]
    fn test_happy_path() {
        let mut state = WorkflowState::new();
        assert!(state.apply(E::Submit));
        assert_eq!(state.phase(), &Phase::Uploading);

        assert!(state.apply(succeeded("r-9")));
        assert_eq!(state.step_index(), Some(0));
        assert_eq!(state.result_id(), Some("r-9"));

        for expected in 1..=LAST_STEP {
            assert!(state.apply(E::Tick));
            assert_eq!(state.step_index(), Some(expected));
        }
        assert!(state.completion_route().is_none());

        assert!(state.apply(E::Tick));
        assert_eq!(
            state.phase(),
            &Phase::Complete {
                result_id: "r-9".to_string()
            }
        );
        assert_eq!(state.completion_route().as_deref(), Some("/interpret/r-9"));
    }

    #[test]
    fn test_holds_at_last_step_until_result() {
        let mut state = WorkflowState::new();
        state.apply(E::Submit);
        for _ in 0..20 {
            state.apply(E::Tick);
            assert_invariant(&state);
            assert!(!state.is_complete());
        }
        assert_eq!(state.step_index(), Some(LAST_STEP));
        assert!(state.result_id().is_none());

        assert!(state.apply(succeeded("late")));
        assert!(state.is_complete());
        assert_eq!(state.result_id(), Some("late"));
    }

    #[test]
    fn test_completion_takes_later_of_both_signals() {
        // result arrives after `k` ticks; the last step dwells after STEP_COUNT + 1 ticks
        for k in 0..=10u8 {
            let mut state = WorkflowState::new();
            state.apply(E::Submit);
            let mut completed_at = None;

            for tick in 1..=12u8 {
                if tick - 1 == k {
                    state.apply(succeeded("r"));
                    assert_invariant(&state);
                    if state.is_complete() && completed_at.is_none() {
                        completed_at = Some(tick - 1);
                    }
                }
                state.apply(E::Tick);
                assert_invariant(&state);
                if state.is_complete() && completed_at.is_none() {
                    completed_at = Some(tick);
                }
            }

            // a result before the first tick enters step 0 early, shifting the sequence by one
            let expected = if k == 0 { STEP_COUNT } else { k.max(STEP_COUNT + 1) };
            assert_eq!(completed_at, Some(expected), "result after {} ticks", k);
        }
    }

    #[test]
    fn test_complete_is_absorbing() {
        let mut state = WorkflowState::new();
        state.apply(E::Submit);
        state.apply(succeeded("done"));
        for _ in 0..STEP_COUNT {
            state.apply(E::Tick);
        }
        assert!(state.is_complete());
        let snapshot = state.clone();

        for event in [
            E::Tick,
            E::Submit,
            succeeded("other"),
            E::SubmissionFailed {
                reason: "x".to_string(),
            },
            E::Cancel,
            E::Reset,
        ] {
            assert!(!state.apply(event));
            assert_eq!(state, snapshot);
        }
    }

    #[test]
    fn test_failure_is_terminal_until_reset() {
        let mut state = WorkflowState::new();
        state.apply(E::Submit);
        state.apply(E::Tick);
        state.apply(E::SubmissionFailed {
            reason: "bad doc".to_string(),
        });
        assert_eq!(state.failure_reason(), Some("bad doc"));

        assert!(!state.apply(E::Submit));
        assert!(!state.apply(E::Tick));
        assert!(!state.apply(E::Cancel));

        assert!(state.apply(E::Reset));
        assert_eq!(state.phase(), &Phase::Idle);
        assert!(state.apply(E::Submit));
    }

    #[test]
    fn test_cancel_discards_bound_result() {
        let mut state = WorkflowState::new();
        state.apply(E::Submit);
        state.apply(succeeded("partial"));
        state.apply(E::Tick);

        assert!(state.apply(E::Cancel));
        assert_eq!(state.phase(), &Phase::Idle);
        assert!(state.result_id().is_none());
    }

    #[test]
    fn test_submit_ignored_while_busy() {
        let mut state = WorkflowState::new();
        state.apply(E::Submit);
        assert!(state.is_busy());
        assert!(!state.apply(E::Submit));
        assert_eq!(state.phase(), &Phase::Uploading);
    }
}
