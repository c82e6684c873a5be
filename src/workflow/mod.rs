//! Document workflow
//!
//! ```text
//! Idle ──submit──▶ Uploading ──▶ Processing(0..4) ──▶ Complete(result_id)
//!                      │                │
//!                      └──── failure ───┴──▶ Failed(reason) ──reset──▶ Idle
//! ```
//!
//! The dwell timer and the network call run side by side; see [`state`] for
//! the rule that joins them.

pub mod state;

pub use state::{Phase, WorkflowEvent, WorkflowState, LAST_STEP, PROCESSING_STEPS, STEP_COUNT};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::{AbortSignal, ApiClient, InterpretationRecord};
use crate::context::Language;
use crate::error::{ApiError, WorkflowError};
use crate::validation::{validate_file, FileHandle, Validation};

/// One document's trip from upload to a reviewable interpretation
///
/// Owns its state and, once bound, its record. A new document needs a new
/// `Workflow` once this one has completed.
pub struct Workflow {
    client: Arc<ApiClient>,
    state: watch::Sender<WorkflowState>,
    record: Option<InterpretationRecord>,
    abort: AbortSignal,
    step_interval: Duration,
}

impl Workflow {
    pub fn new(client: Arc<ApiClient>) -> Self {
        let step_interval = client.config().step_interval;
        let (state, _) = watch::channel(WorkflowState::new());

        Self {
            client,
            state,
            record: None,
            abort: AbortSignal::new(),
            step_interval,
        }
    }

    /// Receive every visible state change
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// The interpretation, once the submission has succeeded
    pub fn record(&self) -> Option<&InterpretationRecord> {
        self.record.as_ref()
    }

    /// Signal that cancels the running submission from elsewhere (view teardown)
    pub fn abort_handle(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// Whether a new submission would be rejected as busy
    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    /// Return a failed workflow to `Idle`
    pub fn reset(&mut self) -> bool {
        let changed = self.apply(WorkflowEvent::Reset);
        if changed {
            self.record = None;
        }
        changed
    }

    /// Abandon an outstanding submission and return to `Idle`
    ///
    /// Only reachable once the `submit` future has been dropped, so there is
    /// no request left to signal; any stale abort is cleared as well.
    pub fn cancel(&mut self) -> bool {
        let changed = self.apply(WorkflowEvent::Cancel);
        if changed {
            self.abort.reset();
            self.record = None;
        }
        changed
    }

    /// Consume a fired abort signal, returning the workflow to `Idle`
    fn cancelled(&mut self) -> WorkflowError {
        self.abort.reset();
        self.record = None;
        self.apply(WorkflowEvent::Cancel);
        ApiError::Cancelled.log("submit");
        ApiError::Cancelled.into()
    }

    fn apply(&self, event: WorkflowEvent) -> bool {
        self.state.send_if_modified(|state| state.apply(event))
    }

    /// Submit a document and drive the workflow to `Complete` or `Failed`
    ///
    /// A file that fails validation is rejected without leaving `Idle`.
    /// An abort fired before the call is honoured once: this submission
    /// returns `Cancelled` without uploading. Dropping the returned future
    /// cancels the request and the dwell timer.
    pub async fn submit(
        &mut self,
        file: FileHandle,
        locale: Option<Language>,
    ) -> Result<InterpretationRecord, WorkflowError> {
        {
            let state = self.state.borrow();
            match state.phase() {
                Phase::Idle => {}
                Phase::Uploading | Phase::Processing { .. } => return Err(WorkflowError::Busy),
                Phase::Complete { .. } | Phase::Failed { .. } => {
                    return Err(WorkflowError::Finished)
                }
            }
        }

        if self.abort.is_aborted() {
            return Err(self.cancelled());
        }

        if let Validation::Invalid { reason } = validate_file(Some(&file)) {
            let err = ApiError::Validation(reason);
            err.log("submit");
            return Err(err.into());
        }

        self.record = None;
        self.apply(WorkflowEvent::Submit);

        let client = Arc::clone(&self.client);
        let request_abort = self.abort.clone();
        let submission = async move {
            client
                .interpret_document(&file, locale, Some(&request_abort))
                .await
        };
        tokio::pin!(submission);

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.step_interval, self.step_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let abort = self.abort.clone();
        let mut submission_pending = true;

        loop {
            tokio::select! {
                result = &mut submission, if submission_pending => {
                    submission_pending = false;
                    match result {
                        Ok(record) => {
                            let result_id = record.id.clone();
                            self.record = Some(record);
                            self.apply(WorkflowEvent::SubmissionSucceeded { result_id });
                        }
                        Err(ApiError::Cancelled) => return Err(self.cancelled()),
                        Err(e) => {
                            let reason = e.user_message().unwrap_or_default();
                            self.apply(WorkflowEvent::SubmissionFailed { reason });
                            return Err(e.into());
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.apply(WorkflowEvent::Tick);
                }
                _ = abort.cancelled() => return Err(self.cancelled()),
            }

            let completed = match (self.state.borrow().phase(), &self.record) {
                (Phase::Complete { .. }, Some(record)) => Some(record.clone()),
                _ => None,
            };
            if let Some(record) = completed {
                tracing::info!(interpretation_id = %record.id, "Workflow complete");
                return Ok(record);
            }
        }
    }
}

impl Drop for Workflow {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
