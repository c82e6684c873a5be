//! Follow-up Q&A about one interpretation
//!
//! A `ChatSession` lives as long as the view presenting the record and is
//! never persisted. Only one question may be in flight at a time, so the
//! transcript always reads in the order the user asked.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{AbortSignal, ApiClient};
use crate::context::Language;
use crate::error::{ApiError, ApiResult, ChatError};

/// Appended in place of an answer when the backend call fails
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Offered before the user has typed anything
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "What does this mean?",
    "What are the risks?",
    "What next?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
        }
    }
}

/// Proof that a question was accepted and is awaiting its answer
///
/// Holds the session's busy flag; dropping it, answered or not, frees the
/// session for the next question.
#[derive(Debug)]
pub struct PendingQuestion {
    question: String,
    busy: Arc<AtomicBool>,
}

impl PendingQuestion {
    pub fn question(&self) -> &str {
        &self.question
    }
}

impl Drop for PendingQuestion {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

pub struct ChatSession {
    interpretation_id: String,
    locale: Language,
    transcript: Vec<Message>,
    busy: Arc<AtomicBool>,
    abort: AbortSignal,
}

impl ChatSession {
    pub fn new(interpretation_id: impl Into<String>, locale: Language) -> Self {
        Self {
            interpretation_id: interpretation_id.into(),
            locale,
            transcript: Vec::new(),
            busy: Arc::new(AtomicBool::new(false)),
            abort: AbortSignal::new(),
        }
    }

    pub fn interpretation_id(&self) -> &str {
        &self.interpretation_id
    }

    pub fn locale(&self) -> Language {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Language) {
        self.locale = locale;
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// A question is awaiting its answer; input should be disabled
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn abort_handle(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// Accept a question and append it to the transcript
    pub fn begin_question(&mut self, question: &str) -> Result<PendingQuestion, ChatError> {
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        self.busy.store(true, Ordering::SeqCst);
        self.transcript.push(Message::new(Role::User, question));
        Ok(PendingQuestion {
            question: question.to_string(),
            busy: Arc::clone(&self.busy),
        })
    }

    /// Record the outcome of a pending question
    ///
    /// Failures append [`APOLOGY_MESSAGE`]; a cancelled question appends nothing.
    pub fn finish_question(
        &mut self,
        pending: PendingQuestion,
        outcome: ApiResult<String>,
    ) -> Option<&Message> {
        let content = match outcome {
            Ok(answer) => answer,
            Err(ApiError::Cancelled) => {
                tracing::debug!(question = %pending.question, "Question cancelled");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.interpretation_id,
                    kind = ?e.kind(),
                    "Answer unavailable, apologising"
                );
                APOLOGY_MESSAGE.to_string()
            }
        };

        self.transcript.push(Message::new(Role::Assistant, content));
        self.transcript.last()
    }

    /// Ask a question and wait for the answer to land in the transcript
    ///
    /// Dropping the returned future leaves the question unanswered, like a
    /// cancelled one, and the session accepts new questions straight away.
    pub async fn ask(&mut self, client: &ApiClient, question: &str) -> Result<&Message, ChatError> {
        let pending = self.begin_question(question)?;
        self.abort.reset();

        let outcome = client
            .ask_question(
                &self.interpretation_id,
                pending.question(),
                self.locale,
                Some(&self.abort),
            )
            .await;

        self.finish_question(pending, outcome)
            .ok_or(ChatError::Api(ApiError::Cancelled))
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
