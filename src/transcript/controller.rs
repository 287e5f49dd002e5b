//! Transcript controller: message sequence, input buffer and pending state.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::backend::{BackendError, QueryBackend};

use super::guard::{PendingRequest, RequestGuard};
use super::message::{ChatResponse, Message};

/// Why a submission was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The trimmed input was empty.
    EmptyInput,
    /// Another request is still in flight.
    Pending,
}

/// Result of one call to [`TranscriptController::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was appended and no request was issued.
    Ignored(IgnoreReason),
    /// The backend answered; an assistant entry with the results was appended.
    Answered {
        /// Query echoed by the backend.
        query: String,
        /// Number of videos received.
        results: usize,
    },
    /// The exchange failed; the error sentinel was appended.
    Failed {
        /// Text to show the user in a blocking notification.
        notice: String,
    },
}

impl SubmitOutcome {
    /// The notification text of a failed exchange.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Failed { notice } => Some(notice),
            _ => None,
        }
    }
}

/// Consistent copy of the controller state, used for rendering.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSnapshot {
    /// All entries in append order.
    pub messages: Vec<Message>,
    /// Current input buffer.
    pub input: String,
    /// Whether a request is in flight.
    pub pending: bool,
}

impl TranscriptSnapshot {
    /// Whether a send would currently go through.
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.pending && !self.input.trim().is_empty()
    }
}

#[derive(Debug, Default)]
struct TranscriptState {
    messages: Vec<Message>,
    input: String,
}

/// Owns an append-only transcript and its request slot.
///
/// Every user entry is followed by exactly one assistant entry once its
/// request resolves; at most one request is in flight.
///
/// # Example
///
/// ```rust,ignore
/// let transcript = TranscriptController::new();
/// let outcome = transcript.submit("learn python decorators", &backend).await;
/// ```
#[derive(Debug)]
pub struct TranscriptController {
    state: RwLock<TranscriptState>,
    guard: RequestGuard,
}

impl Default for TranscriptController {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptController {
    /// Create a transcript seeded with the greeting entry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_messages(vec![Message::greeting()])
    }

    /// Create a transcript with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_messages(Vec::new())
    }

    fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            state: RwLock::new(TranscriptState {
                messages,
                input: String::new(),
            }),
            guard: RequestGuard::new(),
        }
    }

    /// All entries in append order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().messages.len()
    }

    /// Whether the transcript has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current input buffer.
    #[must_use]
    pub fn input(&self) -> String {
        self.read().input.clone()
    }

    /// Replace the input buffer.
    pub fn set_input(&self, text: impl Into<String>) {
        self.write().input = text.into();
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.guard.is_pending()
    }

    /// Whether a send would currently go through.
    #[must_use]
    pub fn can_send(&self) -> bool {
        self.snapshot().can_send()
    }

    /// Copy messages, input and pending state under one lock.
    #[must_use]
    pub fn snapshot(&self) -> TranscriptSnapshot {
        let state = self.read();
        TranscriptSnapshot {
            messages: state.messages.clone(),
            input: state.input.clone(),
            pending: self.guard.is_pending(),
        }
    }

    /// Open a submission from the input buffer.
    ///
    /// On success the trimmed text has been appended as a user entry, the
    /// input buffer is cleared and the request slot is held by the returned
    /// [`Submission`].
    pub fn begin(&self) -> Result<Submission<'_>, IgnoreReason> {
        self.open(None)
    }

    /// Send the input buffer to `backend` and record the answer.
    pub async fn send(&self, backend: &dyn QueryBackend) -> SubmitOutcome {
        match self.begin() {
            Ok(submission) => submission.run(backend).await,
            Err(reason) => SubmitOutcome::Ignored(reason),
        }
    }

    /// Place `text` in the input buffer and send it.
    ///
    /// While a request is pending the buffer is left untouched.
    pub async fn submit(&self, text: &str, backend: &dyn QueryBackend) -> SubmitOutcome {
        match self.open(Some(text.to_string())) {
            Ok(submission) => submission.run(backend).await,
            Err(reason) => SubmitOutcome::Ignored(reason),
        }
    }

    fn open(&self, replace_input: Option<String>) -> Result<Submission<'_>, IgnoreReason> {
        let mut state = self.write();
        let text = replace_input
            .as_deref()
            .unwrap_or(&state.input)
            .trim()
            .to_string();

        if text.is_empty() {
            if let Some(raw) = replace_input
                && !self.guard.is_pending()
            {
                state.input = raw;
            }
            return Err(IgnoreReason::EmptyInput);
        }
        let Some(slot) = self.guard.try_acquire() else {
            debug!("Submission ignored while a request is pending");
            return Err(IgnoreReason::Pending);
        };

        state.messages.push(Message::user(text.clone()));
        state.input.clear();

        Ok(Submission {
            transcript: self,
            text,
            slot: Some(slot),
        })
    }

    fn push(&self, message: Message) {
        self.write().messages.push(message);
    }

    fn read(&self) -> RwLockReadGuard<'_, TranscriptState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TranscriptState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An open exchange holding the request slot.
///
/// Completing it appends the assistant entry and frees the slot. Dropping it
/// without completing records the exchange as failed.
#[derive(Debug)]
#[must_use = "dropping a submission records the exchange as failed"]
pub struct Submission<'a> {
    transcript: &'a TranscriptController,
    text: String,
    slot: Option<PendingRequest<'a>>,
}

impl Submission<'_> {
    /// The trimmed text that was submitted.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Record the backend result and free the request slot.
    pub fn complete(mut self, result: Result<ChatResponse, BackendError>) -> SubmitOutcome {
        let (message, outcome) = match result {
            Ok(response) => {
                let outcome = SubmitOutcome::Answered {
                    query: response.query.clone(),
                    results: response.results.len(),
                };
                (Message::answer(response), outcome)
            }
            Err(err) => {
                warn!(error = %err, "Chat query failed");
                let outcome = SubmitOutcome::Failed {
                    notice: err.to_string(),
                };
                (Message::failure(), outcome)
            }
        };

        self.transcript.push(message);
        self.slot = None;
        outcome
    }

    async fn run(self, backend: &dyn QueryBackend) -> SubmitOutcome {
        let result = backend.query(&self.text).await;
        self.complete(result)
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if self.slot.is_some() {
            warn!(text = %self.text, "Submission abandoned before the backend answered");
            self.transcript.push(Message::failure());
        }
    }
}
