//! Chat transcript state.
//!
//! # Architecture
//!
//! - [`Message`]: a user entry or an assistant entry carrying video results
//! - [`TranscriptController`]: owns the entries, the input buffer and the
//!   request slot, and drives one exchange with a [`QueryBackend`]
//! - [`RequestGuard`]: the single-slot guard behind the pending state
//!
//! [`QueryBackend`]: crate::backend::QueryBackend

mod controller;
mod guard;
mod message;

pub use controller::{
    IgnoreReason, SubmitOutcome, Submission, TranscriptController, TranscriptSnapshot,
};
pub use guard::{PendingRequest, RequestGuard};
pub use message::{ChatResponse, ERROR_SENTINEL, GREETING_QUERY, Message, Video};
