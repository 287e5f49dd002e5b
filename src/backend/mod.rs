//! Remote query client for the video search backend.
//!
//! The backend is an opaque service exposing `POST /chat`. This module
//! defines the [`QueryBackend`] seam used by the transcript and the
//! [`HttpQueryClient`] that talks to the real service.

mod http;

pub use http::HttpQueryClient;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::transcript::ChatResponse;

/// Failure of one backend query.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("Backend error {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The request never got an answer (DNS, connect, reset).
    ///
    /// Displays the whole cause chain, so the root cause (e.g. a refused
    /// connection) reaches the user notice.
    #[error("{}", error_chain(.0))]
    Transport(#[from] reqwest::Error),

    /// The success body did not have the expected shape.
    #[error("Unexpected backend response: {0}")]
    Decode(String),

    /// The configured base URL cannot address `/chat`.
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Join an error and its sources with `": "`, skipping repeated messages.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !text.contains(&message) {
            text.push_str(": ");
            text.push_str(&message);
        }
        source = cause.source();
    }
    text
}

/// Sends one user query and returns the backend's answer.
#[async_trait]
pub trait QueryBackend: Send + Sync + fmt::Debug {
    /// Query the backend with the user's text.
    async fn query(&self, message: &str) -> Result<ChatResponse, BackendError>;
}
