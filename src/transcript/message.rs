//! Transcript data model.

use serde::{Deserialize, Deserializer, Serialize};

/// Query label marking an assistant entry produced by a failed exchange.
pub const ERROR_SENTINEL: &str = "Error";

/// Query label of the greeting entry a fresh transcript starts with.
pub const GREETING_QUERY: &str = "Try: “learn python decorators”";

/// A single video result returned by the backend.
///
/// Only `video_id` and `url` are mandatory. Text fields the backend leaves
/// `null` decode as empty strings and missing counters decode as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Backend identifier of the video.
    pub video_id: String,
    /// Video title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Channel display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel: String,
    /// Publish timestamp (RFC 3339), possibly empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_at: String,
    /// Thumbnail image URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,
    /// View count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    /// Like count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: u64,
    /// Destination URL of the video page.
    pub url: String,
    /// Optional description snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Successful body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The query as echoed by the backend.
    pub query: String,
    /// Ordered results, empty when the backend omits the field.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Video>,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Text submitted by the user.
    User {
        /// Trimmed submitted text.
        text: String,
    },
    /// Answer to a submission, or the greeting.
    Assistant {
        /// Echoed query, or [`ERROR_SENTINEL`] for a failed exchange.
        query: String,
        /// Video results, possibly empty.
        videos: Vec<Video>,
    },
}

impl Message {
    /// Create a user entry.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    /// Create an assistant entry from a backend response.
    #[must_use]
    pub fn answer(response: ChatResponse) -> Self {
        Self::Assistant {
            query: response.query,
            videos: response.results,
        }
    }

    /// Create the sentinel entry recorded for a failed exchange.
    #[must_use]
    pub fn failure() -> Self {
        Self::Assistant {
            query: ERROR_SENTINEL.to_string(),
            videos: Vec::new(),
        }
    }

    /// Create the greeting entry.
    #[must_use]
    pub fn greeting() -> Self {
        Self::Assistant {
            query: GREETING_QUERY.to_string(),
            videos: Vec::new(),
        }
    }

    /// Whether this entry marks a failed exchange.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Assistant { query, .. } if query == ERROR_SENTINEL)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
