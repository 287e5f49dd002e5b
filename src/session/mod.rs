//! Per-page-view session management.
//!
//! Every page load gets its own [`Session`] holding one transcript. Sessions
//! live in memory only and are swept once idle.
//!
//! # Architecture
//!
//! - [`Session`]: one page view's transcript
//! - [`SessionStore`]: thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use video_gpt::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! session.transcript().set_input("learn python decorators");
//!
//! assert!(session.transcript().can_send());
//! assert_eq!(store.len(), 1);
//! ```

mod thread;

pub use thread::{Session, SessionStore};
