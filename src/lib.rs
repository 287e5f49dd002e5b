//! Video-GPT chat front end.
//!
//! An HTML-first chat page that forwards text queries to a video search
//! backend (`POST {BACKEND}/chat`) and renders the returned videos as cards.
//!
//! # Architecture
//!
//! - **Server**: Axum routes serving the page and the htmx submit action
//! - **Transcript**: append-only message state guarded by a single request slot
//! - **Backend**: reqwest client for the opaque `/chat` service
//! - **Render**: minijinja templates over locale-aware formatting
//!
//! # Modules
//!
//! - [`backend`]: remote query client
//! - [`config`]: layered configuration
//! - [`render`]: HTML rendering and number/date formatting
//! - [`server`]: HTTP routes and startup
//! - [`session`]: per-page-view transcript storage
//! - [`transcript`]: message model and transcript controller

pub mod backend;
pub mod config;
pub mod render;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod transcript;

use std::sync::Arc;

use crate::backend::{HttpQueryClient, QueryBackend};
use crate::config::AppConfig;
use crate::render::Renderer;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session store, one transcript per page view.
    pub sessions: SessionStore,
    /// Backend queries are sent to.
    pub backend: Arc<dyn QueryBackend>,
    /// Compiled page templates.
    pub renderer: Arc<Renderer>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state around an explicit backend.
    pub fn new(
        config: Arc<AppConfig>,
        backend: Arc<dyn QueryBackend>,
    ) -> Result<Self, minijinja::Error> {
        let renderer = Renderer::new(
            config.ui.locale,
            config.backend.base_url.clone(),
            config.ui.htmx_src.clone(),
        )?;

        Ok(Self {
            sessions: SessionStore::new(),
            backend,
            renderer: Arc::new(renderer),
            config,
        })
    }

    /// Build state talking to the configured HTTP backend.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let backend = HttpQueryClient::new(&config.backend.base_url)?;
        Ok(Self::new(config, Arc::new(backend))?)
    }
}
