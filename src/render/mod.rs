//! Render surface: transcript state to HTML.
//!
//! Rendering is a pure function of a [`ChatView`]. Templates live in
//! `templates/` and are compiled into the binary; minijinja escapes every
//! interpolated value because the templates are `.html`.
//!
//! - [`Renderer::page`]: the full document
//! - [`Renderer::chat`]: the `#chat` region swapped in by htmx

pub mod format;

pub use format::{Locale, UnknownLocale, format_count, format_date};

use minijinja::{Environment, context};
use serde::Serialize;
use url::Url;

use crate::transcript::{Message, TranscriptSnapshot, Video};

const LAYOUT_TEMPLATE: &str = include_str!("../../templates/layout.html");
const CHAT_TEMPLATE: &str = include_str!("../../templates/chat.html");
const MESSAGE_TEMPLATE: &str = include_str!("../../templates/message.html");

/// Everything one render needs.
#[derive(Debug, Clone, Copy)]
pub struct ChatView<'a> {
    /// Session the form posts back to.
    pub session_id: &'a str,
    /// Transcript state to draw.
    pub transcript: &'a TranscriptSnapshot,
    /// One-shot failure notification, shown as a blocking alert.
    pub notice: Option<&'a str>,
}

/// Renders chat views with the configured locale.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
    locale: Locale,
    backend_url: String,
    htmx_src: String,
}

impl Renderer {
    /// Compile the templates.
    pub fn new(
        locale: Locale,
        backend_url: impl Into<String>,
        htmx_src: impl Into<String>,
    ) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("layout.html", LAYOUT_TEMPLATE)?;
        env.add_template("chat.html", CHAT_TEMPLATE)?;
        env.add_template("message.html", MESSAGE_TEMPLATE)?;

        Ok(Self {
            env,
            locale,
            backend_url: backend_url.into(),
            htmx_src: htmx_src.into(),
        })
    }

    /// Render the full page.
    pub fn page(&self, view: &ChatView<'_>) -> Result<String, minijinja::Error> {
        self.render("layout.html", view)
    }

    /// Render the `#chat` region only.
    pub fn chat(&self, view: &ChatView<'_>) -> Result<String, minijinja::Error> {
        self.render("chat.html", view)
    }

    fn render(&self, name: &str, view: &ChatView<'_>) -> Result<String, minijinja::Error> {
        let snapshot = view.transcript;
        let messages: Vec<MessageView<'_>> = snapshot
            .messages
            .iter()
            .map(|m| MessageView::new(m, self.locale))
            .collect();

        self.env.get_template(name)?.render(context! {
            lang => self.locale.language(),
            htmx_src => &self.htmx_src,
            backend_url => &self.backend_url,
            session_id => view.session_id,
            messages => messages,
            input => &snapshot.input,
            pending => snapshot.pending,
            notice => view.notice,
        })
    }
}

/// Display form of one transcript entry.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum MessageView<'a> {
    User { text: &'a str },
    Failure,
    Results { query: &'a str, cards: Vec<CardView<'a>> },
}

impl<'a> MessageView<'a> {
    fn new(message: &'a Message, locale: Locale) -> Self {
        match message {
            Message::User { text } => Self::User { text },
            Message::Assistant { .. } if message.is_failure() => Self::Failure,
            Message::Assistant { query, videos } => Self::Results {
                query,
                cards: videos.iter().map(|v| CardView::new(v, locale)).collect(),
            },
        }
    }
}

/// Display form of one video card.
#[derive(Debug, Serialize)]
struct CardView<'a> {
    /// Only `http`/`https` targets; anything else renders as a plain card.
    url: Option<&'a str>,
    title: &'a str,
    channel: &'a str,
    thumbnail: &'a str,
    description: Option<&'a str>,
    views: String,
    likes: Option<String>,
    published: String,
}

impl<'a> CardView<'a> {
    fn new(video: &'a Video, locale: Locale) -> Self {
        Self {
            url: web_link(&video.url),
            title: &video.title,
            channel: &video.channel,
            thumbnail: &video.thumbnail,
            description: video.description.as_deref().filter(|d| !d.trim().is_empty()),
            views: format_count(video.views, locale),
            likes: (video.likes > 0).then(|| format_count(video.likes, locale)),
            published: format_date(&video.published_at, locale),
        }
    }
}

/// `link` if it is an absolute `http` or `https` URL.
fn web_link(link: &str) -> Option<&str> {
    let parsed = Url::parse(link.trim()).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(link)
}
