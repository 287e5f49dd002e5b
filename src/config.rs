use std::path::Path;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::render::Locale;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the video search backend
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Locale for counts and dates (en-US, en-GB, de-DE, fr-FR)
    #[arg(long, env = "LOCALE")]
    pub locale: Option<Locale>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub ui: UiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub locale: Locale,
    /// Script URL of the htmx build served to the page.
    pub htmx_src: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    /// Load from the process arguments.
    ///
    /// `--help` and `--version` print and exit here, as does a malformed
    /// command line, with clap's usual status codes.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_cli(Cli::parse())
    }

    /// Load from an explicit argument list, reporting bad arguments as errors.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(cli)
    }

    /// Layer defaults, file, environment and `cli` into one config.
    pub fn from_cli(cli: Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("ui.locale", Locale::default().tag())?
            .set_default("ui.htmx_src", "/static/vendor/htmx-2.0.8.min.js")?
            .set_default("session.idle_timeout_secs", 30 * 60)?
            .set_default("session.sweep_interval_secs", 60)?;

        // 2. Config file: explicit path, else ./config.yaml if present
        let file = cli.config.clone().or_else(|| {
            Path::new(DEFAULT_CONFIG_FILE)
                .exists()
                .then(|| DEFAULT_CONFIG_FILE.to_string())
        });
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(&path));
        }

        // 3. Environment variables prefixed with VGPT_, e.g. VGPT_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("VGPT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and the env vars clap maps onto them) win over everything
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(locale) = cli.locale {
            builder = builder.set_override("ui.locale", locale.tag())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
