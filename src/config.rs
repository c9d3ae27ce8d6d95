use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Address of the paraphrasing service when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/paraphrase";

/// Number of history entries shown before "view all" is requested.
pub const DEFAULT_HISTORY_PREVIEW: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    /// `None` means a request may wait indefinitely.
    pub request_timeout: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Credential handed over by the sign-in flow, if one was provided up front.
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub seed_history: bool,
    pub history_preview: usize,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig {
                url: DEFAULT_ENDPOINT.to_string(),
                request_timeout: None,
            },
            auth: AuthConfig::default(),
            session: SessionConfig {
                seed_history: true,
                history_preview: DEFAULT_HISTORY_PREVIEW,
                output_dir: PathBuf::from("."),
            },
            logging: LoggingConfig {
                filter: "docuhuman=info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            endpoint: EndpointConfig {
                url: env::var("DOCUHUMAN_ENDPOINT").unwrap_or(defaults.endpoint.url),
                request_timeout: match env::var("DOCUHUMAN_REQUEST_TIMEOUT_SECS") {
                    Ok(secs) => Some(Duration::from_secs(secs.parse()?)),
                    Err(_) => None,
                },
            },
            auth: AuthConfig {
                token: env::var("DOCUHUMAN_TOKEN").ok().filter(|t| !t.is_empty()),
            },
            session: SessionConfig {
                seed_history: env::var("DOCUHUMAN_SEED_HISTORY")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                history_preview: env::var("DOCUHUMAN_HISTORY_PREVIEW")
                    .unwrap_or_else(|_| DEFAULT_HISTORY_PREVIEW.to_string())
                    .parse()?,
                output_dir: env::var("DOCUHUMAN_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.session.output_dir),
            },
            logging: LoggingConfig {
                filter: env::var("DOCUHUMAN_LOG").unwrap_or(defaults.logging.filter),
            },
        })
    }
}
