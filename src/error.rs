use ::scraper::error::SelectorErrorKind;
use std::num::ParseIntError;

/// All errors that can occur while scanning, reconciling and projecting games.
#[derive(thiserror::Error, Debug)]
pub enum HammersError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// A URL could not be parsed or joined onto its base.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// Failed to parse an integer from scraped text.
    #[error("failed to parse integer: {0}")]
    IntParse(#[from] ParseIntError),

    /// Failed to parse a date/time from scraped text.
    #[error("failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// An expected HTML element was not found on the page.
    #[error("expected element not found: {context}")]
    ElementNotFound { context: &'static str },

    /// The external calendar service rejected our credentials.
    #[error("calendar authentication failed during {operation}")]
    AuthenticationFailed { operation: &'static str },

    /// Any other failure talking to the external calendar service.
    #[error("calendar request {operation} failed: {message}")]
    RemoteIo {
        operation: &'static str,
        message: String,
    },

    /// No stored game has this id.
    #[error("no game with id {0}")]
    GameNotFound(u32),

    /// The game store could not load or save.
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl HammersError {
    /// Whether the caller should start a re-authentication flow.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, HammersError::AuthenticationFailed { .. })
    }
}

impl<'a> From<SelectorErrorKind<'a>> for HammersError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        HammersError::Selector(err.to_string())
    }
}

/// Configuration-related errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, HammersError>;
