//! TOML configuration for the scanner, the HTTP client and the calendars.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub calendars: CalendarsConfig,
}

/// Where the club website lives and how its sub pages are recognised.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub home_page: String,
    /// Substring of the fixtures page link on the home page.
    pub fixtures_marker: String,
    /// Substring of the ticket news page link on the home page.
    pub tickets_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            home_page: "http://www.whufc.com/page/Home/".to_string(),
            fixtures_marker: "FixturesResults".to_string(),
            tickets_marker: "TicketNews".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("hammers-calendar/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How games are rendered into the external calendars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarsConfig {
    /// Our side of every fixture, used in event titles.
    pub club: String,
    pub title_prefix: String,
    pub game_duration_hours: u32,
    pub ticket_duration_hours: u32,
}

impl Default for CalendarsConfig {
    fn default() -> Self {
        Self {
            club: "West Ham".to_string(),
            title_prefix: "Hammers".to_string(),
            game_duration_hours: 2,
            ticket_duration_hours: 1,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// The home page as a parsed URL.
    pub fn home_page_url(&self) -> Result<Url> {
        Url::parse(&self.site.home_page).map_err(|e| {
            ConfigError::Invalid(format!("site.home_page {}: {e}", self.site.home_page)).into()
        })
    }

    fn validate(&self) -> Result<()> {
        self.home_page_url()?;
        if self.site.fixtures_marker.is_empty() || self.site.tickets_marker.is_empty() {
            return Err(ConfigError::Invalid("site link markers must not be empty".into()).into());
        }
        if self.calendars.game_duration_hours == 0 || self.calendars.ticket_duration_hours == 0 {
            return Err(ConfigError::Invalid("calendar durations must be positive".into()).into());
        }
        Ok(())
    }
}
