pub(crate) mod fixtures;
pub(crate) mod main_page;
pub(crate) mod tickets;

pub use fixtures::FixturesScanner;
pub use main_page::{find_main_page_links, MainPageLinks};
pub use tickets::TicketsScanner;

pub use ::scraper::Html;
use ::scraper::{ElementRef, Selector};
use reqwest::Url;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{HammersError, Result};
use crate::model::UpdateCommands;

/// Turns a page into a structured document.
#[allow(async_fn_in_trait)]
pub trait PageLoader {
    async fn load_page(&self, url: &Url) -> Result<Html>;
}

/// Extracts update commands from one kind of page.
pub trait GamesScanner {
    fn scan(&self, url: &Url, document: &Html) -> Result<UpdateCommands>;
}

/// Loads pages over HTTP with [`reqwest`].
pub struct HttpPageLoader {
    http: reqwest::Client,
}

impl HttpPageLoader {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Create a loader using the provided [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { http: client }
    }

    /// Build a client with the configured user agent and timeout.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| HammersError::Http {
                url: String::new(),
                source: e,
            })?;
        Ok(Self::with_client(client))
    }
}

impl Default for HttpPageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PageLoader for HttpPageLoader {
    async fn load_page(&self, url: &Url) -> Result<Html> {
        debug!(%url, "fetching page");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| HammersError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HammersError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HammersError::ResponseBody {
                url: url.to_string(),
                source: e,
            })?;

        Ok(Html::parse_document(&body))
    }
}

/// Extract trimmed text content from the first element matching `selector`
/// inside `element`. Returns an empty string if nothing matches.
pub(crate) fn select_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default()
}

/// All text below `element` with whitespace runs collapsed to single spaces.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a possibly relative link against the page it was found on.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Result<Url> {
    base.join(href).map_err(|e| HammersError::InvalidUrl {
        url: href.to_string(),
        reason: e.to_string(),
    })
}
