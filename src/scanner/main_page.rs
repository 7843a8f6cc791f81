use ::scraper::Selector;
use reqwest::Url;
use tracing::debug;

use crate::config::SiteConfig;
use crate::error::{HammersError, Result};
use crate::scanner::{resolve_link, Html};

/// The pages linked from the club's home page that we scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainPageLinks {
    pub fixtures: Url,
    pub tickets: Url,
}

/// Find the fixtures and ticket news links on the home page.
pub fn find_main_page_links(
    home_page: &Url,
    document: &Html,
    site: &SiteConfig,
) -> Result<MainPageLinks> {
    let anchor_selector = Selector::parse("a[href]")?;
    let hrefs = document
        .select(&anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .collect::<Vec<_>>();

    let find = |marker: &str, context: &'static str| -> Result<Url> {
        let href = hrefs
            .iter()
            .find(|href| href.contains(marker))
            .ok_or(HammersError::ElementNotFound { context })?;
        resolve_link(home_page, href)
    };

    let links = MainPageLinks {
        fixtures: find(&site.fixtures_marker, "fixtures page link")?,
        tickets: find(&site.tickets_marker, "ticket news page link")?,
    };
    debug!(fixtures = %links.fixtures, tickets = %links.tickets, "found main page links");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = r#"
        <html><body>
          <ul class="nav">
            <li><a href="/page/News/0,,12562,00.html">News</a></li>
            <li><a href="/page/FixturesResults/0,,12562,00.html">Fixtures</a></li>
            <li><a href="http://www.whufc.com/page/TicketNews/0,,12562,00.html">Tickets</a></li>
            <li><a>Dead link</a></li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_find_main_page_links() {
        let home = Url::parse("http://www.whufc.com/page/Home/").unwrap();
        let document = Html::parse_document(HOME);
        let links = find_main_page_links(&home, &document, &SiteConfig::default()).unwrap();
        assert_eq!(
            links.fixtures.as_str(),
            "http://www.whufc.com/page/FixturesResults/0,,12562,00.html"
        );
        assert_eq!(
            links.tickets.as_str(),
            "http://www.whufc.com/page/TicketNews/0,,12562,00.html"
        );
    }

    #[test]
    fn test_missing_link_is_an_error() {
        let home = Url::parse("http://www.whufc.com/page/Home/").unwrap();
        let document = Html::parse_document("<a href=\"/page/FixturesResults/\">Fixtures</a>");
        let err = find_main_page_links(&home, &document, &SiteConfig::default()).unwrap_err();
        assert!(matches!(err, HammersError::ElementNotFound { .. }));
    }
}
