use std::str::FromStr;

use ::scraper::{ElementRef, Selector};
use chrono::{NaiveDate, NaiveTime};
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::{HammersError, Result};
use crate::model::{
    season_of, Competition, GameKey, GameLocator, GameUpdate, GameUpdateCommand, Location,
    UpdateCommands,
};
use crate::scanner::{resolve_link, select_text, GamesScanner, Html};

pub(crate) const FIXTURE_DATE_FORMAT: &str = "%a %d %b %Y";
pub(crate) const FIXTURE_TIME_FORMAT: &str = "%H:%M";

/// Scans the fixtures and results page. Every row names its game by
/// business key, so new games may be created from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixturesScanner;

struct FixtureSelectors {
    date: Selector,
    time: Selector,
    competition: Selector,
    venue: Selector,
    opponents: Selector,
    result: Selector,
    attendance: Selector,
    report: Selector,
    television: Selector,
}

impl FixtureSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            date: Selector::parse("td.date")?,
            time: Selector::parse("td.time")?,
            competition: Selector::parse("td.competition")?,
            venue: Selector::parse("td.venue")?,
            opponents: Selector::parse("td.opponents")?,
            result: Selector::parse("td.result")?,
            attendance: Selector::parse("td.attendance")?,
            report: Selector::parse("td.report a")?,
            television: Selector::parse("td.tv")?,
        })
    }
}

impl GamesScanner for FixturesScanner {
    fn scan(&self, url: &Url, document: &Html) -> Result<UpdateCommands> {
        let row_selector = Selector::parse("table.fixtures tr.fixture")?;
        let selectors = FixtureSelectors::new()?;
        let mut commands = UpdateCommands::new();
        let mut rows = 0;
        for row in document.select(&row_selector) {
            rows += 1;
            match parse_fixture(url, &row, &selectors) {
                Ok(row_commands) => commands.extend(row_commands),
                Err(e) => warn!(%url, row = rows, error = %e, "skipping fixture row"),
            }
        }
        debug!(%url, rows, commands = commands.len(), "scanned fixtures page");
        Ok(commands)
    }
}

fn parse_fixture(
    url: &Url,
    row: &ElementRef,
    selectors: &FixtureSelectors,
) -> Result<Vec<GameUpdateCommand>> {
    let date = NaiveDate::parse_from_str(&select_text(row, &selectors.date), FIXTURE_DATE_FORMAT)?;
    let competition = Competition::from_str(&select_text(row, &selectors.competition)).map_err(
        |_| HammersError::ElementNotFound {
            context: "fixture competition (td.competition)",
        },
    )?;
    let location = Location::from_str(&select_text(row, &selectors.venue)).map_err(|_| {
        HammersError::ElementNotFound {
            context: "fixture venue (td.venue)",
        }
    })?;
    let opponents = select_text(row, &selectors.opponents);
    if opponents.is_empty() {
        return Err(HammersError::ElementNotFound {
            context: "fixture opponents (td.opponents)",
        });
    }

    let kick_off = select_text(row, &selectors.time);
    let kick_off = NaiveTime::parse_from_str(&kick_off, FIXTURE_TIME_FORMAT)
        .ok()
        .map(|time| date.and_time(time));
    let season = season_of(date.and_time(NaiveTime::MIN));
    let locator = GameLocator::BusinessKey(GameKey::new(competition, location, opponents, season));

    let mut updates = vec![];
    match kick_off {
        Some(kick_off) => updates.push(GameUpdate::DatePlayed(kick_off)),
        None => debug!(%locator, "kick off time not yet known"),
    }

    let result = select_text(row, &selectors.result);
    if !result.is_empty() {
        updates.push(GameUpdate::Result(result));
    }

    let attendance = select_text(row, &selectors.attendance).replace(',', "");
    if !attendance.is_empty() {
        match attendance.parse() {
            Ok(attendance) => updates.push(GameUpdate::Attendance(attendance)),
            Err(e) => warn!(%locator, %attendance, error = %e, "ignoring attendance"),
        }
    }

    if let Some(href) = row
        .select(&selectors.report)
        .next()
        .and_then(|a| a.value().attr("href"))
    {
        match resolve_link(url, href) {
            Ok(report) => updates.push(GameUpdate::MatchReport(report.to_string())),
            Err(e) => warn!(%locator, href, error = %e, "ignoring match report"),
        }
    }

    let television = select_text(row, &selectors.television);
    if !television.is_empty() {
        updates.push(GameUpdate::TelevisionChannel(television));
    }

    Ok(updates
        .into_iter()
        .map(|update| GameUpdateCommand::new(locator.clone(), update))
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use itertools::Itertools;

    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table class="fixtures">
          <tr class="fixture">
            <td class="date">Sat 18 Aug 2012</td>
            <td class="time">15:00</td>
            <td class="competition">PREM</td>
            <td class="venue">H</td>
            <td class="opponents">Aston Villa</td>
            <td class="result">1-0</td>
            <td class="attendance">34,172</td>
            <td class="report"><a href="/page/Report/1.html">Report</a></td>
            <td class="tv"></td>
          </tr>
          <tr class="fixture">
            <td class="date">Tue 28 Aug 2012</td>
            <td class="time">TBC</td>
            <td class="competition">LGCP</td>
            <td class="venue">A</td>
            <td class="opponents">Crewe Alexandra</td>
            <td class="result"></td>
            <td class="attendance"></td>
            <td class="report"></td>
            <td class="tv">Sky Sports 2</td>
          </tr>
          <tr class="fixture">
            <td class="date">Sat 22 Sep 2012</td>
            <td class="time">15:00</td>
            <td class="competition">PREM</td>
            <td class="venue">H</td>
            <td class="opponents">Sunderland</td>
            <td class="result"></td>
            <td class="attendance">TBC</td>
            <td class="report"><a href="http://[broken/report">Report</a></td>
            <td class="tv">ESPN</td>
          </tr>
          <tr class="fixture">
            <td class="date">Someday</td>
            <td class="time">15:00</td>
            <td class="competition">PREM</td>
            <td class="venue">A</td>
            <td class="opponents">Nowhere</td>
          </tr>
          <tr class="fixture">
            <td class="date">Sat 01 Sep 2012</td>
            <td class="time">15:00</td>
            <td class="competition">UEFA</td>
            <td class="venue">A</td>
            <td class="opponents">Elsewhere</td>
          </tr>
        </table>
        </body></html>
    "#;

    fn kick_off(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_scan_fixtures() {
        let url =
            Url::parse("http://www.whufc.com/page/FixturesResults/0,,12562,00.html").unwrap();
        let document = Html::parse_document(PAGE);
        let commands = FixturesScanner.scan(&url, &document).unwrap();

        let villa = GameLocator::BusinessKey(GameKey::new(
            Competition::Prem,
            Location::Home,
            "Aston Villa",
            2012,
        ));
        let sunderland = GameLocator::BusinessKey(GameKey::new(
            Competition::Prem,
            Location::Home,
            "Sunderland",
            2012,
        ));
        let crewe = GameLocator::BusinessKey(GameKey::new(
            Competition::Lgcp,
            Location::Away,
            "Crewe Alexandra",
            2012,
        ));

        // Premier League sorts before the League Cup. Sunderland keeps its
        // kick off and channel even though attendance and report are unreadable.
        let expected = vec![
            GameUpdateCommand::new(
                villa.clone(),
                GameUpdate::DatePlayed(kick_off("2012-08-18 15:00")),
            ),
            GameUpdateCommand::new(villa.clone(), GameUpdate::Result("1-0".to_string())),
            GameUpdateCommand::new(villa.clone(), GameUpdate::Attendance(34172)),
            GameUpdateCommand::new(
                villa,
                GameUpdate::MatchReport("http://www.whufc.com/page/Report/1.html".to_string()),
            ),
            GameUpdateCommand::new(
                sunderland.clone(),
                GameUpdate::DatePlayed(kick_off("2012-09-22 15:00")),
            ),
            GameUpdateCommand::new(sunderland, GameUpdate::TelevisionChannel("ESPN".to_string())),
            GameUpdateCommand::new(
                crewe,
                GameUpdate::TelevisionChannel("Sky Sports 2".to_string()),
            ),
        ];
        assert_eq!(commands.into_iter().collect_vec(), expected);
    }

    #[test]
    fn test_scan_page_without_fixtures() {
        let url = Url::parse("http://www.whufc.com/").unwrap();
        let document = Html::parse_document("<html><body><p>Closed season</p></body></html>");
        assert!(FixturesScanner.scan(&url, &document).unwrap().is_empty());
    }
}
