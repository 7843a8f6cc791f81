use ::scraper::{ElementRef, Selector};
use chrono::NaiveDateTime;
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::{HammersError, Result};
use crate::model::{GameLocator, GameUpdate, GameUpdateCommand, TicketPhase, UpdateCommands};
use crate::scanner::{element_text, select_text, GamesScanner, Html};

pub(crate) const TICKET_DATE_FORMAT: &str = "%a %d %b %Y %H:%M";

/// Scans the ticket news page. Games there are only identified by kick off,
/// so its commands can update existing games but never create new ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketsScanner;

impl GamesScanner for TicketsScanner {
    fn scan(&self, url: &Url, document: &Html) -> Result<UpdateCommands> {
        let fixture_selector = Selector::parse("div.ticket-fixture")?;
        let kick_off_selector = Selector::parse("span.kickoff")?;
        let sale_selector = Selector::parse("li.sale")?;
        let phase_selector = Selector::parse("span.phase")?;
        let opens_selector = Selector::parse("span.opens")?;

        let mut commands = UpdateCommands::new();
        for fixture in document.select(&fixture_selector) {
            let kick_off = select_text(&fixture, &kick_off_selector);
            let kick_off = match NaiveDateTime::parse_from_str(&kick_off, TICKET_DATE_FORMAT) {
                Ok(kick_off) => kick_off,
                Err(e) => {
                    warn!(%url, %kick_off, error = %e, "skipping ticket fixture");
                    continue;
                }
            };
            let locator = GameLocator::DatePlayed(kick_off);
            for sale in fixture.select(&sale_selector) {
                match parse_sale(&sale, &phase_selector, &opens_selector) {
                    Ok((phase, opens)) => commands.push(GameUpdateCommand::new(
                        locator.clone(),
                        GameUpdate::TicketDate(phase, opens),
                    )),
                    Err(e) => warn!(%url, %kick_off, error = %e, "skipping ticket sale"),
                }
            }
        }
        debug!(%url, commands = commands.len(), "scanned ticket news page");
        Ok(commands)
    }
}

fn parse_sale(
    sale: &ElementRef,
    phase_selector: &Selector,
    opens_selector: &Selector,
) -> Result<(TicketPhase, NaiveDateTime)> {
    let phase = sale
        .select(phase_selector)
        .next()
        .map(|p| element_text(&p))
        .and_then(|label| TicketPhase::from_label(&label))
        .ok_or(HammersError::ElementNotFound {
            context: "ticket phase (span.phase)",
        })?;
    let opens = select_text(sale, opens_selector);
    let opens = NaiveDateTime::parse_from_str(&opens, TICKET_DATE_FORMAT)?;
    Ok((phase, opens))
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <div class="ticket-fixture">
          <h3><span class="opponents">Aston Villa</span>
              <span class="kickoff">Sat 18 Aug 2012 15:00</span></h3>
          <ul>
            <li class="sale"><span class="phase">Bondholders</span>
                <span class="opens">Mon 23 Jul 2012 09:00</span></li>
            <li class="sale"><span class="phase">General Sale</span>
                <span class="opens">Mon 30 Jul 2012 09:30</span></li>
            <li class="sale"><span class="phase">Hospitality</span>
                <span class="opens">Mon 30 Jul 2012 09:30</span></li>
            <li class="sale"><span class="phase">Bondholders</span>
                <span class="opens">Mon 23 Jul 2012 09:00</span></li>
          </ul>
        </div>
        <div class="ticket-fixture">
          <h3><span class="opponents">Swansea City</span>
              <span class="kickoff">To be confirmed</span></h3>
          <ul>
            <li class="sale"><span class="phase">Academy Members</span>
                <span class="opens">Mon 23 Jul 2012 09:00</span></li>
          </ul>
        </div>
        <div class="ticket-fixture">
          <h3><span class="opponents">Fulham</span>
              <span class="kickoff">Sat 01 Sep 2012 15:00</span></h3>
          <ul>
            <li class="sale"><span class="phase">Season Ticket Holders</span>
                <span class="opens">soon</span></li>
            <li class="sale"><span class="phase">Season Ticket Holders</span>
                <span class="opens">Tue 14 Aug 2012 10:00</span></li>
          </ul>
        </div>
        </body></html>
    "#;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_scan_ticket_news() {
        let url = Url::parse("http://www.whufc.com/page/TicketNews/0,,12562,00.html").unwrap();
        let document = Html::parse_document(PAGE);
        let commands = TicketsScanner.scan(&url, &document).unwrap();

        let villa = GameLocator::DatePlayed(at("2012-08-18 15:00"));
        let fulham = GameLocator::DatePlayed(at("2012-09-01 15:00"));
        let expected = vec![
            GameUpdateCommand::new(
                villa.clone(),
                GameUpdate::TicketDate(TicketPhase::GeneralSale, at("2012-07-30 09:30")),
            ),
            GameUpdateCommand::new(
                villa,
                GameUpdate::TicketDate(TicketPhase::Bondholders, at("2012-07-23 09:00")),
            ),
            GameUpdateCommand::new(
                fulham,
                GameUpdate::TicketDate(TicketPhase::SeasonTickets, at("2012-08-14 10:00")),
            ),
        ];
        assert_eq!(commands.into_iter().collect_vec(), expected);
    }
}
