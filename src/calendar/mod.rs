//! Projection of stored games onto external calendars.

mod api;
mod memory;
mod projector;
mod search;

pub use api::{CalendarApi, EventData, RemoteCalendar, RemoteEvent, TimeWindow};
pub use memory::{ApiCounts, InMemoryCalendarApi};
pub use projector::CalendarProjector;
pub use search::{find_game, FoundEvent, SearchWidth};

use chrono::{NaiveDateTime, TimeDelta};
use itertools::Itertools;

use crate::config::CalendarsConfig;
use crate::model::{CalendarType, Game, Location};

/// How one calendar type selects, times and renders its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSpec {
    pub calendar_type: CalendarType,
    pub title: String,
    pub description: String,
    pub duration: TimeDelta,
    pub busy: bool,
    club: String,
}

impl CalendarSpec {
    /// Whether `game` belongs on this calendar.
    pub fn contains(&self, game: &Game) -> bool {
        match self.calendar_type {
            CalendarType::Attended => game.attended && game.date_time_played.is_some(),
            CalendarType::Unattended => !game.attended && game.date_time_played.is_some(),
            CalendarType::Tickets(phase) => game.tickets.get(phase).is_some(),
        }
    }

    fn starts_at(&self, game: &Game) -> Option<NaiveDateTime> {
        match self.calendar_type {
            CalendarType::Attended | CalendarType::Unattended => game.date_time_played,
            CalendarType::Tickets(phase) => game.tickets.get(phase),
        }
    }

    /// The event `game` should have on this calendar, or `None` if it does
    /// not belong here or has not been saved yet.
    pub fn event_for(&self, game: &Game) -> Option<EventData> {
        if !self.contains(game) {
            return None;
        }
        let game_id = game.id?;
        let start = self.starts_at(game)?;
        Some(EventData {
            game_id: game_id.to_string(),
            title: self.event_title(game),
            window: TimeWindow::starting_at(start, self.duration),
            busy: self.busy,
            description: event_description(game),
        })
    }

    fn event_title(&self, game: &Game) -> String {
        let (home, away) = match game.location() {
            Location::Home => (self.club.as_str(), game.key.opponents.as_str()),
            Location::Away => (game.key.opponents.as_str(), self.club.as_str()),
        };
        let fixture = format!("{home} vs {away} ({})", game.key.competition.name());
        match self.calendar_type {
            CalendarType::Tickets(phase) => format!("{phase} tickets: {fixture}"),
            _ => fixture,
        }
    }
}

fn event_description(game: &Game) -> String {
    [
        game.result.as_ref().map(|r| format!("Result: {r}")),
        game.attendance.map(|a| format!("Attendance: {a}")),
        game.match_report.as_ref().map(|r| format!("Match report: {r}")),
        game.television_channel.as_ref().map(|c| format!("Television: {c}")),
    ]
    .into_iter()
    .flatten()
    .join("\n")
}

/// Every calendar we publish, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarTable {
    specs: Vec<CalendarSpec>,
}

impl CalendarTable {
    pub fn from_config(config: &CalendarsConfig) -> Self {
        let game_duration = TimeDelta::hours(i64::from(config.game_duration_hours));
        let ticket_duration = TimeDelta::hours(i64::from(config.ticket_duration_hours));
        let prefix = &config.title_prefix;
        let club = &config.club;

        let specs = CalendarType::all()
            .map(|calendar_type| {
                let (title, description, duration, busy) = match calendar_type {
                    CalendarType::Attended => (
                        format!("{prefix} - Attended"),
                        format!("{club} games I am going to"),
                        game_duration,
                        true,
                    ),
                    CalendarType::Unattended => (
                        format!("{prefix} - Not Attended"),
                        format!("{club} games I am not going to"),
                        game_duration,
                        false,
                    ),
                    CalendarType::Tickets(phase) => (
                        format!("{prefix} - {phase} Tickets"),
                        format!("When {phase} tickets go on sale for {club} games"),
                        ticket_duration,
                        false,
                    ),
                };
                CalendarSpec {
                    calendar_type,
                    title,
                    description,
                    duration,
                    busy,
                    club: club.clone(),
                }
            })
            .collect();
        Self { specs }
    }

    pub fn get(&self, calendar_type: CalendarType) -> Option<&CalendarSpec> {
        self.specs.iter().find(|s| s.calendar_type == calendar_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarSpec> {
        self.specs.iter()
    }
}

impl Default for CalendarTable {
    fn default() -> Self {
        Self::from_config(&CalendarsConfig::default())
    }
}
