use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::Result;

/// A closed-open span of local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: NaiveDateTime, duration: TimeDelta) -> Self {
        Self::new(start, start + duration)
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The fields of a remote event that we own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventData {
    /// Our game id, stored on the event so it can be found again.
    pub game_id: String,
    pub title: String,
    pub window: TimeWindow,
    pub busy: bool,
    pub description: String,
}

impl EventData {
    /// Names of the fields that differ from `other`.
    pub fn changed_fields(&self, other: &EventData) -> Vec<&'static str> {
        let mut changed = vec![];
        if self.game_id != other.game_id {
            changed.push("game id");
        }
        if self.title != other.title {
            changed.push("title");
        }
        if self.window.start != other.window.start {
            changed.push("start");
        }
        if self.window.end != other.window.end {
            changed.push("end");
        }
        if self.busy != other.busy {
            changed.push("busy");
        }
        if self.description != other.description {
            changed.push("description");
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEvent {
    pub event_id: String,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCalendar {
    pub calendar_id: String,
    pub title: String,
    pub description: String,
}

/// The external calendar service.
///
/// Implementations must report rejected credentials as
/// [`HammersError::AuthenticationFailed`](crate::HammersError::AuthenticationFailed)
/// and every other failure as
/// [`HammersError::RemoteIo`](crate::HammersError::RemoteIo). Nothing here
/// retries.
#[allow(async_fn_in_trait)]
pub trait CalendarApi {
    async fn create_calendar(&self, title: &str, description: &str) -> Result<String>;

    async fn get_calendar(&self, calendar_id: &str) -> Result<Option<RemoteCalendar>>;

    async fn update_calendar(&self, calendar_id: &str, title: &str, description: &str)
        -> Result<()>;

    /// Create an event and return the id the service assigned to it.
    async fn create_event(&self, calendar_id: &str, event: &EventData) -> Result<String>;

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Option<RemoteEvent>>;

    async fn update_event(&self, calendar_id: &str, event_id: &str, event: &EventData)
        -> Result<()>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;

    /// Events overlapping `window`, or every event when `window` is `None`.
    async fn find_events_in_window(
        &self,
        calendar_id: &str,
        window: Option<TimeWindow>,
    ) -> Result<Vec<RemoteEvent>>;

    /// Every event in the calendar, grouped by the game id stored on it.
    async fn list_event_ids_by_game_id(
        &self,
        calendar_id: &str,
    ) -> Result<BTreeMap<String, Vec<String>>>;
}
