use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;
use tokio::sync::Mutex;

use crate::calendar::{CalendarApi, EventData, RemoteCalendar, RemoteEvent, TimeWindow};
use crate::error::{HammersError, Result};

/// Writes issued against an [`InMemoryCalendarApi`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiCounts {
    pub calendars_created: usize,
    pub calendars_updated: usize,
    pub events_created: usize,
    pub events_updated: usize,
    pub events_deleted: usize,
}

impl ApiCounts {
    pub fn writes(&self) -> usize {
        self.calendars_created
            + self.calendars_updated
            + self.events_created
            + self.events_updated
            + self.events_deleted
    }
}

#[derive(Default)]
struct Calendar {
    title: String,
    description: String,
    events: BTreeMap<String, EventData>,
}

#[derive(Default)]
struct ApiState {
    calendars: BTreeMap<String, Calendar>,
    next_id: u64,
    counts: ApiCounts,
}

impl ApiState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn calendar(&mut self, calendar_id: &str) -> Result<&mut Calendar> {
        self.calendars
            .get_mut(calendar_id)
            .ok_or_else(|| HammersError::RemoteIo {
                operation: "calendar lookup",
                message: format!("no calendar {calendar_id}"),
            })
    }
}

/// A calendar service held in memory, for tests and dry runs.
pub struct InMemoryCalendarApi {
    state: Mutex<ApiState>,
    authenticated: AtomicBool,
    rejecting_events: AtomicBool,
}

impl InMemoryCalendarApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ApiState::default()),
            authenticated: AtomicBool::new(true),
            rejecting_events: AtomicBool::new(false),
        }
    }

    /// While unauthenticated every call fails with
    /// [`HammersError::AuthenticationFailed`].
    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// While rejecting, event writes fail with [`HammersError::RemoteIo`].
    pub fn set_rejecting_events(&self, rejecting: bool) {
        self.rejecting_events.store(rejecting, Ordering::SeqCst);
    }

    pub async fn counts(&self) -> ApiCounts {
        self.state.lock().await.counts
    }

    /// Every event in a calendar, ordered by start.
    pub async fn events(&self, calendar_id: &str) -> Vec<RemoteEvent> {
        self.state
            .lock()
            .await
            .calendars
            .get(calendar_id)
            .map(|c| sorted_events(c, None))
            .unwrap_or_default()
    }

    /// Change an event behind the projector's back, as a user editing the
    /// calendar by hand would. Not counted as a write.
    pub async fn tamper_with_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        edit: impl FnOnce(&mut EventData),
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let event = state
            .calendar(calendar_id)?
            .events
            .get_mut(event_id)
            .ok_or_else(|| HammersError::RemoteIo {
                operation: "tamper",
                message: format!("no event {event_id}"),
            })?;
        edit(event);
        Ok(())
    }

    fn check_authenticated(&self, operation: &'static str) -> Result<()> {
        if self.authenticated.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(HammersError::AuthenticationFailed { operation })
        }
    }

    fn check_event_write(&self, operation: &'static str) -> Result<()> {
        self.check_authenticated(operation)?;
        if self.rejecting_events.load(Ordering::SeqCst) {
            return Err(HammersError::RemoteIo {
                operation,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryCalendarApi {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_events(calendar: &Calendar, window: Option<TimeWindow>) -> Vec<RemoteEvent> {
    calendar
        .events
        .iter()
        .filter(|(_, data)| window.is_none_or(|w| w.overlaps(&data.window)))
        .map(|(event_id, data)| RemoteEvent {
            event_id: event_id.clone(),
            data: data.clone(),
        })
        .sorted_by_key(|e| e.data.window.start)
        .collect()
}

impl CalendarApi for InMemoryCalendarApi {
    async fn create_calendar(&self, title: &str, description: &str) -> Result<String> {
        self.check_authenticated("create calendar")?;
        let mut state = self.state.lock().await;
        let calendar_id = state.next_id("calendar");
        state.calendars.insert(
            calendar_id.clone(),
            Calendar {
                title: title.to_string(),
                description: description.to_string(),
                events: BTreeMap::new(),
            },
        );
        state.counts.calendars_created += 1;
        Ok(calendar_id)
    }

    async fn get_calendar(&self, calendar_id: &str) -> Result<Option<RemoteCalendar>> {
        self.check_authenticated("get calendar")?;
        let state = self.state.lock().await;
        Ok(state.calendars.get(calendar_id).map(|c| RemoteCalendar {
            calendar_id: calendar_id.to_string(),
            title: c.title.clone(),
            description: c.description.clone(),
        }))
    }

    async fn update_calendar(
        &self,
        calendar_id: &str,
        title: &str,
        description: &str,
    ) -> Result<()> {
        self.check_authenticated("update calendar")?;
        let mut state = self.state.lock().await;
        let calendar = state.calendar(calendar_id)?;
        calendar.title = title.to_string();
        calendar.description = description.to_string();
        state.counts.calendars_updated += 1;
        Ok(())
    }

    async fn create_event(&self, calendar_id: &str, event: &EventData) -> Result<String> {
        self.check_event_write("create event")?;
        let mut state = self.state.lock().await;
        let event_id = state.next_id("event");
        state
            .calendar(calendar_id)?
            .events
            .insert(event_id.clone(), event.clone());
        state.counts.events_created += 1;
        Ok(event_id)
    }

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Option<RemoteEvent>> {
        self.check_authenticated("get event")?;
        let mut state = self.state.lock().await;
        Ok(state
            .calendar(calendar_id)?
            .events
            .get(event_id)
            .map(|data| RemoteEvent {
                event_id: event_id.to_string(),
                data: data.clone(),
            }))
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventData,
    ) -> Result<()> {
        self.check_event_write("update event")?;
        let mut state = self.state.lock().await;
        let existing = state
            .calendar(calendar_id)?
            .events
            .get_mut(event_id)
            .ok_or_else(|| HammersError::RemoteIo {
                operation: "update event",
                message: format!("no event {event_id}"),
            })?;
        *existing = event.clone();
        state.counts.events_updated += 1;
        Ok(())
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        self.check_event_write("delete event")?;
        let mut state = self.state.lock().await;
        if state.calendar(calendar_id)?.events.remove(event_id).is_none() {
            return Err(HammersError::RemoteIo {
                operation: "delete event",
                message: format!("no event {event_id}"),
            });
        }
        state.counts.events_deleted += 1;
        Ok(())
    }

    async fn find_events_in_window(
        &self,
        calendar_id: &str,
        window: Option<TimeWindow>,
    ) -> Result<Vec<RemoteEvent>> {
        self.check_authenticated("find events")?;
        let mut state = self.state.lock().await;
        Ok(sorted_events(state.calendar(calendar_id)?, window))
    }

    async fn list_event_ids_by_game_id(
        &self,
        calendar_id: &str,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        self.check_authenticated("list events")?;
        let mut state = self.state.lock().await;
        Ok(state
            .calendar(calendar_id)?
            .events
            .iter()
            .map(|(event_id, data)| (data.game_id.clone(), event_id.clone()))
            .into_group_map()
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, TimeDelta};

    use super::*;

    fn event(game_id: &str) -> EventData {
        EventData {
            game_id: game_id.to_string(),
            title: "title".to_string(),
            window: TimeWindow::starting_at(
                NaiveDateTime::parse_from_str("2012-08-18 15:00", "%Y-%m-%d %H:%M").unwrap(),
                TimeDelta::hours(2),
            ),
            busy: false,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_events_are_grouped_by_game_id() {
        let api = InMemoryCalendarApi::new();
        let calendar_id = api.create_calendar("title", "").await.unwrap();
        let first = api.create_event(&calendar_id, &event("1")).await.unwrap();
        let second = api.create_event(&calendar_id, &event("1")).await.unwrap();
        let other = api.create_event(&calendar_id, &event("2")).await.unwrap();

        let grouped = api.list_event_ids_by_game_id(&calendar_id).await.unwrap();
        assert_eq!(grouped["1"], vec![first, second]);
        assert_eq!(grouped["2"], vec![other]);
        assert_eq!(api.counts().await.events_created, 3);
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_fail_distinctly() {
        let api = InMemoryCalendarApi::new();
        api.set_authenticated(false);
        let err = api.create_calendar("title", "").await.unwrap_err();
        assert!(err.is_authentication_failure());

        api.set_authenticated(true);
        let err = api.get_event("calendar-99", "event-1").await.unwrap_err();
        assert!(matches!(err, HammersError::RemoteIo { .. }));
    }
}
