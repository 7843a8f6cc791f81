use chrono::{Months, NaiveDateTime, TimeDelta};
use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use tracing::debug;

use crate::calendar::{CalendarApi, RemoteEvent, TimeWindow};
use crate::error::Result;

/// How far either side of the expected start a search looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SearchWidth {
    Hour,
    Day,
    Week,
    Month,
    Year,
    Unbounded,
}

impl SearchWidth {
    /// The window this width covers around `centre`; `None` means everywhere.
    pub fn window_around(&self, centre: NaiveDateTime) -> Option<TimeWindow> {
        let by_delta = |delta: TimeDelta| Some(TimeWindow::new(centre - delta, centre + delta));
        let by_months = |months: u32| {
            let months = Months::new(months);
            Some(TimeWindow::new(
                centre.checked_sub_months(months)?,
                centre.checked_add_months(months)?,
            ))
        };
        match self {
            SearchWidth::Hour => by_delta(TimeDelta::hours(1)),
            SearchWidth::Day => by_delta(TimeDelta::days(1)),
            SearchWidth::Week => by_delta(TimeDelta::weeks(1)),
            SearchWidth::Month => by_months(1),
            SearchWidth::Year => by_months(12),
            SearchWidth::Unbounded => None,
        }
    }
}

/// A remote event found by [`find_game`], with the width that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundEvent {
    pub event: RemoteEvent,
    pub width: SearchWidth,
}

/// Find the event carrying `game_id` by searching ever wider windows around
/// `search_date`, stopping at the first window that contains one. Without a
/// search date only the unbounded search runs.
pub async fn find_game<A: CalendarApi>(
    api: &A,
    calendar_id: &str,
    game_id: &str,
    search_date: Option<NaiveDateTime>,
) -> Result<Option<FoundEvent>> {
    let widths = match search_date {
        Some(_) => SearchWidth::iter().collect_vec(),
        None => vec![SearchWidth::Unbounded],
    };
    for width in widths {
        let window = search_date.and_then(|centre| width.window_around(centre));
        let events = api.find_events_in_window(calendar_id, window).await?;
        let found = events
            .into_iter()
            .filter(|e| e.data.game_id == game_id)
            .min_by_key(|e| {
                search_date
                    .map(|centre| (e.data.window.start - centre).abs())
                    .unwrap_or(TimeDelta::zero())
            });
        if let Some(event) = found {
            debug!(calendar_id, game_id, %width, event_id = %event.event_id, "found game");
            return Ok(Some(FoundEvent { event, width }));
        }
    }
    debug!(calendar_id, game_id, "game not found");
    Ok(None)
}
