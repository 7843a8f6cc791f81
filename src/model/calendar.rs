use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::TicketPhase;

/// One external calendar per kind of event we publish.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum CalendarType {
    Attended,
    Unattended,
    Tickets(TicketPhase),
}

impl CalendarType {
    /// Every calendar type, game calendars first.
    pub fn all() -> impl Iterator<Item = CalendarType> {
        use strum::IntoEnumIterator;

        [CalendarType::Attended, CalendarType::Unattended]
            .into_iter()
            .chain(TicketPhase::iter().map(CalendarType::Tickets))
    }

    pub fn is_ticket_calendar(&self) -> bool {
        matches!(self, CalendarType::Tickets(_))
    }

    /// Calendar types between which a game's event moves rather than being
    /// dropped and recreated independently.
    pub fn moves_to(&self, other: CalendarType) -> bool {
        *self != other && !self.is_ticket_calendar() && !other.is_ticket_calendar()
    }
}

impl fmt::Display for CalendarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarType::Attended => f.write_str("attended"),
            CalendarType::Unattended => f.write_str("unattended"),
            CalendarType::Tickets(phase) => write!(f, "tickets ({phase})"),
        }
    }
}

/// What we remember about one external calendar.
///
/// The event id mapping is only a cache; the store of games stays the source
/// of truth and remote events are rebuilt from it whenever the cache is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfiguration {
    pub calendar_type: CalendarType,
    pub calendar_id: Option<String>,
    pub event_ids_by_game_id: BTreeMap<u32, String>,
}

impl CalendarConfiguration {
    pub fn new(calendar_type: CalendarType) -> Self {
        Self {
            calendar_type,
            calendar_id: None,
            event_ids_by_game_id: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn test_all_calendar_types() {
        let all = CalendarType::all().collect_vec();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], CalendarType::Attended);
        assert_eq!(all.iter().filter(|t| t.is_ticket_calendar()).count(), 5);
        assert!(all.iter().all_unique());
    }

    #[test]
    fn test_only_game_calendars_move() {
        assert!(CalendarType::Attended.moves_to(CalendarType::Unattended));
        assert!(CalendarType::Unattended.moves_to(CalendarType::Attended));
        assert!(!CalendarType::Attended.moves_to(CalendarType::Attended));
        assert!(!CalendarType::Attended
            .moves_to(CalendarType::Tickets(TicketPhase::GeneralSale)));
    }
}
