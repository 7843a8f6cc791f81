use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::model::{CalendarType, GameKey};

/// What the projector did with one game on one calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChangeAction {
    Created,
    Updated { changed: bool },
    Removed,
    Moved { to: CalendarType },
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Created => f.write_str("created"),
            ChangeAction::Updated { changed: true } => f.write_str("updated"),
            ChangeAction::Updated { changed: false } => f.write_str("unchanged"),
            ChangeAction::Removed => f.write_str("removed"),
            ChangeAction::Moved { to } => write!(f, "moved to {to}"),
        }
    }
}

/// A single entry in the change log. Ordered by calendar, then game, then action.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UpdateChangeLog {
    pub calendar_type: CalendarType,
    pub game: GameKey,
    pub action: ChangeAction,
}

impl UpdateChangeLog {
    pub fn new(calendar_type: CalendarType, game: GameKey, action: ChangeAction) -> Self {
        Self {
            calendar_type,
            game,
            action,
        }
    }

    /// Whether this entry records a write to the external calendar.
    pub fn is_change(&self) -> bool {
        !matches!(self.action, ChangeAction::Updated { changed: false })
    }
}

impl fmt::Display for UpdateChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} {}: {}", self.calendar_type, self.game, self.action)
    }
}

/// Ordered, deduplicated report of a projection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeLog {
    entries: BTreeSet<UpdateChangeLog>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry; returns false if an identical one was already present.
    pub fn record(&mut self, entry: UpdateChangeLog) -> bool {
        self.entries.insert(entry)
    }

    pub fn remove(&mut self, entry: &UpdateChangeLog) -> bool {
        self.entries.remove(entry)
    }

    pub fn contains(&self, entry: &UpdateChangeLog) -> bool {
        self.entries.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpdateChangeLog> {
        self.entries.iter()
    }

    /// Entries that wrote to an external calendar.
    pub fn changes(&self) -> impl Iterator<Item = &UpdateChangeLog> {
        self.entries.iter().filter(|e| e.is_change())
    }

    pub fn merge(&mut self, other: ChangeLog) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for ChangeLog {
    type Item = UpdateChangeLog;
    type IntoIter = std::collections::btree_set::IntoIter<UpdateChangeLog>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Extend<UpdateChangeLog> for ChangeLog {
    fn extend<I: IntoIterator<Item = UpdateChangeLog>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
