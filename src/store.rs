//! Persistence boundary for games and calendar configuration.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;

use crate::error::{HammersError, Result};
use crate::model::{CalendarConfiguration, CalendarType, Game, GameKey, Location};

/// Stored games. The store is the single source of truth.
pub trait GameStore {
    fn find_by_id(&self, id: u32) -> Result<Option<Game>>;
    fn find_by_business_key(&self, key: &GameKey) -> Result<Option<Game>>;
    fn find_by_date_played(&self, date_played: NaiveDateTime) -> Result<Option<Game>>;
    fn get_all(&self) -> Result<Vec<Game>>;
    fn get_all_for_season(&self, season: i32) -> Result<Vec<Game>>;
    /// Insert or update a batch, assigning ids to games that have none.
    fn save_or_update(&self, games: &mut [Game]) -> Result<()>;
}

/// Stored calendar configuration, one row per calendar type.
pub trait CalendarConfigurationStore {
    fn find_by_calendar_type(
        &self,
        calendar_type: CalendarType,
    ) -> Result<Option<CalendarConfiguration>>;
    fn save_calendar_configuration(&self, configuration: &CalendarConfiguration) -> Result<()>;
}

#[derive(Default)]
struct StoreState {
    games: BTreeMap<u32, Game>,
    last_id: u32,
    calendars: BTreeMap<CalendarType, CalendarConfiguration>,
    save_calls: usize,
}

/// A store kept entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    rejecting_saves: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While rejecting, every save fails with [`HammersError::Persistence`].
    pub fn set_rejecting_saves(&self, rejecting: bool) {
        self.rejecting_saves.store(rejecting, Ordering::SeqCst);
    }

    /// Number of batches saved so far.
    pub fn save_calls(&self) -> usize {
        self.lock().map(|s| s.save_calls).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| HammersError::Persistence("store lock poisoned".to_string()))
    }

    fn find(&self, predicate: impl Fn(&Game) -> bool) -> Result<Option<Game>> {
        Ok(self.lock()?.games.values().find(|g| predicate(g)).cloned())
    }
}

impl GameStore for InMemoryStore {
    fn find_by_id(&self, id: u32) -> Result<Option<Game>> {
        Ok(self.lock()?.games.get(&id).cloned())
    }

    fn find_by_business_key(&self, key: &GameKey) -> Result<Option<Game>> {
        self.find(|g| &g.key == key)
    }

    fn find_by_date_played(&self, date_played: NaiveDateTime) -> Result<Option<Game>> {
        self.find(|g| g.date_time_played == Some(date_played))
    }

    fn get_all(&self) -> Result<Vec<Game>> {
        Ok(self.lock()?.games.values().cloned().collect())
    }

    fn get_all_for_season(&self, season: i32) -> Result<Vec<Game>> {
        Ok(self
            .lock()?
            .games
            .values()
            .filter(|g| g.season() == season)
            .cloned()
            .collect())
    }

    fn save_or_update(&self, games: &mut [Game]) -> Result<()> {
        if self.rejecting_saves.load(Ordering::SeqCst) {
            return Err(HammersError::Persistence("store is read only".to_string()));
        }
        let mut state = self.lock()?;
        for game in games.iter() {
            let clash = state
                .games
                .values()
                .any(|existing| existing.key == game.key && existing.id != game.id);
            if clash {
                return Err(HammersError::Persistence(format!(
                    "duplicate business key {}",
                    game.key
                )));
            }
        }
        for game in games.iter_mut() {
            let id = match game.id {
                Some(id) => id,
                None => {
                    state.last_id += 1;
                    game.id = Some(state.last_id);
                    state.last_id
                }
            };
            state.games.insert(id, game.clone());
        }
        state.save_calls += 1;
        Ok(())
    }
}

impl CalendarConfigurationStore for InMemoryStore {
    fn find_by_calendar_type(
        &self,
        calendar_type: CalendarType,
    ) -> Result<Option<CalendarConfiguration>> {
        Ok(self.lock()?.calendars.get(&calendar_type).cloned())
    }

    fn save_calendar_configuration(&self, configuration: &CalendarConfiguration) -> Result<()> {
        self.lock()?
            .calendars
            .insert(configuration.calendar_type, configuration.clone());
        Ok(())
    }
}

/// Home games of a season, as used by "attend all home games".
pub(crate) fn home_games(games: Vec<Game>) -> impl Iterator<Item = Game> {
    games.into_iter().filter(|g| g.location() == Location::Home)
}
