use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::Result;
use crate::model::{Game, GameKey, GameLocator};
use crate::store::GameStore;

/// Identifies one game within a [`GameResolver`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameHandle(usize);

/// Resolves locators to games for a single reconciliation pass.
///
/// The session owns a snapshot of every stored game taken when it is built,
/// indexed by business key and by date played. Games created for unknown
/// business keys are appended to the snapshot and saved by
/// [`GameResolver::synchronise`]. A session must not outlive its pass.
pub struct GameResolver {
    games: Vec<Game>,
    loaded: usize,
    by_key: HashMap<GameKey, GameHandle>,
    by_date_played: HashMap<NaiveDateTime, GameHandle>,
}

impl GameResolver {
    pub fn new(games: Vec<Game>) -> Self {
        let mut by_key = HashMap::with_capacity(games.len());
        let mut by_date_played = HashMap::new();
        for (index, game) in games.iter().enumerate() {
            let handle = GameHandle(index);
            by_key.insert(game.key.clone(), handle);
            if let Some(date_played) = game.date_time_played {
                if by_date_played.insert(date_played, handle).is_some() {
                    warn!(%game, %date_played, "two games share a kick off");
                }
            }
        }
        Self {
            loaded: games.len(),
            games,
            by_key,
            by_date_played,
        }
    }

    /// Start a session from everything currently in `store`.
    pub fn load(store: &impl GameStore) -> Result<Self> {
        Ok(Self::new(store.get_all()?))
    }

    /// Find the game a locator refers to.
    ///
    /// An unknown business key creates a provisional game; an unknown date
    /// played finds nothing, so ticket news for fixtures we have never seen
    /// cannot invent games.
    pub fn locate(&mut self, locator: &GameLocator) -> Option<GameHandle> {
        match locator {
            GameLocator::BusinessKey(key) => Some(match self.by_key.get(key) {
                Some(handle) => *handle,
                None => self.create(key.clone()),
            }),
            GameLocator::DatePlayed(date_played) => self.by_date_played.get(date_played).copied(),
        }
    }

    fn create(&mut self, key: GameKey) -> GameHandle {
        let handle = GameHandle(self.games.len());
        let game = Game::new(key.clone());
        info!(%game, "creating game");
        self.games.push(game);
        self.by_key.insert(key, handle);
        handle
    }

    pub fn game(&self, handle: GameHandle) -> &Game {
        &self.games[handle.0]
    }

    pub fn game_mut(&mut self, handle: GameHandle) -> &mut Game {
        &mut self.games[handle.0]
    }

    pub fn is_new(&self, handle: GameHandle) -> bool {
        handle.0 >= self.loaded
    }

    /// Games created during this session that have not been saved yet.
    pub fn new_games(&self) -> &[Game] {
        &self.games[self.loaded..]
    }

    /// Save every new game plus the `changed` existing ones as one batch.
    /// Returns how many games were saved.
    pub fn synchronise(
        &mut self,
        store: &impl GameStore,
        changed: impl IntoIterator<Item = GameHandle>,
    ) -> Result<usize> {
        let handles: BTreeSet<GameHandle> = changed
            .into_iter()
            .chain((self.loaded..self.games.len()).map(GameHandle))
            .collect();
        if handles.is_empty() {
            return Ok(0);
        }

        let mut batch: Vec<Game> = handles.iter().map(|h| self.game(*h).clone()).collect();
        store.save_or_update(&mut batch)?;
        for (handle, saved) in handles.iter().zip(batch) {
            self.games[handle.0].id = saved.id;
        }
        self.loaded = self.games.len();
        Ok(handles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Competition, Location};
    use crate::store::InMemoryStore;

    fn key(opponents: &str) -> GameKey {
        GameKey::new(Competition::Prem, Location::Home, opponents, 2012)
    }

    fn kick_off(day: u32) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2012-09-{day:02} 15:00"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn stored(store: &InMemoryStore, opponents: &str, day: Option<u32>) {
        let mut game = Game::new(key(opponents));
        game.date_time_played = day.map(kick_off);
        store.save_or_update(&mut [game]).unwrap();
    }

    #[test]
    fn test_business_key_resolves_to_the_same_game() {
        let store = InMemoryStore::new();
        stored(&store, "Villa", Some(1));
        let mut resolver = GameResolver::load(&store).unwrap();

        let locator = GameLocator::BusinessKey(key("Villa"));
        let first = resolver.locate(&locator).unwrap();
        let second = resolver.locate(&locator).unwrap();
        assert_eq!(first, second);
        assert!(!resolver.is_new(first));
        assert_eq!(resolver.game(first).id, Some(1));
    }

    #[test]
    fn test_unknown_business_key_creates_one_provisional_game() {
        let store = InMemoryStore::new();
        let mut resolver = GameResolver::load(&store).unwrap();

        let locator = GameLocator::BusinessKey(key("Newcomers"));
        let first = resolver.locate(&locator).unwrap();
        let second = resolver.locate(&locator).unwrap();
        assert_eq!(first, second);
        assert!(resolver.is_new(first));
        assert_eq!(resolver.new_games().len(), 1);
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_date_played_finds_nothing() {
        let store = InMemoryStore::new();
        stored(&store, "Villa", Some(1));
        stored(&store, "Undated", None);
        let mut resolver = GameResolver::load(&store).unwrap();

        assert!(resolver.locate(&GameLocator::DatePlayed(kick_off(2))).is_none());
        assert!(resolver.new_games().is_empty());

        let villa = resolver.locate(&GameLocator::DatePlayed(kick_off(1))).unwrap();
        assert_eq!(resolver.game(villa).key, key("Villa"));
    }

    #[test]
    fn test_synchronise_saves_new_and_changed_games_in_one_batch() {
        let store = InMemoryStore::new();
        stored(&store, "Villa", Some(1));
        stored(&store, "Spurs", Some(8));
        let calls = store.save_calls();
        let mut resolver = GameResolver::load(&store).unwrap();

        let villa = resolver.locate(&GameLocator::BusinessKey(key("Villa"))).unwrap();
        resolver.game_mut(villa).result = Some("1-0".to_string());
        let new = resolver.locate(&GameLocator::BusinessKey(key("Newcomers"))).unwrap();

        assert_eq!(resolver.synchronise(&store, [villa]).unwrap(), 2);
        assert_eq!(store.save_calls(), calls + 1);
        assert_eq!(resolver.game(new).id, Some(3));
        assert!(!resolver.is_new(new));
        assert_eq!(
            store.find_by_id(1).unwrap().unwrap().result.as_deref(),
            Some("1-0")
        );
    }

    #[test]
    fn test_synchronise_without_changes_saves_nothing() {
        let store = InMemoryStore::new();
        stored(&store, "Villa", Some(1));
        let calls = store.save_calls();
        let mut resolver = GameResolver::load(&store).unwrap();
        assert_eq!(resolver.synchronise(&store, []).unwrap(), 0);
        assert_eq!(store.save_calls(), calls);
    }
}
