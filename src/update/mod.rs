mod resolver;

pub use resolver::{GameHandle, GameResolver};

use std::collections::BTreeMap;

use reqwest::Url;
use tracing::{debug, info, instrument};

use crate::error::{HammersError, Result};
use crate::model::{GameKey, GameUpdateCommand, UpdateCommands};
use crate::scanner::{GamesScanner, PageLoader};
use crate::store::{home_games, GameStore};

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Commands whose game could not be located.
    pub dropped: usize,
    pub saved: usize,
}

/// Applies scraped updates and attendance changes to the game store.
pub struct UpdateService<'a, S> {
    store: &'a S,
}

impl<'a, S: GameStore> UpdateService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Load a page, scan it and reconcile its commands with the store.
    #[instrument(skip(self, url, loader, scanner), fields(url = %url))]
    pub async fn process_updates<L, G>(
        &self,
        label: &str,
        url: &Url,
        loader: &L,
        scanner: &G,
    ) -> Result<UpdateSummary>
    where
        L: PageLoader,
        G: GamesScanner,
    {
        info!("scanning for {label} changes");
        let commands = {
            let document = loader.load_page(url).await?;
            scanner.scan(url, &document)?
        };
        self.apply_updates(label, &commands)
    }

    /// Apply every command to the game it locates, then save the new games
    /// and the games that actually changed in a single batch.
    ///
    /// Commands for one game are applied in the order given, so a later
    /// command for the same field wins.
    pub fn apply_updates(&self, label: &str, commands: &UpdateCommands) -> Result<UpdateSummary> {
        let mut resolver = GameResolver::load(self.store)?;
        let mut summary = UpdateSummary::default();

        let mut updates_by_game: BTreeMap<GameKey, (GameHandle, Vec<&GameUpdateCommand>)> =
            BTreeMap::new();
        for command in commands {
            match resolver.locate(&command.locator) {
                Some(handle) => updates_by_game
                    .entry(resolver.game(handle).key.clone())
                    .or_insert_with(|| (handle, vec![]))
                    .1
                    .push(command),
                None => {
                    debug!(%command, "no game found, dropping update");
                    summary.dropped += 1;
                }
            }
        }
        summary.created = resolver.new_games().len();

        let mut changed = vec![];
        for (handle, game_commands) in updates_by_game.into_values() {
            let game = resolver.game_mut(handle);
            let mut updated = false;
            for command in game_commands {
                updated |= command.apply(game);
            }
            if updated {
                info!(%game, "updating game");
                changed.push(handle);
            } else {
                debug!(%game, "ignoring game");
                summary.unchanged += 1;
            }
        }
        summary.updated = changed.iter().filter(|h| !resolver.is_new(**h)).count();
        summary.saved = resolver.synchronise(self.store, changed)?;

        info!(
            label,
            created = summary.created,
            updated = summary.updated,
            dropped = summary.dropped,
            "applied {} updates",
            commands.len()
        );
        Ok(summary)
    }

    pub fn attend_game(&self, game_id: u32) -> Result<()> {
        self.set_attended(game_id, true)
    }

    pub fn unattend_game(&self, game_id: u32) -> Result<()> {
        self.set_attended(game_id, false)
    }

    /// Mark every home game of `season` as attended. Returns how many changed.
    pub fn attend_all_home_games_for_season(&self, season: i32) -> Result<usize> {
        let mut games = home_games(self.store.get_all_for_season(season)?)
            .filter(|g| !g.attended)
            .collect::<Vec<_>>();
        if games.is_empty() {
            return Ok(0);
        }
        for game in &mut games {
            game.attended = true;
        }
        self.store.save_or_update(&mut games)?;
        info!(season, count = games.len(), "attending all home games");
        Ok(games.len())
    }

    fn set_attended(&self, game_id: u32, attended: bool) -> Result<()> {
        let mut game = self
            .store
            .find_by_id(game_id)?
            .ok_or(HammersError::GameNotFound(game_id))?;
        if game.attended != attended {
            game.attended = attended;
            info!(%game, attended, "changing attendance");
            self.store.save_or_update(std::slice::from_mut(&mut game))?;
        }
        Ok(())
    }
}
