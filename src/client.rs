use chrono::Local;
use tracing::{info, instrument};

use crate::calendar::{CalendarApi, CalendarProjector, CalendarTable};
use crate::config::Config;
use crate::error::Result;
use crate::model::{season_of, ChangeLog};
use crate::scanner::{
    find_main_page_links, FixturesScanner, HttpPageLoader, MainPageLinks, PageLoader,
    TicketsScanner,
};
use crate::store::{CalendarConfigurationStore, GameStore};
use crate::update::{UpdateService, UpdateSummary};

/// The main entry point: scans the club's site, updates the game store and
/// mirrors the stored games into the external calendars.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> hammers_calendar::Result<()> {
/// use hammers_calendar::{Config, HammersCalendar, InMemoryCalendarApi, InMemoryStore};
///
/// let config = Config::from_file("hammers.toml")?;
/// let hammers =
///     HammersCalendar::from_config(config, InMemoryStore::new(), InMemoryCalendarApi::new())?;
/// let changes = hammers.update_all_calendars().await?;
/// for change in changes.changes() {
///     println!("{change}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct HammersCalendar<L, S, A> {
    config: Config,
    loader: L,
    store: S,
    api: A,
    table: CalendarTable,
}

impl<S, A> HammersCalendar<HttpPageLoader, S, A> {
    /// Create a calendar updater that fetches pages over HTTP.
    pub fn from_config(config: Config, store: S, api: A) -> Result<Self> {
        let loader = HttpPageLoader::from_config(&config.http)?;
        Ok(Self::with_loader(config, loader, store, api))
    }
}

impl<L, S, A> HammersCalendar<L, S, A> {
    /// Create a calendar updater using the provided [`PageLoader`].
    pub fn with_loader(config: Config, loader: L, store: S, api: A) -> Self {
        let table = CalendarTable::from_config(&config.calendars);
        Self {
            config,
            loader,
            store,
            api,
            table,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

impl<L, S, A> HammersCalendar<L, S, A>
where
    L: PageLoader,
    S: GameStore + CalendarConfigurationStore,
    A: CalendarApi,
{
    /// Scan for updates, then project every stored game.
    #[instrument(skip(self))]
    pub async fn update_all_calendars(&self) -> Result<ChangeLog> {
        self.scan_for_updates().await?;
        let games = self.store.get_all()?;
        self.projector().update_calendars(&games).await
    }

    /// Scan for updates, then project the games of the current season.
    #[instrument(skip(self))]
    pub async fn update_all_calendars_this_season(&self) -> Result<ChangeLog> {
        self.update_all_calendars_for_season(season_of(Local::now().naive_local()))
            .await
    }

    /// Scan for updates, then project the games of `season`.
    #[instrument(skip(self))]
    pub async fn update_all_calendars_for_season(&self, season: i32) -> Result<ChangeLog> {
        self.scan_for_updates().await?;
        let games = self.store.get_all_for_season(season)?;
        self.projector().update_calendars(&games).await
    }

    /// Run the fixtures pass and then the ticket news pass.
    #[instrument(skip(self))]
    pub async fn scan_for_updates(&self) -> Result<(UpdateSummary, UpdateSummary)> {
        let links = self.main_page_links().await?;
        let updates = UpdateService::new(&self.store);
        let fixtures = updates
            .process_updates("fixture", &links.fixtures, &self.loader, &FixturesScanner)
            .await?;
        let tickets = updates
            .process_updates("ticket", &links.tickets, &self.loader, &TicketsScanner)
            .await?;
        Ok((fixtures, tickets))
    }

    async fn main_page_links(&self) -> Result<MainPageLinks> {
        let home_page = self.config.home_page_url()?;
        info!(%home_page, "reading main page");
        let document = self.loader.load_page(&home_page).await?;
        find_main_page_links(&home_page, &document, &self.config.site)
    }

    pub fn attend_game(&self, game_id: u32) -> Result<()> {
        UpdateService::new(&self.store).attend_game(game_id)
    }

    pub fn unattend_game(&self, game_id: u32) -> Result<()> {
        UpdateService::new(&self.store).unattend_game(game_id)
    }

    pub fn attend_all_home_games_for_season(&self, season: i32) -> Result<usize> {
        UpdateService::new(&self.store).attend_all_home_games_for_season(season)
    }

    fn projector(&self) -> CalendarProjector<'_, A, S> {
        CalendarProjector::new(&self.api, &self.store, &self.table)
    }
}
