use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use crate::calendar::{
    find_game, CalendarApi, CalendarSpec, CalendarTable, EventData, RemoteEvent,
};
use crate::error::Result;
use crate::model::{
    CalendarConfiguration, CalendarType, ChangeAction, ChangeLog, Game, UpdateChangeLog,
};
use crate::store::CalendarConfigurationStore;

/// Keeps the external calendars in step with the stored games.
///
/// The stored games are authoritative. Remote events are found through the
/// event ids remembered in each [`CalendarConfiguration`], falling back to
/// [`find_game`] when a remembered id has gone stale. A remote create whose
/// id is lost before the configuration is saved leaves a duplicate behind;
/// the next pass finds one copy and deletes the rest.
pub struct CalendarProjector<'a, A, C> {
    api: &'a A,
    configurations: &'a C,
    table: &'a CalendarTable,
}

impl<'a, A, C> CalendarProjector<'a, A, C>
where
    A: CalendarApi,
    C: CalendarConfigurationStore,
{
    pub fn new(api: &'a A, configurations: &'a C, table: &'a CalendarTable) -> Self {
        Self {
            api,
            configurations,
            table,
        }
    }

    /// Create a calendar, or bring an existing one's title and description
    /// up to date. Returns the calendar id, which only changes when a new
    /// calendar had to be created.
    pub async fn create_or_update_calendar(
        &self,
        calendar_id: Option<&str>,
        title: &str,
        description: &str,
    ) -> Result<String> {
        let Some(calendar_id) = calendar_id else {
            let calendar_id = self.api.create_calendar(title, description).await?;
            info!(%calendar_id, title, "created calendar");
            return Ok(calendar_id);
        };
        match self.api.get_calendar(calendar_id).await? {
            Some(remote) if remote.title == title && remote.description == description => {
                debug!(calendar_id, "calendar unchanged");
            }
            Some(_) => {
                self.api
                    .update_calendar(calendar_id, title, description)
                    .await?;
                info!(calendar_id, title, "updated calendar");
            }
            None => {
                warn!(calendar_id, title, "calendar has gone, creating a new one");
                let calendar_id = self.api.create_calendar(title, description).await?;
                return Ok(calendar_id);
            }
        }
        Ok(calendar_id.to_string())
    }

    /// Project `games` onto every calendar in the table.
    ///
    /// A game whose event leaves one game calendar for another is reported
    /// as moved on the calendar it left and created on the one it joined.
    #[instrument(skip_all, fields(games = games.len()))]
    pub async fn update_calendars(&self, games: &[Game]) -> Result<ChangeLog> {
        let mut log = ChangeLog::new();
        for spec in self.table.iter() {
            let calendar_log = self.update_calendar(spec, games).await?;
            log.merge(calendar_log);
        }
        fold_moves(&mut log);
        info!(
            entries = log.len(),
            changes = log.changes().count(),
            "calendars updated"
        );
        Ok(log)
    }

    async fn update_calendar(&self, spec: &CalendarSpec, games: &[Game]) -> Result<ChangeLog> {
        let calendar_type = spec.calendar_type;
        let mut configuration = self
            .configurations
            .find_by_calendar_type(calendar_type)?
            .unwrap_or_else(|| CalendarConfiguration::new(calendar_type));
        let calendar_id = self
            .create_or_update_calendar(
                configuration.calendar_id.as_deref(),
                &spec.title,
                &spec.description,
            )
            .await?;
        if configuration.calendar_id.as_deref() != Some(calendar_id.as_str()) {
            configuration.event_ids_by_game_id.clear();
            configuration.calendar_id = Some(calendar_id.clone());
            self.configurations
                .save_calendar_configuration(&configuration)?;
        }

        let mut log = ChangeLog::new();
        for game in games {
            let Some(game_id) = game.id else {
                debug!(%game, "skipping unsaved game");
                continue;
            };
            let desired = spec.event_for(game);
            let known = self
                .known_event(&calendar_id, &mut configuration, game_id, desired.as_ref())
                .await?;

            let action = match (desired, known) {
                (None, None) => None,
                (Some(desired), None) => {
                    let event_id = self.api.create_event(&calendar_id, &desired).await?;
                    info!(%calendar_type, %game, %event_id, "created event");
                    configuration.event_ids_by_game_id.insert(game_id, event_id);
                    Some(ChangeAction::Created)
                }
                (Some(desired), Some(remote)) => {
                    let changed = desired.changed_fields(&remote.data);
                    if !changed.is_empty() {
                        self.api
                            .update_event(&calendar_id, &remote.event_id, &desired)
                            .await?;
                        info!(%calendar_type, %game, ?changed, "updated event");
                    }
                    Some(ChangeAction::Updated {
                        changed: !changed.is_empty(),
                    })
                }
                (None, Some(remote)) => {
                    self.api.delete_event(&calendar_id, &remote.event_id).await?;
                    info!(%calendar_type, %game, event_id = %remote.event_id, "removed event");
                    configuration.event_ids_by_game_id.remove(&game_id);
                    Some(ChangeAction::Removed)
                }
            };
            if let Some(action) = action {
                log.record(UpdateChangeLog::new(calendar_type, game.key.clone(), action));
            }
        }

        self.sweep_strays(spec, &calendar_id, &configuration, games, &mut log)
            .await?;
        self.configurations
            .save_calendar_configuration(&configuration)?;
        Ok(log)
    }

    /// The remote event currently standing for a game, if any.
    ///
    /// The remembered event id is trusted only if the event still exists and
    /// still carries the game's id. Otherwise the calendar is searched, but
    /// only when the game belongs here or was remembered as being here.
    async fn known_event(
        &self,
        calendar_id: &str,
        configuration: &mut CalendarConfiguration,
        game_id: u32,
        desired: Option<&EventData>,
    ) -> Result<Option<RemoteEvent>> {
        let remote_game_id = game_id.to_string();
        let remembered = configuration.event_ids_by_game_id.remove(&game_id);
        if let Some(event_id) = &remembered {
            match self.api.get_event(calendar_id, event_id).await? {
                Some(remote) if remote.data.game_id == remote_game_id => {
                    configuration
                        .event_ids_by_game_id
                        .insert(game_id, remote.event_id.clone());
                    return Ok(Some(remote));
                }
                _ => warn!(calendar_id, game_id, %event_id, "remembered event is stale"),
            }
        }
        if desired.is_none() && remembered.is_none() {
            return Ok(None);
        }

        let search_date = desired.map(|d| d.window.start);
        let found = find_game(self.api, calendar_id, &remote_game_id, search_date).await?;
        Ok(found.map(|found| {
            configuration
                .event_ids_by_game_id
                .insert(game_id, found.event.event_id.clone());
            found.event
        }))
    }

    /// Delete every event of a projected game other than the remembered one.
    async fn sweep_strays(
        &self,
        spec: &CalendarSpec,
        calendar_id: &str,
        configuration: &CalendarConfiguration,
        games: &[Game],
        log: &mut ChangeLog,
    ) -> Result<()> {
        let projected: BTreeMap<String, &Game> = games
            .iter()
            .filter_map(|g| g.id.map(|id| (id.to_string(), g)))
            .collect();
        let listed = self.api.list_event_ids_by_game_id(calendar_id).await?;

        for (remote_game_id, event_ids) in listed {
            let Some(game) = projected.get(&remote_game_id) else {
                continue;
            };
            let remembered = game
                .id
                .and_then(|id| configuration.event_ids_by_game_id.get(&id));
            for event_id in event_ids {
                if remembered == Some(&event_id) {
                    continue;
                }
                self.api.delete_event(calendar_id, &event_id).await?;
                warn!(calendar_type = %spec.calendar_type, %game, %event_id, "removed stray event");
                if !spec.contains(game) {
                    log.record(UpdateChangeLog::new(
                        spec.calendar_type,
                        game.key.clone(),
                        ChangeAction::Removed,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Replace `removed` on one game calendar by `moved` when the same game was
/// created on the calendar it moves to.
fn fold_moves(log: &mut ChangeLog) {
    let removed = log
        .iter()
        .filter(|e| e.action == ChangeAction::Removed)
        .cloned()
        .collect::<Vec<_>>();
    for entry in removed {
        let destination = CalendarType::all()
            .filter(|to| entry.calendar_type.moves_to(*to))
            .find(|to| {
                log.contains(&UpdateChangeLog::new(
                    *to,
                    entry.game.clone(),
                    ChangeAction::Created,
                ))
            });
        if let Some(to) = destination {
            log.remove(&entry);
            log.record(UpdateChangeLog::new(
                entry.calendar_type,
                entry.game,
                ChangeAction::Moved { to },
            ));
        }
    }
}
