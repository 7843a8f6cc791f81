use std::fmt;

use chrono::NaiveDateTime;

use crate::model::{Game, GameLocator, TicketPhase};

/// A single field change scraped from a page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameUpdate {
    DatePlayed(NaiveDateTime),
    TicketDate(TicketPhase, NaiveDateTime),
    Result(String),
    Attendance(u32),
    MatchReport(String),
    TelevisionChannel(String),
}

impl GameUpdate {
    /// Apply to `game`, returning whether the game actually changed.
    pub fn apply(&self, game: &mut Game) -> bool {
        match self {
            GameUpdate::DatePlayed(date) => set(&mut game.date_time_played, *date),
            GameUpdate::TicketDate(phase, date) => set(game.tickets.get_mut(*phase), *date),
            GameUpdate::Result(result) => set(&mut game.result, result.clone()),
            GameUpdate::Attendance(attendance) => set(&mut game.attendance, *attendance),
            GameUpdate::MatchReport(report) => set(&mut game.match_report, report.clone()),
            GameUpdate::TelevisionChannel(channel) => {
                set(&mut game.television_channel, channel.clone())
            }
        }
    }
}

fn set<T: PartialEq>(field: &mut Option<T>, value: T) -> bool {
    if field.as_ref() == Some(&value) {
        false
    } else {
        *field = Some(value);
        true
    }
}

impl fmt::Display for GameUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameUpdate::DatePlayed(date) => write!(f, "date played {date}"),
            GameUpdate::TicketDate(phase, date) => write!(f, "{phase} tickets {date}"),
            GameUpdate::Result(result) => write!(f, "result {result}"),
            GameUpdate::Attendance(attendance) => write!(f, "attendance {attendance}"),
            GameUpdate::MatchReport(report) => write!(f, "match report {report}"),
            GameUpdate::TelevisionChannel(channel) => write!(f, "television {channel}"),
        }
    }
}

/// A locator paired with the update to apply to whatever it finds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameUpdateCommand {
    pub locator: GameLocator,
    pub update: GameUpdate,
}

impl GameUpdateCommand {
    pub fn new(locator: GameLocator, update: GameUpdate) -> Self {
        Self { locator, update }
    }

    pub fn apply(&self, game: &mut Game) -> bool {
        self.update.apply(game)
    }
}

impl fmt::Display for GameUpdateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.locator, self.update)
    }
}

/// Commands in a deterministic order: grouped by locator, scan order within a
/// locator, with exact duplicates collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCommands {
    commands: Vec<GameUpdateCommand>,
}

impl UpdateCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. A duplicate replaces the earlier copy, keeping the
    /// later scan position.
    pub fn push(&mut self, command: GameUpdateCommand) {
        self.commands.retain(|existing| existing != &command);
        let at = self
            .commands
            .partition_point(|existing| existing.locator <= command.locator);
        self.commands.insert(at, command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GameUpdateCommand> {
        self.commands.iter()
    }
}

impl Extend<GameUpdateCommand> for UpdateCommands {
    fn extend<I: IntoIterator<Item = GameUpdateCommand>>(&mut self, iter: I) {
        for command in iter {
            self.push(command);
        }
    }
}

impl FromIterator<GameUpdateCommand> for UpdateCommands {
    fn from_iter<I: IntoIterator<Item = GameUpdateCommand>>(iter: I) -> Self {
        let mut commands = Self::new();
        commands.extend(iter);
        commands
    }
}

impl IntoIterator for UpdateCommands {
    type Item = GameUpdateCommand;
    type IntoIter = std::vec::IntoIter<GameUpdateCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a UpdateCommands {
    type Item = &'a GameUpdateCommand;
    type IntoIter = std::slice::Iter<'a, GameUpdateCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use itertools::Itertools;

    use super::*;
    use crate::model::{Competition, GameKey, Location};

    fn key(opponents: &str) -> GameKey {
        GameKey::new(Competition::Prem, Location::Home, opponents, 2012)
    }

    fn result(opponents: &str, score: &str) -> GameUpdateCommand {
        GameUpdateCommand::new(
            GameLocator::BusinessKey(key(opponents)),
            GameUpdate::Result(score.to_string()),
        )
    }

    #[test]
    fn test_apply_reports_change_only_once() {
        let mut game = Game::new(key("Them"));
        let update = GameUpdate::Result("1-0".to_string());
        assert!(update.apply(&mut game));
        assert!(!update.apply(&mut game));
        assert_eq!(game.result.as_deref(), Some("1-0"));
    }

    #[test]
    fn test_ticket_date_sets_only_its_phase() {
        let mut game = Game::new(key("Them"));
        let opens = NaiveDate::from_ymd_opt(2012, 7, 23)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(GameUpdate::TicketDate(TicketPhase::AcademyMembers, opens).apply(&mut game));
        assert_eq!(game.tickets.academy_members, Some(opens));
        assert_eq!(game.tickets.general_sale, None);
    }

    #[test]
    fn test_commands_keep_scan_order_within_locator() {
        let commands: UpdateCommands = [
            result("Them", "2-0"),
            result("Another", "0-0"),
            result("Them", "1-0"),
        ]
        .into_iter()
        .collect();
        let scores = commands
            .iter()
            .map(|c| match &c.update {
                GameUpdate::Result(score) => score.as_str(),
                _ => unreachable!(),
            })
            .collect_vec();
        assert_eq!(scores, vec!["0-0", "2-0", "1-0"]);
    }

    #[test]
    fn test_duplicates_collapse_to_later_position() {
        let mut commands = UpdateCommands::new();
        commands.push(result("Them", "1-0"));
        commands.push(result("Them", "2-0"));
        commands.push(result("Them", "1-0"));
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands.iter().last().map(|c| c.update.clone()),
            Some(GameUpdate::Result("1-0".to_string()))
        );
    }
}
