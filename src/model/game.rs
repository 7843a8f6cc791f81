use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

/// The competition a game is played in, keyed by the club's fixture codes.
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
    EnumString,
    EnumIter,
    strum_macros::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Competition {
    #[strum(serialize = "PREM")]
    Prem,
    #[strum(serialize = "FLC")]
    Flc,
    #[strum(serialize = "FLCPO")]
    FlcPlayOff,
    #[strum(serialize = "FACP")]
    Facp,
    #[strum(serialize = "LGCP")]
    Lgcp,
}

impl Competition {
    pub fn name(&self) -> &'static str {
        match self {
            Competition::Prem => "Premier League",
            Competition::Flc => "Championship",
            Competition::FlcPlayOff => "Championship Play-Offs",
            Competition::Facp => "FA Cup",
            Competition::Lgcp => "League Cup",
        }
    }
}

/// Whether a game is played at home or away.
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
    EnumString,
    strum_macros::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Location {
    #[strum(to_string = "HOME", serialize = "H")]
    Home,
    #[strum(to_string = "AWAY", serialize = "A")]
    Away,
}

/// The five stages in which tickets for a game go on sale.
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
    EnumIter,
    strum_macros::Display,
)]
pub enum TicketPhase {
    #[strum(to_string = "Bondholders")]
    Bondholders,
    #[strum(to_string = "Priority Point Postal")]
    PriorityPoint,
    #[strum(to_string = "Season Ticket Holders")]
    SeasonTickets,
    #[strum(to_string = "Academy Members")]
    AcademyMembers,
    #[strum(to_string = "General Sale")]
    GeneralSale,
}

impl TicketPhase {
    /// Recognise a phase from the free text used on the ticket news page.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_ascii_lowercase();
        if label.contains("bondholder") {
            Some(TicketPhase::Bondholders)
        } else if label.contains("priority") {
            Some(TicketPhase::PriorityPoint)
        } else if label.contains("season ticket") {
            Some(TicketPhase::SeasonTickets)
        } else if label.contains("academy") {
            Some(TicketPhase::AcademyMembers)
        } else if label.contains("general") {
            Some(TicketPhase::GeneralSale)
        } else {
            None
        }
    }
}

/// The business key of a game. Unique and immutable once a game exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameKey {
    pub competition: Competition,
    pub location: Location,
    pub opponents: String,
    pub season: i32,
}

impl GameKey {
    pub fn new(
        competition: Competition,
        location: Location,
        opponents: impl Into<String>,
        season: i32,
    ) -> Self {
        Self {
            competition,
            location,
            opponents: opponents.into(),
            season,
        }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {} {} {}]",
            self.opponents, self.location, self.competition, self.season
        )
    }
}

/// When each ticket phase opens, if announced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDates {
    pub bondholders: Option<NaiveDateTime>,
    pub priority_point: Option<NaiveDateTime>,
    pub season_tickets: Option<NaiveDateTime>,
    pub academy_members: Option<NaiveDateTime>,
    pub general_sale: Option<NaiveDateTime>,
}

impl TicketDates {
    pub fn get(&self, phase: TicketPhase) -> Option<NaiveDateTime> {
        match phase {
            TicketPhase::Bondholders => self.bondholders,
            TicketPhase::PriorityPoint => self.priority_point,
            TicketPhase::SeasonTickets => self.season_tickets,
            TicketPhase::AcademyMembers => self.academy_members,
            TicketPhase::GeneralSale => self.general_sale,
        }
    }

    pub fn get_mut(&mut self, phase: TicketPhase) -> &mut Option<NaiveDateTime> {
        match phase {
            TicketPhase::Bondholders => &mut self.bondholders,
            TicketPhase::PriorityPoint => &mut self.priority_point,
            TicketPhase::SeasonTickets => &mut self.season_tickets,
            TicketPhase::AcademyMembers => &mut self.academy_members,
            TicketPhase::GeneralSale => &mut self.general_sale,
        }
    }
}

/// A single match as stored in the game store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Assigned by the store on first save, never reused.
    pub id: Option<u32>,
    pub key: GameKey,
    pub date_time_played: Option<NaiveDateTime>,
    pub tickets: TicketDates,
    pub result: Option<String>,
    pub attendance: Option<u32>,
    pub match_report: Option<String>,
    pub television_channel: Option<String>,
    pub attended: bool,
}

impl Game {
    /// A provisional game known only by its business key.
    pub fn new(key: GameKey) -> Self {
        Self {
            id: None,
            key,
            date_time_played: None,
            tickets: TicketDates::default(),
            result: None,
            attendance: None,
            match_report: None,
            television_channel: None,
            attended: false,
        }
    }

    pub fn season(&self) -> i32 {
        self.key.season
    }

    pub fn location(&self) -> Location {
        self.key.location
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{id}:{}", self.key),
            None => write!(f, "new:{}", self.key),
        }
    }
}

/// The season a date falls in. Seasons start in July.
pub fn season_of(date_time: NaiveDateTime) -> i32 {
    if date_time.month() >= 7 {
        date_time.year()
    } else {
        date_time.year() - 1
    }
}
