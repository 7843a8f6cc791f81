use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

use crate::model::GameKey;

/// How an update command finds the game it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameLocator {
    BusinessKey(GameKey),
    DatePlayed(NaiveDateTime),
}

impl GameLocator {
    fn rank(&self) -> u8 {
        match self {
            GameLocator::BusinessKey(_) => 0,
            GameLocator::DatePlayed(_) => 1,
        }
    }
}

/// Business key locators always sort before date played locators.
impl Ord for GameLocator {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GameLocator::BusinessKey(a), GameLocator::BusinessKey(b)) => a.cmp(b),
            (GameLocator::DatePlayed(a), GameLocator::DatePlayed(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for GameLocator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GameLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameLocator::BusinessKey(key) => write!(f, "{key}"),
            GameLocator::DatePlayed(date) => write!(f, "{date}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Competition, Location};

    fn date(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 9, day)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_business_key_precedes_date_played() {
        let key = GameLocator::BusinessKey(GameKey::new(
            Competition::Prem,
            Location::Home,
            "Zulu",
            2099,
        ));
        let early = GameLocator::DatePlayed(date(1));
        assert!(key < early);
        assert!(early > key);
    }

    #[test]
    fn test_same_variant_compares_payload() {
        assert!(GameLocator::DatePlayed(date(1)) < GameLocator::DatePlayed(date(2)));
        let key =
            |opponents: &str| GameKey::new(Competition::Prem, Location::Home, opponents, 2012);
        let a = GameLocator::BusinessKey(key("A"));
        let b = GameLocator::BusinessKey(key("B"));
        assert!(a < b);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }
}
