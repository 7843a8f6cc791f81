pub use calendar::{CalendarApi, InMemoryCalendarApi};
pub use client::HammersCalendar;
pub use config::Config;
pub use error::{HammersError, Result};
pub use store::{CalendarConfigurationStore, GameStore, InMemoryStore};

pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod scanner;
pub mod store;
pub mod update;
