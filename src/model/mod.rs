mod calendar;
mod change_log;
mod game;
mod locator;
mod update;

pub use calendar::*;
pub use change_log::*;
pub use game::*;
pub use locator::*;
pub use update::*;
