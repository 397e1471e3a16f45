//! Domain objects - the counter store and what is derived from it.

mod click;
mod counter;
mod leaderboard;

pub use click::{Click, MAX_CLICKS, MIN_CLICKS, UNKNOWN_COUNTRY};
pub use counter::{CounterSnapshot, CounterStore};
pub use leaderboard::{LeaderboardRow, WORLDWIDE, build_leaderboard};
