//! Leaderboard builder - a ranked, read-only view over a counter snapshot.

use chrono::{DateTime, Utc};

use super::counter::CounterSnapshot;

/// Name of the synthetic aggregate row.
pub const WORLDWIDE: &str = "Worldwide";

/// One leaderboard row. Only the worldwide row carries a rate.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub country: String,
    pub clicks: u64,
    /// Clicks per second since the service epoch.
    pub kps: Option<f64>,
}

/// Rank a snapshot.
///
/// The first row is always the worldwide total with its rate
/// (`total / seconds since epoch`, zero when no time has elapsed). Country
/// rows follow by descending count; equal counts are ordered by ascending
/// country name.
pub fn build_leaderboard(snapshot: &CounterSnapshot, now: DateTime<Utc>) -> Vec<LeaderboardRow> {
    let total = snapshot.total();

    let elapsed = (now - snapshot.epoch).num_milliseconds() as f64 / 1000.0;
    let kps = if elapsed > 0.0 {
        total as f64 / elapsed
    } else {
        0.0
    };

    let mut countries: Vec<LeaderboardRow> = snapshot
        .counts
        .iter()
        .map(|(country, clicks)| LeaderboardRow {
            country: country.clone(),
            clicks: *clicks,
            kps: None,
        })
        .collect();
    countries.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.country.cmp(&b.country)));

    let mut rows = Vec::with_capacity(countries.len() + 1);
    rows.push(LeaderboardRow {
        country: WORLDWIDE.to_string(),
        clicks: total,
        kps: Some(kps),
    });
    rows.extend(countries);
    rows
}
