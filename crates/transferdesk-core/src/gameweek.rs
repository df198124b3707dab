//! Gameweek slots of a 38-round season.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ordinal gameweek number, 1-based.
pub type GameweekId = u32;

/// Number of gameweeks in a season.
pub const SEASON_GAMEWEEKS: GameweekId = 38;

/// One scheduling slot of the season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gameweek {
    pub id: GameweekId,
    /// Transfer deadline for this gameweek
    pub deadline: DateTime<Utc>,
    /// Finished gameweeks are immutable history
    #[serde(default)]
    pub finished: bool,
}

impl Gameweek {
    /// When the scheduled weekly cycle should run for this gameweek.
    pub fn cycle_run_at(&self, lead_time: Duration) -> DateTime<Utc> {
        self.deadline - lead_time
    }

    /// Whether the transfer window for this gameweek is still open at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.finished && now < self.deadline
    }
}

/// Reject gameweeks outside 1..=38.
pub fn validate_gameweek(gw: GameweekId) -> Result<GameweekId, ValidationError> {
    if (1..=SEASON_GAMEWEEKS).contains(&gw) {
        Ok(gw)
    } else {
        Err(ValidationError::GameweekOutOfRange(gw))
    }
}

/// The first gameweek whose deadline has not passed at `now`.
pub fn next_open_gameweek(gameweeks: &[Gameweek], now: DateTime<Utc>) -> Option<&Gameweek> {
    gameweeks
        .iter()
        .filter(|gw| gw.is_open(now))
        .min_by_key(|gw| gw.deadline)
}
