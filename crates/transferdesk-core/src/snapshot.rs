//! Season snapshot file.
//!
//! One JSON document holding everything the engine reads: gameweek
//! deadlines, transfer history, chip windows and usage, fixtures, the
//! managed squad and the ranked player pool. It implements every source
//! trait, so the CLI and the tests drive the engine through the same seams
//! a live feed would.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chips::ChipCatalog;
use crate::error::{CoreError, DataError, ValidationError};
use crate::fixtures::FixtureCalendar;
use crate::gameweek::{next_open_gameweek, validate_gameweek, Gameweek, GameweekId};
use crate::ledger::TransferHistory;
use crate::sources::{ChipCatalogSource, FixtureSource, HistorySource, PlayerPoolSource, RosterSource};
use crate::squad::{Player, Squad};
use crate::urgent::IntelligenceAlert;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSnapshot {
    #[serde(default)]
    pub season: String,
    /// Overrides deadline-based detection when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_gameweek: Option<GameweekId>,
    #[serde(default)]
    pub gameweeks: Vec<Gameweek>,
    #[serde(default)]
    pub history: TransferHistory,
    #[serde(default = "ChipCatalog::standard_two_halves")]
    pub chips: ChipCatalog,
    #[serde(default)]
    pub fixtures: FixtureCalendar,
    pub squad: Squad,
    /// Ranked best first
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_transfer_override: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<IntelligenceAlert>,
}

impl SeasonSnapshot {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&content)?;
        debug!(path = %path.display(), season = %snapshot.season, "snapshot loaded");
        Ok(snapshot)
    }

    pub fn from_json(content: &str) -> Result<Self, CoreError> {
        let snapshot: Self = serde_json::from_str(content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.squad.players.is_empty() {
            return Err(ValidationError::EmptyCollection("squad.players".into()));
        }
        if let Some(gw) = self.current_gameweek {
            validate_gameweek(gw)?;
        }
        for gw in &self.gameweeks {
            validate_gameweek(gw.id)?;
        }
        Ok(())
    }

    /// The gameweek to plan for at `now`: the explicit value, else the
    /// next open deadline, else the one after the last recorded history.
    pub fn current_gameweek(&self, now: DateTime<Utc>) -> GameweekId {
        self.current_gameweek
            .or_else(|| next_open_gameweek(&self.gameweeks, now).map(|gw| gw.id))
            .or_else(|| self.history.last_recorded().map(|gw| gw + 1))
            .unwrap_or(1)
    }

    pub fn gameweek(&self, id: GameweekId) -> Option<&Gameweek> {
        self.gameweeks.iter().find(|gw| gw.id == id)
    }
}

impl HistorySource for SeasonSnapshot {
    fn transfer_history(&self) -> Result<TransferHistory, DataError> {
        Ok(self.history.clone())
    }
}

impl ChipCatalogSource for SeasonSnapshot {
    fn chip_catalog(&self) -> Result<ChipCatalog, DataError> {
        Ok(self.chips.clone())
    }
}

impl FixtureSource for SeasonSnapshot {
    fn fixture_calendar(&self) -> Result<FixtureCalendar, DataError> {
        Ok(self.fixtures.clone())
    }
}

impl RosterSource for SeasonSnapshot {
    fn squad(&self) -> Result<Squad, DataError> {
        Ok(self.squad.clone())
    }
}

impl PlayerPoolSource for SeasonSnapshot {
    fn ranked_players(&self) -> Result<Vec<Player>, DataError> {
        if self.players.is_empty() {
            return Err(DataError::unavailable("player pool", "snapshot has no ranked players"));
        }
        Ok(self.players.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MINIMAL: &str = r#"{
        "season": "2025/26",
        "gameweeks": [
            {"id": 9, "deadline": "2025-10-18T10:00:00Z", "finished": true},
            {"id": 10, "deadline": "2025-10-25T10:00:00Z"}
        ],
        "history": {"entries": [{"gameweek": 1, "transfers_used": 0}]},
        "squad": {
            "players": [
                {"id": 1, "name": "Keeper", "team": 3, "position": "goalkeeper", "price": 4.5}
            ]
        }
    }"#;

    #[test]
    fn minimal_snapshot_fills_defaults() {
        let snapshot = SeasonSnapshot::from_json(MINIMAL).unwrap();
        assert_eq!(snapshot.chips.definitions().len(), 8);
        assert!(snapshot.players.is_empty());
        assert!(snapshot.ranked_players().is_err());
        assert_eq!(snapshot.squad().unwrap().players.len(), 1);
    }

    #[test]
    fn current_gameweek_from_deadlines() {
        let snapshot = SeasonSnapshot::from_json(MINIMAL).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0).unwrap();
        assert_eq!(snapshot.current_gameweek(now), 10);

        let after_season = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(snapshot.current_gameweek(after_season), 2);
    }

    #[test]
    fn empty_squad_rejected() {
        let err = SeasonSnapshot::from_json(r#"{"squad": {"players": []}}"#).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyCollection(_))));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("season.json");
        let snapshot = SeasonSnapshot::from_json(MINIMAL).unwrap();
        snapshot.save(&path).unwrap();
        assert_eq!(SeasonSnapshot::load(&path).unwrap(), snapshot);
    }
}
