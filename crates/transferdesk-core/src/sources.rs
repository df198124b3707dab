use crate::chips::ChipCatalog;
use crate::error::DataError;
use crate::fixtures::FixtureCalendar;
use crate::ledger::TransferHistory;
use crate::squad::{Player, Squad};

/// Chronological transfer usage of the managed team.
/// Implementations own fetching and caching; the engine only reads.
pub trait HistorySource: Send + Sync {
    fn transfer_history(&self) -> Result<TransferHistory, DataError>;
}

/// Season chip windows plus confirmed usage.
pub trait ChipCatalogSource: Send + Sync {
    fn chip_catalog(&self) -> Result<ChipCatalog, DataError>;
}

/// Per-gameweek fixture list with difficulty ratings.
pub trait FixtureSource: Send + Sync {
    fn fixture_calendar(&self) -> Result<FixtureCalendar, DataError>;
}

/// Current squad of the managed team.
pub trait RosterSource: Send + Sync {
    fn squad(&self) -> Result<Squad, DataError>;
}

/// Candidate pool ranked by the external value model, best first, with
/// point projections filled in by the oracle.
pub trait PlayerPoolSource: Send + Sync {
    fn ranked_players(&self) -> Result<Vec<Player>, DataError>;
}
