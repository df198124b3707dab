//! # Transferdesk Core Library
//!
//! Transfer and chip decisions for a fantasy football squad. All logic lives
//! here; the CLI is a thin layer that loads a season snapshot and prints
//! results as JSON.
//!
//! ## Architecture
//!
//! - **Ledger**: free transfers replayed from a versioned history snapshot,
//!   never stored
//! - **Chips**: per-instance availability, per-chip evaluators and a single
//!   arbitrated recommendation per gameweek
//! - **Planner**: weekly transfer candidates and the roll / use / hit decision
//! - **Urgent**: immediate replacements for critical player news, routed
//!   through a channel with duplicate suppression
//! - **Cycle**: the scheduled weekly run, degrading instead of failing when a
//!   data source is late
//!
//! ## Key Components
//!
//! - [`FreeTransferLedger`]: pure replay of transfer history
//! - [`ChipAvailabilityTracker`]: window-aware chip status
//! - [`ChipDecisionEngine`]: chip evaluation and arbitration
//! - [`TransferPlanner`]: weekly transfer plan
//! - [`UrgentResponseHandler`]: alert-driven replacements
//! - [`WeeklyCycle`]: orchestration with bounded fetches

pub mod chips;
pub mod cycle;
pub mod error;
pub mod events;
pub mod fixtures;
pub mod gameweek;
pub mod ledger;
pub mod planner;
pub mod snapshot;
pub mod sources;
pub mod squad;
pub mod storage;
pub mod urgent;

pub use chips::{
    ChipAvailabilityTracker, ChipCatalog, ChipContext, ChipDecision, ChipDecisionEngine, ChipName,
    ChipReport, ChipStatus, ChipUsageRecord, ChipUsageRegistry, Urgency,
};
pub use cycle::{CycleReport, CycleSources, WeeklyCycle};
pub use error::{ChipUsageError, ConfigError, CoreError, DataError, ValidationError};
pub use events::Event;
pub use fixtures::{Fixture, FixtureCalendar, GameweekProfile};
pub use gameweek::{Gameweek, GameweekId};
pub use ledger::{FreeTransferLedger, LedgerCache, LedgerState, TransferHistory};
pub use planner::{
    CandidatePriority, PlanAction, PlanReason, PlanningInputs, TransferCandidate, TransferPlan,
    TransferPlanner,
};
pub use snapshot::SeasonSnapshot;
pub use squad::{Player, PlayerId, PlayerStatus, Position, Squad};
pub use storage::EngineConfig;
pub use urgent::{
    AlertCategory, AlertRouter, IntelligenceAlert, Severity, TransferRecommendation,
    UrgentOutcome, UrgentResponseHandler,
};
