//! Chips: single-use special actions, each valid inside its own window.
//!
//! - [`types`]: chip names, windows, catalog and derived status
//! - [`tracker`]: which instances are playable and which expire soon
//! - [`registry`]: serialized recording of confirmed plays
//! - [`decision`]: per-chip evaluators and cross-chip arbitration

pub mod decision;
pub mod registry;
pub mod tracker;
pub mod types;

pub use decision::{ChipContext, ChipDecision, ChipDecisionEngine, SlotPick, Urgency};
pub use registry::ChipUsageRegistry;
pub use tracker::{ChipAvailabilityTracker, ChipReport};
pub use types::{
    ChipCatalog, ChipCatalogData, ChipDefinition, ChipName, ChipStatus, ChipUsageRecord,
    ChipWindow, ChipWindowEntry,
};
