//! Chip availability tracking.
//!
//! A usage record consumes an instance only when its gameweek falls inside
//! that instance's own window. Two same-named chips with disjoint windows
//! are therefore tracked independently, and a record that fits no window is
//! reported as upstream corruption instead of consuming anything.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::types::{ChipCatalog, ChipDefinition, ChipName, ChipStatus, ChipUsageRecord};
use crate::error::DataError;
use crate::gameweek::GameweekId;

/// Status of every chip instance at one gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipReport {
    pub gameweek: GameweekId,
    pub statuses: Vec<ChipStatus>,
    /// Usage records that matched no window; excluded from the statuses
    #[serde(default)]
    pub invalid_usages: Vec<String>,
}

impl ChipReport {
    pub fn available_now(&self) -> impl Iterator<Item = &ChipStatus> {
        self.statuses.iter().filter(|s| s.available_now)
    }

    pub fn expiring_soon(&self) -> impl Iterator<Item = &ChipStatus> {
        self.statuses.iter().filter(|s| s.expires_soon)
    }

    pub fn status_of(&self, name: ChipName, instance: u8) -> Option<&ChipStatus> {
        self.statuses
            .iter()
            .find(|s| s.name == name && s.instance == instance)
    }
}

#[derive(Debug, Clone)]
pub struct ChipAvailabilityTracker {
    warning_window: u32,
}

impl ChipAvailabilityTracker {
    pub fn new(warning_window: u32) -> Self {
        Self { warning_window }
    }

    pub fn warning_window(&self) -> u32 {
        self.warning_window
    }

    /// Status of one instance at `current_gw`.
    pub fn status(
        &self,
        definition: &ChipDefinition,
        usage: &[ChipUsageRecord],
        current_gw: GameweekId,
    ) -> ChipStatus {
        let window = definition.window;
        let used_in = usage
            .iter()
            .find(|u| u.name == definition.name && window.contains(u.gameweek))
            .map(|u| u.gameweek);
        let used = used_in.is_some();

        let available_now = !used && window.contains(current_gw);
        let gws_until_expiry = (window.stop_gw + 1).saturating_sub(current_gw);
        let expires_soon =
            available_now && gws_until_expiry > 0 && gws_until_expiry <= self.warning_window;

        ChipStatus {
            name: definition.name,
            instance: definition.instance,
            window,
            used,
            used_in,
            available_now,
            gws_until_expiry,
            expires_soon,
        }
    }

    /// Status of every instance in the catalog.
    pub fn status_all(&self, catalog: &ChipCatalog, current_gw: GameweekId) -> ChipReport {
        let invalid: Vec<String> = Self::invalid_usages(catalog)
            .into_iter()
            .map(|e| {
                warn!(error = %e, "ignoring chip usage outside its window");
                e.to_string()
            })
            .collect();

        let statuses = catalog
            .definitions()
            .iter()
            .map(|d| self.status(d, catalog.usage(), current_gw))
            .collect();

        ChipReport {
            gameweek: current_gw,
            statuses,
            invalid_usages: invalid,
        }
    }

    /// Usage records that fall inside no window of their chip.
    pub fn invalid_usages(catalog: &ChipCatalog) -> Vec<DataError> {
        catalog
            .usage()
            .iter()
            .filter(|u| catalog.instance_at(u.name, u.gameweek).is_none())
            .map(|u| DataError::InvalidWindow {
                chip: u.name,
                gameweek: u.gameweek,
            })
            .collect()
    }
}

impl Default for ChipAvailabilityTracker {
    fn default() -> Self {
        Self::new(3)
    }
}
