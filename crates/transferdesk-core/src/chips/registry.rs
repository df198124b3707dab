//! Serialized creation of chip usage records.
//!
//! Records are written only when a chip play has been confirmed upstream,
//! at most once per instance. All writes go through one mutex, so two
//! confirmations racing for the same instance cannot both succeed.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::info;

use super::types::{ChipCatalog, ChipDefinition, ChipName, ChipUsageRecord};
use crate::error::ChipUsageError;
use crate::gameweek::GameweekId;

type InstanceKey = (ChipName, u8);

#[derive(Debug)]
pub struct ChipUsageRegistry {
    definitions: Vec<ChipDefinition>,
    records: Mutex<HashMap<InstanceKey, ChipUsageRecord>>,
}

impl ChipUsageRegistry {
    /// Seed the registry from a catalog. Existing records that fit no window
    /// are left out.
    pub fn new(catalog: &ChipCatalog) -> Self {
        let mut records = HashMap::new();
        for usage in catalog.usage() {
            if let Some(def) = catalog.instance_at(usage.name, usage.gameweek) {
                records.entry((def.name, def.instance)).or_insert(*usage);
            }
        }
        Self {
            definitions: catalog.definitions().to_vec(),
            records: Mutex::new(records),
        }
    }

    /// Record a confirmed chip play in `gameweek`.
    pub fn record_confirmed(
        &self,
        name: ChipName,
        gameweek: GameweekId,
    ) -> Result<ChipUsageRecord, ChipUsageError> {
        let def = self
            .definitions
            .iter()
            .find(|d| d.name == name && d.window.contains(gameweek))
            .ok_or(ChipUsageError::OutsideWindow {
                chip: name,
                gameweek,
            })?;

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let key = (def.name, def.instance);
        if let Some(existing) = records.get(&key) {
            return Err(ChipUsageError::AlreadyUsed {
                chip: name,
                instance: def.instance,
                used_in: existing.gameweek,
            });
        }

        let record = ChipUsageRecord { name, gameweek };
        records.insert(key, record);
        info!(chip = %name, instance = def.instance, gameweek, "chip usage recorded");
        Ok(record)
    }

    /// All records, ordered by gameweek.
    pub fn records(&self) -> Vec<ChipUsageRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<_> = records.values().copied().collect();
        out.sort_by_key(|r| (r.gameweek, r.name));
        out
    }

    /// A catalog reflecting every record written so far.
    pub fn to_catalog(&self, base: &ChipCatalog) -> ChipCatalog {
        base.clone().with_usage(self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_record_for_same_instance_is_refused() {
        let registry = ChipUsageRegistry::new(&ChipCatalog::standard_two_halves());
        registry.record_confirmed(ChipName::FreeHit, 8).unwrap();

        let err = registry.record_confirmed(ChipName::FreeHit, 12).unwrap_err();
        assert_eq!(
            err,
            ChipUsageError::AlreadyUsed {
                chip: ChipName::FreeHit,
                instance: 1,
                used_in: 8
            }
        );

        // The second-half instance is independent
        assert!(registry.record_confirmed(ChipName::FreeHit, 30).is_ok());
        assert_eq!(registry.records().len(), 2);
    }

    #[test]
    fn record_outside_every_window_is_refused() {
        let catalog = ChipCatalog::from_windows(
            vec![crate::chips::types::ChipWindowEntry {
                name: ChipName::Wildcard,
                start_gw: 2,
                stop_gw: 19,
            }],
            Vec::new(),
        )
        .unwrap();
        let registry = ChipUsageRegistry::new(&catalog);
        assert!(matches!(
            registry.record_confirmed(ChipName::Wildcard, 1),
            Err(ChipUsageError::OutsideWindow { .. })
        ));
    }

    #[test]
    fn seeded_usage_counts_as_used() {
        let catalog = ChipCatalog::standard_two_halves().with_usage(vec![ChipUsageRecord {
            name: ChipName::BenchBoost,
            gameweek: 3,
        }]);
        let registry = ChipUsageRegistry::new(&catalog);
        assert!(registry.record_confirmed(ChipName::BenchBoost, 10).is_err());
        assert_eq!(registry.to_catalog(&catalog).usage().len(), 1);
    }

    #[test]
    fn concurrent_confirmations_write_once() {
        let registry = Arc::new(ChipUsageRegistry::new(&ChipCatalog::standard_two_halves()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .record_confirmed(ChipName::TripleCaptain, 21 + i)
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }
}
