//! Short-lived read cache for ledger results.
//!
//! Entries are keyed by history version, target gameweek and override, so a
//! new history snapshot never serves a stale answer. When a gameweek starts,
//! [`LedgerCache::invalidate_before`] drops results for earlier targets.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{FreeTransferLedger, LedgerState, TransferHistory};
use crate::gameweek::GameweekId;

type CacheKey = (u64, GameweekId, Option<u32>);

#[derive(Debug, Default)]
pub struct LedgerCache {
    entries: RwLock<HashMap<CacheKey, LedgerState>>,
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a cached state or replay and store it. Degraded states are
    /// never cached.
    pub fn get_or_compute(
        &self,
        ledger: &FreeTransferLedger,
        history: &TransferHistory,
        target_gw: GameweekId,
        manual_override: Option<u32>,
    ) -> LedgerState {
        let key = (history.version, target_gw, manual_override);
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(state) = entries.get(&key) {
                return state.clone();
            }
        }

        let state = ledger.compute(history, target_gw, manual_override);
        if !state.is_degraded() {
            self.entries
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(key, state.clone());
        }
        state
    }

    /// Drop every entry targeting a gameweek before `gw`.
    pub fn invalidate_before(&self, gw: GameweekId) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(_, target, _), _| *target >= gw);
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
