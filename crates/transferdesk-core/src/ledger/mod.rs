//! Free transfer ledger.
//!
//! The number of free transfers available for a gameweek is never stored.
//! It is replayed from the season's transfer history every time it is asked
//! for, so the same history snapshot always yields the same answer.
//!
//! ## Replay rules
//!
//! For every gameweek from 1 up to `target_gw - 1`:
//!
//! - `available = min(max_banked, banked + 1)`
//! - `banked = available - used` when `used <= available`, otherwise `0`
//!   (a hit was taken; banking never goes negative)
//! - `banked` is capped at `max_banked - 1`
//! - transfers made under a Wildcard or Free Hit do not consume free transfers
//! - a configured top-up event fires after its trigger gameweek and sets
//!   `banked = target_level - 1`
//!
//! Gameweeks missing from the history are replayed as zero transfers used.

mod cache;

pub use cache::LedgerCache;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chips::ChipName;
use crate::error::DataError;
use crate::gameweek::GameweekId;
use crate::sources::HistorySource;
use crate::storage::{TopUpEvent, TransfersConfig};

/// Transfers recorded for one finished gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekTransfers {
    pub gameweek: GameweekId,
    pub transfers_used: u32,
    /// Chip active in this gameweek, if any
    #[serde(default)]
    pub chip: Option<ChipName>,
}

/// Versioned, chronological transfer history of the managed team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferHistory {
    #[serde(default)]
    pub version: u64,
    pub entries: Vec<GameweekTransfers>,
}

impl TransferHistory {
    pub fn new(version: u64, entries: Vec<GameweekTransfers>) -> Self {
        Self { version, entries }
    }

    pub fn entry(&self, gw: GameweekId) -> Option<&GameweekTransfers> {
        self.entries.iter().rev().find(|e| e.gameweek == gw)
    }

    pub fn last_recorded(&self) -> Option<GameweekId> {
        self.entries.iter().map(|e| e.gameweek).max()
    }
}

/// Audit record of one replayed gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStep {
    pub gameweek: GameweekId,
    pub available: u32,
    pub transfers_used: u32,
    pub banked_after: u32,
    /// No history entry existed; zero transfers were assumed
    pub gap_assumed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<ChipName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_up: Option<String>,
}

/// Free transfer position for a target gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub target_gw: GameweekId,
    /// Transfers carried into the target gameweek (0..max_banked-1)
    pub banked_before: u32,
    pub transfers_used_last_gw: u32,
    /// Free transfers the planner should use. Replay keeps this in
    /// `1..=max_banked`; only a manual override can set it to 0, e.g. when
    /// this gameweek's free transfers were already spent.
    pub available: u32,
    /// What replay produced, kept for audit when an override is applied.
    /// Always in `1..=max_banked`.
    pub computed_available: u32,
    pub override_applied: bool,
    /// Some gameweeks had no history entry
    pub gap_assumed: bool,
    /// Set when history could not be read and the safe default was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    #[serde(default)]
    pub steps: Vec<LedgerStep>,
}

impl LedgerState {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Replays transfer history into a [`LedgerState`].
#[derive(Debug, Clone)]
pub struct FreeTransferLedger {
    max_banked: u32,
    top_ups: Vec<TopUpEvent>,
}

impl Default for FreeTransferLedger {
    fn default() -> Self {
        Self::new(&TransfersConfig::default())
    }
}

impl FreeTransferLedger {
    pub fn new(config: &TransfersConfig) -> Self {
        Self {
            max_banked: config.max_banked.max(1),
            top_ups: config.top_up_events.clone(),
        }
    }

    pub fn max_banked(&self) -> u32 {
        self.max_banked
    }

    /// Free transfers available for `target_gw`.
    ///
    /// `manual_override` replaces the result (clamped to `0..=max_banked`)
    /// while the replayed value stays in `computed_available`.
    pub fn compute(
        &self,
        history: &TransferHistory,
        target_gw: GameweekId,
        manual_override: Option<u32>,
    ) -> LedgerState {
        let mut banked: u32 = 0;
        let mut steps = Vec::new();
        let mut gap_assumed = false;
        let recorded_until = history.last_recorded().unwrap_or(0);

        for gw in 1..target_gw {
            let available = self.cap(banked + 1);
            let entry = history.entry(gw);
            let gap = entry.is_none();
            let transfers_used = entry.map(|e| e.transfers_used).unwrap_or(0);
            let chip = entry.and_then(|e| e.chip);

            let charged = match chip {
                Some(ChipName::Wildcard) | Some(ChipName::FreeHit) => 0,
                _ => transfers_used,
            };
            banked = if charged <= available {
                (available - charged).min(self.max_banked - 1)
            } else {
                0
            };

            let top_up = self
                .top_ups
                .iter()
                .find(|t| t.trigger_after_gw == gw)
                .map(|t| {
                    banked = t.target_level.clamp(1, self.max_banked) - 1;
                    t.name.clone()
                });

            if gap {
                gap_assumed = true;
            }
            debug!(gw, available, transfers_used, banked, gap, "ledger replay step");

            steps.push(LedgerStep {
                gameweek: gw,
                available,
                transfers_used,
                banked_after: banked,
                gap_assumed: gap,
                chip,
                top_up,
            });
        }

        if gap_assumed && target_gw > recorded_until + 1 {
            debug!(
                target_gw,
                recorded_until, "history ends early; assuming zero transfers in the gap"
            );
        }

        let computed_available = self.cap(banked + 1);
        let transfers_used_last_gw = target_gw
            .checked_sub(1)
            .and_then(|gw| history.entry(gw))
            .map(|e| e.transfers_used)
            .unwrap_or(0);

        let (available, override_applied) = match manual_override {
            Some(value) => {
                let clamped = value.min(self.max_banked);
                if clamped != computed_available {
                    warn!(
                        target_gw,
                        computed_available,
                        override_value = clamped,
                        "manual free transfer override differs from replay"
                    );
                }
                (clamped, true)
            }
            None => (computed_available, false),
        };

        LedgerState {
            target_gw,
            banked_before: banked,
            transfers_used_last_gw,
            available,
            computed_available,
            override_applied,
            gap_assumed,
            degraded: None,
            steps,
        }
    }

    /// Fetch history from `source` and compute. A failed fetch degrades to
    /// one free transfer instead of failing the caller.
    pub fn compute_from_source(
        &self,
        source: &dyn HistorySource,
        target_gw: GameweekId,
        manual_override: Option<u32>,
    ) -> LedgerState {
        match source.transfer_history() {
            Ok(history) => self.compute(&history, target_gw, manual_override),
            Err(e) => self.fallback(target_gw, &e, manual_override),
        }
    }

    /// State used when history could not be read. A manual override still
    /// applies; otherwise one free transfer is assumed.
    pub fn fallback(
        &self,
        target_gw: GameweekId,
        error: &DataError,
        manual_override: Option<u32>,
    ) -> LedgerState {
        warn!(target_gw, error = %error, "transfer history unavailable");
        let mut state = Self::degraded(target_gw, error.to_string());
        if let Some(value) = manual_override {
            state.available = value.min(self.max_banked);
            state.override_applied = true;
        }
        state
    }

    /// Safe default when history cannot be read: one free transfer.
    pub fn degraded(target_gw: GameweekId, reason: impl Into<String>) -> LedgerState {
        LedgerState {
            target_gw,
            banked_before: 0,
            transfers_used_last_gw: 0,
            available: 1,
            computed_available: 1,
            override_applied: false,
            gap_assumed: false,
            degraded: Some(reason.into()),
            steps: Vec::new(),
        }
    }

    fn cap(&self, value: u32) -> u32 {
        value.min(self.max_banked)
    }
}
