//! Weekly transfer planning.
//!
//! A plan is built in five steps: read free transfers from the ledger,
//! pick squad members facing a hard run of fixtures (or ruled out), pick
//! ranked pool players facing an easy run, match each outgoing player to
//! the best same-position replacement, and sort matches by expected gain.
//! [`strategy::select_strategy`] then decides what to do with them.

pub mod strategy;

pub use strategy::{apply_costing, select_strategy, PlanReason};

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fixtures::FixtureCalendar;
use crate::gameweek::GameweekId;
use crate::ledger::{FreeTransferLedger, LedgerState};
use crate::sources::HistorySource;
use crate::squad::{Player, PlayerId, Position, Squad};
use crate::storage::TransfersConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidatePriority {
    Urgent,
    Planned,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanAction {
    Roll,
    UseOne,
    UseMultiple,
    TakeHit,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanAction::Roll => "ROLL",
            PlanAction::UseOne => "USE_ONE",
            PlanAction::UseMultiple => "USE_MULTIPLE",
            PlanAction::TakeHit => "TAKE_HIT",
        };
        f.write_str(label)
    }
}

/// One outgoing/incoming pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCandidate {
    pub out_player: PlayerId,
    pub out_name: String,
    pub in_player: PlayerId,
    pub in_name: String,
    pub position: Position,
    pub priority: CandidatePriority,
    /// Projected points over the planning horizon.
    pub expected_gain: f64,
    /// 0, or the hit cost for a transfer beyond the free allotment.
    pub cost: u32,
    pub gameweek: GameweekId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub gameweek: GameweekId,
    pub available_free_transfers: u32,
    pub action: PlanAction,
    pub reason: PlanReason,
    /// Transfers to make, costed. Empty when rolling.
    pub candidates: Vec<TransferCandidate>,
    /// Every match found, best first.
    pub considered: Vec<TransferCandidate>,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl TransferPlan {
    pub fn total_hit_cost(&self) -> u32 {
        self.candidates.iter().map(|c| c.cost).sum()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Attach observations gathered since the last cycle.
    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        for note in &notes {
            self.reasoning.push_str(&format!(" Watch: {note}."));
        }
        self.notes.extend(notes);
        self
    }
}

/// Everything the planner reads besides transfer history.
#[derive(Debug, Clone, Default)]
pub struct PlanningInputs {
    pub squad: Squad,
    /// Ranked best first.
    pub pool: Vec<Player>,
    pub calendar: FixtureCalendar,
    /// Squad members flagged by earlier medium-severity alerts.
    pub watchlist: HashSet<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct TransferPlanner {
    config: TransfersConfig,
    ledger: FreeTransferLedger,
}

impl Default for TransferPlanner {
    fn default() -> Self {
        Self::new(&TransfersConfig::default())
    }
}

impl TransferPlanner {
    pub fn new(config: &TransfersConfig) -> Self {
        Self {
            config: config.clone(),
            ledger: FreeTransferLedger::new(config),
        }
    }

    pub fn ledger(&self) -> &FreeTransferLedger {
        &self.ledger
    }

    pub fn config(&self) -> &TransfersConfig {
        &self.config
    }

    /// Full plan for `gw`: ledger replay, candidate search, strategy.
    pub fn generate_transfer_plan(
        &self,
        gw: GameweekId,
        history: &dyn HistorySource,
        manual_override: Option<u32>,
        inputs: &PlanningInputs,
    ) -> TransferPlan {
        let state = self.ledger.compute_from_source(history, gw, manual_override);
        let candidates = self.find_candidates(gw, inputs);
        self.plan_from(&state, candidates)
    }

    /// Squad members worth moving out, urgent ones first.
    fn out_candidates<'a>(
        &self,
        gw: GameweekId,
        inputs: &'a PlanningInputs,
    ) -> Vec<(&'a Player, bool)> {
        let mut outs: Vec<(&Player, bool, f64)> = inputs
            .squad
            .players
            .iter()
            .filter_map(|p| {
                let urgent = p.status.is_ruled_out();
                let difficulty =
                    inputs
                        .calendar
                        .horizon_difficulty(p.team, gw, self.config.horizon_gws);
                let watched = inputs.watchlist.contains(&p.id);
                (urgent || watched || difficulty > self.config.hard_fixture_threshold)
                    .then_some((p, urgent, difficulty))
            })
            .collect();
        outs.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.total_cmp(&a.2)));
        outs.into_iter().map(|(p, urgent, _)| (p, urgent)).collect()
    }

    /// Squad members who should leave within the horizon.
    pub fn transfers_needed(&self, gw: GameweekId, inputs: &PlanningInputs) -> u32 {
        self.out_candidates(gw, inputs).len() as u32
    }

    /// Matched candidates for `gw`, sorted by expected gain, best first.
    pub fn find_candidates(&self, gw: GameweekId, inputs: &PlanningInputs) -> Vec<TransferCandidate> {
        let horizon = self.config.horizon_gws;
        let mut ins: Vec<&Player> = inputs
            .pool
            .iter()
            .take(self.config.in_candidate_pool)
            .filter(|p| !inputs.squad.contains(p.id) && !p.status.is_ruled_out())
            .filter(|p| {
                inputs.calendar.horizon_difficulty(p.team, gw, horizon)
                    < self.config.easy_fixture_threshold
            })
            .collect();

        let mut matches = Vec::new();
        for (out, urgent) in self.out_candidates(gw, inputs) {
            let best = ins
                .iter()
                .enumerate()
                .filter(|(_, p)| p.position == out.position)
                .max_by(|(_, a), (_, b)| a.points_per_game.total_cmp(&b.points_per_game))
                .map(|(idx, _)| idx);
            let Some(idx) = best else {
                debug!(gw, player = %out.name, "no replacement with easier fixtures");
                continue;
            };

            let out_ppg = if urgent { 0.0 } else { out.points_per_game };
            let gain = (ins[idx].points_per_game - out_ppg) * f64::from(horizon);
            if !urgent && gain <= 0.0 {
                continue;
            }
            let replacement = ins.remove(idx);

            let priority = if urgent {
                CandidatePriority::Urgent
            } else if gain >= f64::from(self.config.hit_cost) {
                CandidatePriority::Planned
            } else {
                CandidatePriority::Optional
            };
            matches.push(TransferCandidate {
                out_player: out.id,
                out_name: out.name.clone(),
                in_player: replacement.id,
                in_name: replacement.name.clone(),
                position: out.position,
                priority,
                expected_gain: gain,
                cost: 0,
                gameweek: gw,
            });
        }

        matches.sort_by(|a, b| {
            b.expected_gain
                .total_cmp(&a.expected_gain)
                .then(a.priority.cmp(&b.priority))
        });
        matches
    }

    /// Pick a strategy for precomputed ledger state and candidates.
    pub fn plan_from(&self, state: &LedgerState, candidates: Vec<TransferCandidate>) -> TransferPlan {
        let gw = state.target_gw;
        let available = state.available;
        let (action, reason) = select_strategy(
            available,
            &candidates,
            self.config.hit_cost,
            self.ledger.max_banked(),
        );
        let chosen = apply_costing(action, available, &candidates, self.config.hit_cost);

        let mut reasoning = reason.describe(gw, available);
        if state.is_degraded() {
            reasoning = format!("Transfer data unavailable, defaulted to {available}. {reasoning}");
        }

        info!(gw, %action, available, transfers = chosen.len(), "transfer plan generated");

        TransferPlan {
            gameweek: gw,
            available_free_transfers: available,
            action,
            reason,
            candidates: chosen,
            considered: candidates,
            reasoning,
            degraded: state.degraded.clone(),
            notes: Vec::new(),
        }
    }
}
