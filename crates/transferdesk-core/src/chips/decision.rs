//! Chip decision engine.
//!
//! Each chip has an independent evaluator that looks at the chip's status
//! and the gameweek context and returns a [`ChipDecision`]. Arbitration then
//! picks at most one chip for the gameweek.
//!
//! ## Arbitration
//!
//! Decisions with `use_chip` set are ranked by urgency, then expected value,
//! then the fixed [`ChipName`] priority. When the chips expiring soon
//! outnumber the gameweeks left to play them, a lapse is unavoidable unless
//! one is played now, so the engine forces the most valuable expiring chip
//! even if no evaluator asked for it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use super::types::{ChipName, ChipStatus};
use crate::fixtures::GameweekProfile;
use crate::gameweek::GameweekId;
use crate::squad::{PlayerId, Squad, TeamId};
use crate::storage::ChipsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    None,
    Low,
    Medium,
    High,
}

/// Outcome of evaluating one chip instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipDecision {
    pub chip: ChipName,
    pub instance: u8,
    #[serde(rename = "use")]
    pub use_chip: bool,
    pub urgency: Urgency,
    pub reason: String,
    /// Projected points attributable to playing the chip now
    pub expected_value: f64,
    /// Chosen by the use-or-lose override rather than its evaluator
    #[serde(default)]
    pub forced: bool,
    /// Better captain for a Triple Captain double gameweek
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captain_suggestion: Option<PlayerId>,
}

impl ChipDecision {
    fn new(status: &ChipStatus, use_chip: bool, urgency: Urgency, reason: String, ev: f64) -> Self {
        Self {
            chip: status.name,
            instance: status.instance,
            use_chip,
            urgency,
            reason,
            expected_value: ev,
            forced: false,
            captain_suggestion: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotPick {
    pub player_id: PlayerId,
    pub team: TeamId,
    pub expected_points: f64,
}

/// Everything the evaluators look at for one gameweek.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipContext {
    pub gameweek: GameweekId,
    pub profile: GameweekProfile,
    /// Squad changes wanted right now (see `TransferPlanner::transfers_needed`)
    pub transfers_needed: u32,
    pub bench: Vec<SlotPick>,
    pub captain: Option<SlotPick>,
    pub starters: Vec<SlotPick>,
}

impl ChipContext {
    pub fn from_squad(profile: GameweekProfile, squad: &Squad, transfers_needed: u32) -> Self {
        let pick = |p: &crate::squad::Player| SlotPick {
            player_id: p.id,
            team: p.team,
            expected_points: p.expected_points,
        };
        Self {
            gameweek: profile.gameweek,
            bench: squad.bench_players().map(pick).collect(),
            captain: squad.captain().map(pick),
            starters: squad.starters().map(pick).collect(),
            transfers_needed,
            profile,
        }
    }

    pub fn bench_expected_points(&self) -> f64 {
        self.bench.iter().map(|s| s.expected_points).sum()
    }

    pub fn bench_doubling_slots(&self) -> usize {
        self.bench
            .iter()
            .filter(|s| self.profile.team_doubles(s.team))
            .count()
    }

    pub fn starters_without_fixture(&self) -> usize {
        self.starters
            .iter()
            .filter(|s| !self.profile.team_plays(s.team))
            .count()
    }

    /// Mean projection of starters who do have a fixture.
    pub fn average_playing_starter_points(&self) -> f64 {
        let playing: Vec<f64> = self
            .starters
            .iter()
            .filter(|s| self.profile.team_plays(s.team))
            .map(|s| s.expected_points)
            .collect();
        if playing.is_empty() {
            0.0
        } else {
            playing.iter().sum::<f64>() / playing.len() as f64
        }
    }
}

/// Urgency reported while declining: rises as the window closes.
fn decline_urgency(status: &ChipStatus) -> Urgency {
    if !status.expires_soon {
        Urgency::None
    } else if status.gws_until_expiry <= 1 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

fn unavailable(status: &ChipStatus, gw: GameweekId) -> ChipDecision {
    let why = if status.used {
        "already used"
    } else {
        "outside its window"
    };
    ChipDecision::new(
        status,
        false,
        Urgency::None,
        format!("{} #{} not playable in GW{gw}: {why}", status.name, status.instance),
        0.0,
    )
}

/// Wildcard: a rebuild when many squad changes are wanted.
pub fn evaluate_wildcard(
    status: &ChipStatus,
    ctx: &ChipContext,
    config: &ChipsConfig,
    hit_cost: u32,
) -> ChipDecision {
    if !status.available_now {
        return unavailable(status, ctx.gameweek);
    }
    let needed = ctx.transfers_needed;
    // Hits avoided, assuming one free transfer would have been available
    let ev = f64::from(needed.saturating_sub(1) * hit_cost);

    if needed >= config.wildcard_transfers_needed {
        let urgency = if status.expires_soon {
            Urgency::High
        } else {
            Urgency::Medium
        };
        return ChipDecision::new(
            status,
            true,
            urgency,
            format!("{needed} transfers needed; Wildcard avoids {ev:.0} points of hits"),
            ev,
        );
    }
    if status.expires_soon && needed >= config.wildcard_expiring_transfers_needed {
        return ChipDecision::new(
            status,
            true,
            Urgency::High,
            format!(
                "Wildcard expires in {} GW(s) and {needed} transfers are needed",
                status.gws_until_expiry
            ),
            ev,
        );
    }

    let reason = if status.expires_soon {
        format!(
            "Only {needed} transfer(s) needed; Wildcard expires in {} GW(s), plan a rebuild",
            status.gws_until_expiry
        )
    } else {
        format!("Only {needed} transfer(s) needed; holding Wildcard")
    };
    ChipDecision::new(status, false, decline_urgency(status), reason, ev)
}

/// Free Hit: one-week squad for blank gameweeks.
pub fn evaluate_free_hit(status: &ChipStatus, ctx: &ChipContext, config: &ChipsConfig) -> ChipDecision {
    if !status.available_now {
        return unavailable(status, ctx.gameweek);
    }
    let missing = ctx.starters_without_fixture();
    let ev = missing as f64 * ctx.average_playing_starter_points();

    if ctx.profile.is_blank {
        return ChipDecision::new(
            status,
            true,
            Urgency::High,
            format!(
                "Blank GW{}: {} of {} fixtures, {missing} starter(s) without a match",
                ctx.gameweek, ctx.profile.fixture_count, config.full_round_fixtures
            ),
            ev,
        );
    }
    if status.expires_soon {
        return ChipDecision::new(
            status,
            true,
            Urgency::High,
            format!(
                "Free Hit expires in {} GW(s) with no blank gameweek left in its window",
                status.gws_until_expiry
            ),
            ev,
        );
    }
    ChipDecision::new(
        status,
        false,
        Urgency::None,
        "Regular gameweek; saving Free Hit for a blank".to_string(),
        ev,
    )
}

/// Bench Boost: bench points count, best in double gameweeks.
pub fn evaluate_bench_boost(
    status: &ChipStatus,
    ctx: &ChipContext,
    config: &ChipsConfig,
) -> ChipDecision {
    if !status.available_now {
        return unavailable(status, ctx.gameweek);
    }
    let bench_points = ctx.bench_expected_points();
    let doubling = ctx.bench_doubling_slots();
    let slots = ctx.bench.len();

    if ctx.profile.is_double {
        if doubling >= config.bench_double_slots_required {
            return ChipDecision::new(
                status,
                true,
                Urgency::High,
                format!("Double GW{}: {doubling} of {slots} bench slots double", ctx.gameweek),
                bench_points,
            );
        }
        if bench_points >= config.bench_boost_min_points {
            return ChipDecision::new(
                status,
                true,
                Urgency::Medium,
                format!(
                    "Double GW{}: only {doubling} bench slot(s) double but bench projects {bench_points:.1} pts",
                    ctx.gameweek
                ),
                bench_points,
            );
        }
        return ChipDecision::new(
            status,
            false,
            decline_urgency(status),
            format!(
                "Double GW{} but bench projects {bench_points:.1} pts with {doubling} doubling slot(s)",
                ctx.gameweek
            ),
            bench_points,
        );
    }

    if status.expires_soon && bench_points >= config.bench_boost_expiry_min_points {
        return ChipDecision::new(
            status,
            true,
            Urgency::Medium,
            format!(
                "Bench Boost expires in {} GW(s); bench projects {bench_points:.1} pts",
                status.gws_until_expiry
            ),
            bench_points,
        );
    }
    ChipDecision::new(
        status,
        false,
        decline_urgency(status),
        format!("No double gameweek; bench projects {bench_points:.1} pts"),
        bench_points,
    )
}

/// Triple Captain: the captain's points once more.
pub fn evaluate_triple_captain(
    status: &ChipStatus,
    ctx: &ChipContext,
    config: &ChipsConfig,
) -> ChipDecision {
    if !status.available_now {
        return unavailable(status, ctx.gameweek);
    }
    let Some(captain) = ctx.captain else {
        return ChipDecision::new(
            status,
            false,
            decline_urgency(status),
            "No captain designated".to_string(),
            0.0,
        );
    };
    // Captaincy already doubles; the chip adds one more multiple
    let ev = captain.expected_points;

    if ctx.profile.team_doubles(captain.team) {
        return ChipDecision::new(
            status,
            true,
            Urgency::High,
            format!(
                "Captain plays twice in GW{} ({:.1} pts projected)",
                ctx.gameweek, captain.expected_points
            ),
            ev,
        );
    }

    if ctx.profile.is_double {
        let alternative = ctx
            .starters
            .iter()
            .filter(|s| ctx.profile.team_doubles(s.team))
            .max_by(|a, b| a.expected_points.total_cmp(&b.expected_points));
        let mut decision = ChipDecision::new(
            status,
            false,
            Urgency::Low,
            match alternative {
                Some(alt) => format!(
                    "Captain does not double in GW{}; switch captain to player {} to use Triple Captain",
                    ctx.gameweek, alt.player_id
                ),
                None => format!(
                    "Captain does not double in GW{} and no starter does",
                    ctx.gameweek
                ),
            },
            ev,
        );
        decision.captain_suggestion = alternative.map(|a| a.player_id);
        return decision;
    }

    if status.expires_soon && captain.expected_points >= config.triple_captain_min_points {
        return ChipDecision::new(
            status,
            true,
            Urgency::Medium,
            format!(
                "Triple Captain expires in {} GW(s); captain projects {:.1} pts",
                status.gws_until_expiry, captain.expected_points
            ),
            ev,
        );
    }
    ChipDecision::new(
        status,
        false,
        decline_urgency(status),
        format!("No double gameweek for the captain in GW{}", ctx.gameweek),
        ev,
    )
}

/// Higher urgency, then higher value, then fixed chip priority.
fn rank(a: &ChipDecision, b: &ChipDecision) -> Ordering {
    b.urgency
        .cmp(&a.urgency)
        .then_with(|| b.expected_value.total_cmp(&a.expected_value))
        .then_with(|| a.chip.priority().cmp(&b.chip.priority()))
        .then_with(|| a.instance.cmp(&b.instance))
}

#[derive(Debug, Clone)]
pub struct ChipDecisionEngine {
    config: ChipsConfig,
    hit_cost: u32,
}

impl ChipDecisionEngine {
    pub fn new(config: ChipsConfig, hit_cost: u32) -> Self {
        Self { config, hit_cost }
    }

    pub fn evaluate(&self, status: &ChipStatus, ctx: &ChipContext) -> ChipDecision {
        let decision = match status.name {
            ChipName::Wildcard => evaluate_wildcard(status, ctx, &self.config, self.hit_cost),
            ChipName::FreeHit => evaluate_free_hit(status, ctx, &self.config),
            ChipName::BenchBoost => evaluate_bench_boost(status, ctx, &self.config),
            ChipName::TripleCaptain => evaluate_triple_captain(status, ctx, &self.config),
        };
        debug!(
            chip = %decision.chip,
            instance = decision.instance,
            use_chip = decision.use_chip,
            urgency = ?decision.urgency,
            ev = decision.expected_value,
            "chip evaluated"
        );
        decision
    }

    /// Decisions for every instance playable this gameweek.
    pub fn evaluate_all(&self, statuses: &[ChipStatus], ctx: &ChipContext) -> Vec<ChipDecision> {
        statuses
            .iter()
            .filter(|s| s.available_now)
            .map(|s| self.evaluate(s, ctx))
            .collect()
    }

    /// The one chip to play this gameweek, if any.
    pub fn get_recommended_chip(
        &self,
        statuses: &[ChipStatus],
        ctx: &ChipContext,
    ) -> Option<ChipDecision> {
        let decisions = self.evaluate_all(statuses, ctx);
        let natural = decisions
            .iter()
            .filter(|d| d.use_chip)
            .min_by(|a, b| rank(a, b))
            .cloned();

        if let Some(forced) = self.forced_decision(statuses, &decisions) {
            return Some(forced);
        }

        if let Some(ref d) = natural {
            info!(chip = %d.chip, instance = d.instance, urgency = ?d.urgency, "chip recommended");
        }
        natural
    }

    /// Use-or-lose override. Returns a decision only when the expiring chips
    /// cannot all be played in the gameweeks left. The expiring chip with the
    /// highest expected value is played; `forced` is set when its evaluator
    /// had declined it.
    fn forced_decision(
        &self,
        statuses: &[ChipStatus],
        decisions: &[ChipDecision],
    ) -> Option<ChipDecision> {
        let expiring: Vec<&ChipStatus> = statuses.iter().filter(|s| s.expires_soon).collect();
        let min_remaining = expiring.iter().map(|s| s.gws_until_expiry).min()?;
        if (expiring.len() as u32) < min_remaining {
            return None;
        }

        let is_expiring = |d: &&ChipDecision| {
            expiring
                .iter()
                .any(|s| s.name == d.chip && s.instance == d.instance)
        };

        let chosen = decisions.iter().filter(is_expiring).min_by(|a, b| {
            b.expected_value
                .total_cmp(&a.expected_value)
                .then_with(|| a.chip.priority().cmp(&b.chip.priority()))
                .then_with(|| a.instance.cmp(&b.instance))
        })?;

        if chosen.use_chip {
            info!(chip = %chosen.chip, "expiring chip recommended by its evaluator");
            return Some(chosen.clone());
        }

        warn!(
            chip = %chosen.chip,
            expiring = expiring.len(),
            min_remaining,
            "forcing chip so none lapses unused"
        );
        Some(ChipDecision {
            use_chip: true,
            urgency: Urgency::High,
            forced: true,
            reason: format!(
                "{} chips expire within {min_remaining} GW(s); playing {} now so none lapses ({})",
                expiring.len(),
                chosen.chip,
                chosen.reason
            ),
            ..chosen.clone()
        })
    }
}

impl Default for ChipDecisionEngine {
    fn default() -> Self {
        Self::new(ChipsConfig::default(), 4)
    }
}
