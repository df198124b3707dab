//! Strategy selection for a weekly transfer plan.
//!
//! Branches are checked in order and the first match wins:
//!
//! 1. no candidates: roll
//! 2. urgent candidates and free transfers left: use one, or several when
//!    more than one is urgent and more than one is free
//! 3. urgent candidates, no free transfers: take a hit only if the best
//!    urgent candidate gains strictly more than the hit costs
//! 4. free transfers at the banking cap: use one so accrual is not wasted
//! 5. otherwise roll
//!
//! Executed transfers are drawn urgent first, so a higher-gain planned move
//! never displaces the replacement of a ruled-out player.

use serde::{Deserialize, Serialize};

use super::{CandidatePriority, PlanAction, TransferCandidate};
use crate::gameweek::GameweekId;

/// Why a plan chose its action. Each variant renders its own reasoning line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanReason {
    NoCandidates,
    UrgentSingle { out_name: String, in_name: String, gain: f64 },
    UrgentMultiple { urgent: usize, used: usize },
    HitJustified { out_name: String, in_name: String, gain: f64, hit_cost: u32 },
    HitDeclined { gain: f64, hit_cost: u32 },
    CapReached { max_banked: u32, out_name: String, in_name: String },
    Bank,
}

impl PlanReason {
    pub fn describe(&self, gw: GameweekId, available: u32) -> String {
        match self {
            PlanReason::NoCandidates => format!(
                "GW{gw}: no transfer targets found; rolling {available} free transfer(s)."
            ),
            PlanReason::UrgentSingle { out_name, in_name, gain } => format!(
                "GW{gw}: urgent replacement {out_name} -> {in_name} (+{gain:.1} pts); using 1 of {available} free transfer(s)."
            ),
            PlanReason::UrgentMultiple { urgent, used } => format!(
                "GW{gw}: {urgent} urgent replacements; using {used} of {available} free transfers."
            ),
            PlanReason::HitJustified { out_name, in_name, gain, hit_cost } => format!(
                "GW{gw}: no free transfers; {out_name} -> {in_name} gains +{gain:.1} pts, more than the -{hit_cost} hit."
            ),
            PlanReason::HitDeclined { gain, hit_cost } => format!(
                "GW{gw}: urgent move gains only +{gain:.1} pts, not more than the -{hit_cost} hit; rolling instead."
            ),
            PlanReason::CapReached { max_banked, out_name, in_name } => format!(
                "GW{gw}: free transfers at the cap of {max_banked}; using one ({out_name} -> {in_name}) so none is wasted."
            ),
            PlanReason::Bank => format!(
                "GW{gw}: nothing urgent; banking ({available} free transfer(s) available)."
            ),
        }
    }
}

/// Urgent candidates first, each group keeping its incoming (best first) order.
fn execution_order(candidates: &[TransferCandidate]) -> Vec<&TransferCandidate> {
    let (urgent, rest): (Vec<_>, Vec<_>) = candidates
        .iter()
        .partition(|c| c.priority == CandidatePriority::Urgent);
    urgent.into_iter().chain(rest).collect()
}

/// Pick the action for `candidates` (best first) given `available` free transfers.
pub fn select_strategy(
    available: u32,
    candidates: &[TransferCandidate],
    hit_cost: u32,
    max_banked: u32,
) -> (PlanAction, PlanReason) {
    let ordered = execution_order(candidates);
    let Some(&best) = ordered.first() else {
        return (PlanAction::Roll, PlanReason::NoCandidates);
    };

    let urgent = candidates
        .iter()
        .filter(|c| c.priority == CandidatePriority::Urgent)
        .count();

    let mut hit_declined = None;
    if urgent > 0 {
        if available > 0 {
            if urgent > 1 && available > 1 {
                let used = (available as usize).min(candidates.len());
                return (
                    PlanAction::UseMultiple,
                    PlanReason::UrgentMultiple { urgent, used },
                );
            }
            return (
                PlanAction::UseOne,
                PlanReason::UrgentSingle {
                    out_name: best.out_name.clone(),
                    in_name: best.in_name.clone(),
                    gain: best.expected_gain,
                },
            );
        }
        if best.expected_gain > f64::from(hit_cost) {
            return (
                PlanAction::TakeHit,
                PlanReason::HitJustified {
                    out_name: best.out_name.clone(),
                    in_name: best.in_name.clone(),
                    gain: best.expected_gain,
                    hit_cost,
                },
            );
        }
        hit_declined = Some(PlanReason::HitDeclined {
            gain: best.expected_gain,
            hit_cost,
        });
    }

    if available >= max_banked {
        return (
            PlanAction::UseOne,
            PlanReason::CapReached {
                max_banked,
                out_name: best.out_name.clone(),
                in_name: best.in_name.clone(),
            },
        );
    }

    (PlanAction::Roll, hit_declined.unwrap_or(PlanReason::Bank))
}

/// The candidates a plan executes, with costs filled in.
pub fn apply_costing(
    action: PlanAction,
    available: u32,
    candidates: &[TransferCandidate],
    hit_cost: u32,
) -> Vec<TransferCandidate> {
    let free = |c: &TransferCandidate| TransferCandidate {
        cost: 0,
        ..c.clone()
    };
    let ordered = execution_order(candidates);
    match action {
        PlanAction::Roll => Vec::new(),
        PlanAction::UseOne => ordered.into_iter().take(1).map(free).collect(),
        PlanAction::UseMultiple => ordered.into_iter().take(available as usize).map(free).collect(),
        PlanAction::TakeHit => ordered
            .into_iter()
            .take(available as usize + 1)
            .enumerate()
            .map(|(i, c)| TransferCandidate {
                cost: if i < available as usize { 0 } else { hit_cost },
                ..c.clone()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squad::Position;

    fn candidate(priority: CandidatePriority, gain: f64) -> TransferCandidate {
        named("Out", priority, gain)
    }

    fn named(out_name: &str, priority: CandidatePriority, gain: f64) -> TransferCandidate {
        TransferCandidate {
            out_player: 1,
            out_name: out_name.into(),
            in_player: 2,
            in_name: "In".into(),
            position: Position::Midfielder,
            priority,
            expected_gain: gain,
            cost: 0,
            gameweek: 10,
        }
    }

    #[test]
    fn empty_list_rolls() {
        let (action, reason) = select_strategy(2, &[], 4, 5);
        assert_eq!(action, PlanAction::Roll);
        assert_eq!(reason, PlanReason::NoCandidates);
    }

    #[test]
    fn urgent_with_free_transfer_uses_one() {
        let c = [candidate(CandidatePriority::Urgent, 3.0)];
        assert_eq!(select_strategy(1, &c, 4, 5).0, PlanAction::UseOne);
    }

    #[test]
    fn several_urgent_with_several_free_uses_multiple() {
        let c = [
            candidate(CandidatePriority::Urgent, 6.0),
            candidate(CandidatePriority::Urgent, 3.0),
            candidate(CandidatePriority::Planned, 2.0),
        ];
        let (action, reason) = select_strategy(2, &c, 4, 5);
        assert_eq!(action, PlanAction::UseMultiple);
        assert_eq!(reason, PlanReason::UrgentMultiple { urgent: 2, used: 2 });
        assert_eq!(apply_costing(action, 2, &c, 4).len(), 2);
    }

    #[test]
    fn hit_taken_only_when_gain_exceeds_cost() {
        let c = [candidate(CandidatePriority::Urgent, 6.0)];
        let (action, _) = select_strategy(0, &c, 4, 5);
        assert_eq!(action, PlanAction::TakeHit);
        let costed = apply_costing(action, 0, &c, 4);
        assert_eq!(costed.len(), 1);
        assert_eq!(costed[0].cost, 4);

        let equal = [candidate(CandidatePriority::Urgent, 4.0)];
        let (action, reason) = select_strategy(0, &equal, 4, 5);
        assert_eq!(action, PlanAction::Roll);
        assert!(matches!(reason, PlanReason::HitDeclined { .. }));
    }

    #[test]
    fn urgent_move_beats_higher_gain_planned_move() {
        let c = [
            named("Healthy", CandidatePriority::Planned, 8.0),
            named("Injured", CandidatePriority::Urgent, 3.0),
        ];
        let (action, reason) = select_strategy(1, &c, 4, 5);
        assert_eq!(action, PlanAction::UseOne);
        assert!(matches!(&reason, PlanReason::UrgentSingle { out_name, .. } if out_name == "Injured"));
        let costed = apply_costing(action, 1, &c, 4);
        assert_eq!(costed.len(), 1);
        assert_eq!(costed[0].out_name, "Injured");
        assert_eq!(costed[0].priority, CandidatePriority::Urgent);
    }

    #[test]
    fn hit_gate_reads_urgent_gain_not_planned_gain() {
        let c = [
            named("Healthy", CandidatePriority::Planned, 9.0),
            named("Injured", CandidatePriority::Urgent, 3.0),
        ];
        let (action, reason) = select_strategy(0, &c, 4, 5);
        assert_eq!(action, PlanAction::Roll);
        assert_eq!(reason, PlanReason::HitDeclined { gain: 3.0, hit_cost: 4 });

        let c = [
            named("Healthy", CandidatePriority::Planned, 9.0),
            named("Injured", CandidatePriority::Urgent, 6.0),
        ];
        let (action, _) = select_strategy(0, &c, 4, 5);
        assert_eq!(action, PlanAction::TakeHit);
        let costed = apply_costing(action, 0, &c, 4);
        assert_eq!(costed.len(), 1);
        assert_eq!(costed[0].out_name, "Injured");
        assert_eq!(costed[0].cost, 4);
    }

    #[test]
    fn cap_forces_one_transfer() {
        let c = [candidate(CandidatePriority::Planned, 1.5)];
        let (action, reason) = select_strategy(5, &c, 4, 5);
        assert_eq!(action, PlanAction::UseOne);
        assert!(matches!(reason, PlanReason::CapReached { .. }));
        assert_eq!(apply_costing(action, 5, &c, 4)[0].cost, 0);
    }

    #[test]
    fn non_urgent_below_cap_banks() {
        let c = [candidate(CandidatePriority::Planned, 8.0)];
        assert_eq!(select_strategy(3, &c, 4, 5), (PlanAction::Roll, PlanReason::Bank));
    }

    #[test]
    fn every_reason_renders_distinct_text() {
        let reasons = [
            PlanReason::NoCandidates,
            PlanReason::UrgentSingle { out_name: "A".into(), in_name: "B".into(), gain: 2.0 },
            PlanReason::UrgentMultiple { urgent: 2, used: 2 },
            PlanReason::HitJustified { out_name: "A".into(), in_name: "B".into(), gain: 6.0, hit_cost: 4 },
            PlanReason::HitDeclined { gain: 2.0, hit_cost: 4 },
            PlanReason::CapReached { max_banked: 5, out_name: "A".into(), in_name: "B".into() },
            PlanReason::Bank,
        ];
        let texts: std::collections::HashSet<String> =
            reasons.iter().map(|r| r.describe(10, 1)).collect();
        assert_eq!(texts.len(), reasons.len());
    }
}
