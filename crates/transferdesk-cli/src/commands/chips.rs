use clap::Subcommand;
use serde::Serialize;
use transferdesk_core::planner::PlanningInputs;
use transferdesk_core::{
    ChipAvailabilityTracker, ChipContext, ChipDecision, ChipDecisionEngine, ChipName,
    ChipUsageRegistry, TransferPlanner,
};

use super::{print_json, SnapshotArgs};

#[derive(Subcommand)]
pub enum ChipsAction {
    /// Status of every chip instance
    Status {
        #[command(flatten)]
        input: SnapshotArgs,
    },
    /// Evaluate every playable chip and pick at most one
    Recommend {
        #[command(flatten)]
        input: SnapshotArgs,
    },
    /// Check that a confirmed chip play fits the catalog and print the updated usage
    Record {
        #[command(flatten)]
        input: SnapshotArgs,
        /// wildcard | free_hit | bench_boost | triple_captain
        #[arg(long)]
        chip: String,
    },
}

#[derive(Serialize)]
struct Recommendation {
    gameweek: u32,
    recommended: Option<ChipDecision>,
    evaluations: Vec<ChipDecision>,
}

pub fn run(action: ChipsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ChipsAction::Status { input } => {
            let loaded = input.load()?;
            let tracker = ChipAvailabilityTracker::new(loaded.config.chips.expiry_warning_gws);
            print_json(&tracker.status_all(&loaded.snapshot.chips, loaded.gameweek))
        }
        ChipsAction::Recommend { input } => {
            let loaded = input.load()?;
            let config = &loaded.config;
            let gw = loaded.gameweek;
            let report = ChipAvailabilityTracker::new(config.chips.expiry_warning_gws)
                .status_all(&loaded.snapshot.chips, gw);

            let inputs = PlanningInputs {
                squad: loaded.snapshot.squad.clone(),
                pool: loaded.snapshot.players.clone(),
                calendar: loaded.snapshot.fixtures.clone(),
                watchlist: Default::default(),
            };
            let needed = TransferPlanner::new(&config.transfers).transfers_needed(gw, &inputs);
            let profile = inputs
                .calendar
                .profile(gw, config.chips.blank_fixture_threshold);
            let ctx = ChipContext::from_squad(profile, &inputs.squad, needed);

            let engine = ChipDecisionEngine::new(config.chips.clone(), config.transfers.hit_cost);
            print_json(&Recommendation {
                gameweek: gw,
                recommended: engine.get_recommended_chip(&report.statuses, &ctx),
                evaluations: engine.evaluate_all(&report.statuses, &ctx),
            })
        }
        ChipsAction::Record { input, chip } => {
            let loaded = input.load()?;
            let name: ChipName = serde_json::from_value(serde_json::Value::String(chip.clone()))
                .map_err(|_| format!("unknown chip: {chip}"))?;
            let registry = ChipUsageRegistry::new(&loaded.snapshot.chips);
            registry.record_confirmed(name, loaded.gameweek)?;
            print_json(&registry.records())
        }
    }
}
