use clap::Args;
use transferdesk_core::planner::PlanningInputs;
use transferdesk_core::TransferPlanner;

use super::{print_json, SnapshotArgs};

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,
    /// Replace the replayed free transfer count
    #[arg(long = "override")]
    pub manual_override: Option<u32>,
    /// Print only the reasoning line
    #[arg(long)]
    pub brief: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = args.input.load()?;
    let planner = TransferPlanner::new(&loaded.config.transfers);
    let inputs = PlanningInputs {
        squad: loaded.snapshot.squad.clone(),
        pool: loaded.snapshot.players.clone(),
        calendar: loaded.snapshot.fixtures.clone(),
        watchlist: Default::default(),
    };
    let manual_override = args
        .manual_override
        .or(loaded.snapshot.free_transfer_override);

    let plan = planner.generate_transfer_plan(loaded.gameweek, &loaded.snapshot, manual_override, &inputs);
    if args.brief {
        println!("{}: {}", plan.action, plan.reasoning);
        return Ok(());
    }
    print_json(&plan)
}
