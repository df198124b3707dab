use std::sync::Arc;

use clap::Args;
use transferdesk_core::{CycleSources, WeeklyCycle};

use super::{print_json, SnapshotArgs};

#[derive(Args, Debug)]
pub struct CycleArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,
    /// Print when the next cycle is due instead of running one
    #[arg(long)]
    pub schedule: bool,
}

pub fn run(args: CycleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = args.input.load()?;
    let gameweek = loaded.gameweek;
    let manual_override = loaded.snapshot.free_transfer_override;
    let snapshot = Arc::new(loaded.snapshot);

    let cycle = WeeklyCycle::new(loaded.config, CycleSources::from_snapshot(Arc::clone(&snapshot)))
        .with_manual_override(manual_override);

    if args.schedule {
        return match cycle.next_scheduled(&snapshot.gameweeks, chrono::Utc::now()) {
            Some((gw, at)) => {
                println!("GW{gw} cycle due at {}", at.to_rfc3339());
                Ok(())
            }
            None => Err("no open gameweek in snapshot".into()),
        };
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(cycle.run(gameweek))?;
    print_json(&report)
}
