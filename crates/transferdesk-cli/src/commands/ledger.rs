use clap::Args;
use transferdesk_core::FreeTransferLedger;

use super::{print_json, SnapshotArgs};

#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,
    /// Replace the replayed count (clamped to 0..=max_banked)
    #[arg(long = "override")]
    pub manual_override: Option<u32>,
    /// Include the per-gameweek replay steps
    #[arg(long)]
    pub steps: bool,
}

pub fn run(args: LedgerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = args.input.load()?;
    let ledger = FreeTransferLedger::new(&loaded.config.transfers);
    let manual_override = args
        .manual_override
        .or(loaded.snapshot.free_transfer_override);

    let mut state = ledger.compute_from_source(&loaded.snapshot, loaded.gameweek, manual_override);
    if !args.steps {
        state.steps.clear();
    }
    print_json(&state)
}
