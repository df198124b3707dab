pub mod alert;
pub mod chips;
pub mod config;
pub mod cycle;
pub mod ledger;
pub mod plan;

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use transferdesk_core::{EngineConfig, GameweekId, SeasonSnapshot};

/// Inputs shared by every command that reads a season snapshot.
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Season snapshot JSON file
    #[arg(long, short = 's')]
    pub snapshot: PathBuf,
    /// Target gameweek (defaults to the snapshot's current gameweek)
    #[arg(long)]
    pub gw: Option<GameweekId>,
    /// Engine config file (defaults to ~/.config/transferdesk/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Loaded inputs for one command run.
pub struct Loaded {
    pub snapshot: SeasonSnapshot,
    pub gameweek: GameweekId,
    pub config: EngineConfig,
}

impl SnapshotArgs {
    pub fn load(&self) -> Result<Loaded, Box<dyn std::error::Error>> {
        let snapshot = SeasonSnapshot::load(&self.snapshot)?;
        let config = match &self.config {
            Some(path) => EngineConfig::load_from(path)?,
            None => EngineConfig::load_or_default(),
        };
        let gameweek = match self.gw {
            Some(gw) => transferdesk_core::gameweek::validate_gameweek(gw)?,
            None => snapshot.current_gameweek(chrono::Utc::now()),
        };
        tracing::debug!(gameweek, snapshot = %self.snapshot.display(), "inputs loaded");
        Ok(Loaded {
            snapshot,
            gameweek,
            config,
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
