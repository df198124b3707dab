mod config;

pub use config::{ChipsConfig, CycleConfig, EngineConfig, TopUpEvent, TransfersConfig, UrgentConfig};

use std::path::PathBuf;

/// Returns `~/.config/transferdesk[-dev]/` based on TRANSFERDESK_ENV.
///
/// Set TRANSFERDESK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TRANSFERDESK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("transferdesk-dev")
    } else {
        base_dir.join("transferdesk")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
