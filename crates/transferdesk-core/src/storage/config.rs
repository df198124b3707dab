//! TOML-based engine configuration.
//!
//! Every rule constant the engine applies is tunable here:
//! - Transfer economics (hit cost, banking cap, planning horizon, top-ups)
//! - Chip heuristics (expiry warning window, double/blank thresholds)
//! - Urgent alert handling (replacement filters, suppression window)
//! - Weekly cycle timing and fetch timeouts
//!
//! Configuration is stored at `~/.config/transferdesk/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::gameweek::GameweekId;

/// A one-off free transfer top-up: after `trigger_after_gw` finishes, the
/// manager holds `target_level` free transfers for the following gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUpEvent {
    pub name: String,
    pub trigger_after_gw: GameweekId,
    pub target_level: u32,
}

/// Transfer ledger and planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransfersConfig {
    #[serde(default = "default_hit_cost")]
    pub hit_cost: u32,
    #[serde(default = "default_max_banked")]
    pub max_banked: u32,
    #[serde(default = "default_horizon_gws")]
    pub horizon_gws: u32,
    /// Average fixture difficulty above which a squad member becomes an out-candidate
    #[serde(default = "default_hard_threshold")]
    pub hard_fixture_threshold: f64,
    /// Average fixture difficulty below which a pool player becomes an in-candidate
    #[serde(default = "default_easy_threshold")]
    pub easy_fixture_threshold: f64,
    /// How many value-ranked pool players are considered as in-candidates
    #[serde(default = "default_in_candidate_pool")]
    pub in_candidate_pool: usize,
    #[serde(default)]
    pub top_up_events: Vec<TopUpEvent>,
}

/// Chip heuristic settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipsConfig {
    #[serde(default = "default_expiry_warning_gws")]
    pub expiry_warning_gws: u32,
    /// Gameweeks with fewer fixtures than this are blank
    #[serde(default = "default_blank_fixture_threshold")]
    pub blank_fixture_threshold: usize,
    #[serde(default = "default_full_round_fixtures")]
    pub full_round_fixtures: usize,
    #[serde(default = "default_bench_boost_min_points")]
    pub bench_boost_min_points: f64,
    #[serde(default = "default_bench_boost_expiry_min_points")]
    pub bench_boost_expiry_min_points: f64,
    #[serde(default = "default_bench_double_slots_required")]
    pub bench_double_slots_required: usize,
    #[serde(default = "default_triple_captain_min_points")]
    pub triple_captain_min_points: f64,
    #[serde(default = "default_wildcard_transfers_needed")]
    pub wildcard_transfers_needed: u32,
    #[serde(default = "default_wildcard_expiring_transfers_needed")]
    pub wildcard_expiring_transfers_needed: u32,
}

/// Urgent alert handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgentConfig {
    /// How much more than the outgoing player a replacement may cost
    #[serde(default = "default_price_buffer")]
    pub price_buffer: f64,
    #[serde(default = "default_min_minutes")]
    pub min_minutes: u32,
    /// Conservative per-gameweek gain assumed for an urgent replacement
    #[serde(default = "default_replacement_points_per_gw")]
    pub replacement_points_per_gw: f64,
    #[serde(default = "default_suppression_window_hours")]
    pub suppression_window_hours: i64,
}

/// Weekly cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_lead_time_hours")]
    pub lead_time_hours: i64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/transferdesk/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub transfers: TransfersConfig,
    #[serde(default)]
    pub chips: ChipsConfig,
    #[serde(default)]
    pub urgent: UrgentConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
}

// Default functions
fn default_hit_cost() -> u32 {
    4
}
fn default_max_banked() -> u32 {
    5
}
fn default_horizon_gws() -> u32 {
    3
}
fn default_hard_threshold() -> f64 {
    3.5
}
fn default_easy_threshold() -> f64 {
    2.5
}
fn default_in_candidate_pool() -> usize {
    50
}
fn default_expiry_warning_gws() -> u32 {
    3
}
fn default_blank_fixture_threshold() -> usize {
    8
}
fn default_full_round_fixtures() -> usize {
    10
}
fn default_bench_boost_min_points() -> f64 {
    12.0
}
fn default_bench_boost_expiry_min_points() -> f64 {
    15.0
}
fn default_bench_double_slots_required() -> usize {
    3
}
fn default_triple_captain_min_points() -> f64 {
    10.0
}
fn default_wildcard_transfers_needed() -> u32 {
    4
}
fn default_wildcard_expiring_transfers_needed() -> u32 {
    2
}
fn default_price_buffer() -> f64 {
    0.5
}
fn default_min_minutes() -> u32 {
    90
}
fn default_replacement_points_per_gw() -> f64 {
    2.0
}
fn default_suppression_window_hours() -> i64 {
    24
}
fn default_fetch_timeout_ms() -> u64 {
    2000
}
fn default_lead_time_hours() -> i64 {
    24
}

impl Default for TransfersConfig {
    fn default() -> Self {
        Self {
            hit_cost: default_hit_cost(),
            max_banked: default_max_banked(),
            horizon_gws: default_horizon_gws(),
            hard_fixture_threshold: default_hard_threshold(),
            easy_fixture_threshold: default_easy_threshold(),
            in_candidate_pool: default_in_candidate_pool(),
            top_up_events: Vec::new(),
        }
    }
}

impl Default for ChipsConfig {
    fn default() -> Self {
        Self {
            expiry_warning_gws: default_expiry_warning_gws(),
            blank_fixture_threshold: default_blank_fixture_threshold(),
            full_round_fixtures: default_full_round_fixtures(),
            bench_boost_min_points: default_bench_boost_min_points(),
            bench_boost_expiry_min_points: default_bench_boost_expiry_min_points(),
            bench_double_slots_required: default_bench_double_slots_required(),
            triple_captain_min_points: default_triple_captain_min_points(),
            wildcard_transfers_needed: default_wildcard_transfers_needed(),
            wildcard_expiring_transfers_needed: default_wildcard_expiring_transfers_needed(),
        }
    }
}

impl Default for UrgentConfig {
    fn default() -> Self {
        Self {
            price_buffer: default_price_buffer(),
            min_minutes: default_min_minutes(),
            replacement_points_per_gw: default_replacement_points_per_gw(),
            suppression_window_hours: default_suppression_window_hours(),
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            lead_time_hours: default_lead_time_hours(),
        }
    }
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/transferdesk"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: EngineConfig = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject values the engine cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.transfers.max_banked == 0 {
            return invalid("transfers.max_banked", "must be at least 1");
        }
        if self.transfers.horizon_gws == 0 {
            return invalid("transfers.horizon_gws", "must be at least 1");
        }
        if self.chips.expiry_warning_gws == 0 {
            return invalid("chips.expiry_warning_gws", "must be at least 1");
        }
        if self.chips.blank_fixture_threshold > self.chips.full_round_fixtures {
            return invalid(
                "chips.blank_fixture_threshold",
                "cannot exceed chips.full_round_fixtures",
            );
        }
        for event in &self.transfers.top_up_events {
            if event.target_level == 0 || event.target_level > self.transfers.max_banked {
                return invalid(
                    "transfers.top_up_events",
                    "target_level must be within 1..=max_banked",
                );
            }
        }
        if self.urgent.suppression_window_hours < 0 {
            return invalid("urgent.suppression_window_hours", "cannot be negative");
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig = serde_json::from_value(json).map_err(|e| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default engine config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.transfers.hit_cost, 4);
        assert_eq!(parsed.transfers.max_banked, 5);
        assert_eq!(parsed.chips.expiry_warning_gws, 3);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: EngineConfig = toml::from_str("[transfers]\nhit_cost = 8\n").unwrap();
        assert_eq!(parsed.transfers.hit_cost, 8);
        assert_eq!(parsed.transfers.horizon_gws, 3);
        assert_eq!(parsed.urgent.suppression_window_hours, 24);
        assert_eq!(parsed.cycle.fetch_timeout_ms, 2000);
    }

    #[test]
    fn top_up_events_parse_from_toml() {
        let parsed: EngineConfig = toml::from_str(
            r#"
            [[transfers.top_up_events]]
            name = "afcon"
            trigger_after_gw = 15
            target_level = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.transfers.top_up_events.len(), 1);
        assert_eq!(parsed.transfers.top_up_events[0].trigger_after_gw, 15);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.get("transfers.hit_cost").as_deref(), Some("4"));
        assert_eq!(cfg.get("chips.bench_boost_min_points").as_deref(), Some("12.0"));
        assert!(cfg.get("transfers.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = EngineConfig::default();
        cfg.set("transfers.horizon_gws", "5").unwrap();
        assert_eq!(cfg.transfers.horizon_gws, 5);
        cfg.set("chips.triple_captain_min_points", "11.5").unwrap();
        assert_eq!(cfg.chips.triple_captain_min_points, 11.5);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = EngineConfig::default();
        let result = cfg.set("transfers.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_value_failing_validation() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.set("transfers.max_banked", "0").is_err());
        assert_eq!(cfg.transfers.max_banked, 5);
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.set("transfers.hit_cost", "lots").is_err());
    }

    #[test]
    fn validate_rejects_top_up_above_cap() {
        let mut cfg = EngineConfig::default();
        cfg.transfers.top_up_events.push(TopUpEvent {
            name: "bad".into(),
            trigger_after_gw: 10,
            target_level: 6,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_and_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = EngineConfig::default();
        cfg.transfers.hit_cost = 6;
        cfg.save_to(&path).unwrap();

        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.transfers.hit_cost, 6);
    }

    #[test]
    fn load_from_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "transfers = [").unwrap();
        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
