//! Urgent response to player intelligence.
//!
//! Critical and high severity alerts about a squad member produce a
//! replacement recommendation straight away, outside the weekly cycle.
//! Medium severity alerts are kept as observations for the next weekly
//! plan. Anything lower is ignored.
//!
//! Deduplication of repeated alerts lives in [`queue::SuppressionWindow`].

pub mod queue;

pub use queue::{AlertDispatcher, AlertMessage, AlertRouter, SuppressionKey, SuppressionWindow};

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::gameweek::GameweekId;
use crate::planner::{CandidatePriority, TransferCandidate};
use crate::squad::{Player, PlayerId, Squad};
use crate::storage::{TransfersConfig, UrgentConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(ValidationError::InvalidValue {
                field: "severity".into(),
                message: format!("unknown severity '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Injury,
    Rotation,
    Suspension,
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertCategory::Injury => "injury",
            AlertCategory::Rotation => "rotation",
            AlertCategory::Suspension => "suspension",
        })
    }
}

impl FromStr for AlertCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "injury" => Ok(AlertCategory::Injury),
            "rotation" => Ok(AlertCategory::Rotation),
            "suspension" => Ok(AlertCategory::Suspension),
            other => Err(ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown category '{other}'"),
            }),
        }
    }
}

/// News about one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceAlert {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    pub player_name: String,
    pub category: AlertCategory,
    pub severity: Severity,
    /// 0.0 to 1.0
    pub confidence: f64,
    #[serde(default)]
    pub detail: String,
    pub gameweek: GameweekId,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl IntelligenceAlert {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::InvalidValue {
                field: "confidence".into(),
                message: format!("{} is outside 0..=1", self.confidence),
            });
        }
        crate::gameweek::validate_gameweek(self.gameweek)?;
        Ok(())
    }
}

/// Replacement emitted for a critical or high severity alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecommendation {
    pub id: Uuid,
    pub gameweek: GameweekId,
    pub category: AlertCategory,
    pub severity: Severity,
    pub candidate: TransferCandidate,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

/// Medium-severity news carried into the next weekly plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingObservation {
    pub player_id: PlayerId,
    pub player_name: String,
    pub category: AlertCategory,
    pub detail: String,
    pub gameweek: GameweekId,
    pub received_at: DateTime<Utc>,
}

impl fmt::Display for PendingObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} risk", self.player_name, self.category)?;
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UrgentOutcome {
    /// Subject is not in the managed squad.
    NotInSquad,
    Ignored { severity: Severity },
    Deferred(PendingObservation),
    Recommended(TransferRecommendation),
    NoReplacement { player_id: PlayerId },
}

#[derive(Debug)]
pub struct UrgentResponseHandler {
    config: UrgentConfig,
    hit_cost: u32,
    horizon: u32,
    pending: Mutex<Vec<PendingObservation>>,
}

impl Default for UrgentResponseHandler {
    fn default() -> Self {
        Self::new(&UrgentConfig::default(), &TransfersConfig::default())
    }
}

impl UrgentResponseHandler {
    pub fn new(config: &UrgentConfig, transfers: &TransfersConfig) -> Self {
        Self {
            config: config.clone(),
            hit_cost: transfers.hit_cost,
            horizon: transfers.horizon_gws,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &UrgentConfig {
        &self.config
    }

    /// React to one alert. `available` is the ledger's current free transfer
    /// count for the alert's gameweek.
    pub fn handle(
        &self,
        alert: &IntelligenceAlert,
        squad: &Squad,
        pool: &[Player],
        available: u32,
    ) -> UrgentOutcome {
        let Some(subject) = squad.resolve(alert.player_id, &alert.player_name) else {
            debug!(player = %alert.player_name, "alert subject not in squad");
            return UrgentOutcome::NotInSquad;
        };

        match alert.severity {
            Severity::Critical | Severity::High => self.recommend(alert, subject, squad, pool, available),
            Severity::Medium => UrgentOutcome::Deferred(self.defer(alert, subject)),
            Severity::Low => {
                debug!(player = %subject.name, "low severity alert ignored");
                UrgentOutcome::Ignored {
                    severity: alert.severity,
                }
            }
        }
    }

    /// Best replacement for `out`: same position, affordable, regular
    /// minutes, ranked by total points then form.
    pub fn find_replacement<'a>(
        &self,
        out: &Player,
        squad: &Squad,
        pool: &'a [Player],
    ) -> Option<&'a Player> {
        let max_price = out.price + self.config.price_buffer;
        pool.iter()
            .filter(|p| p.position == out.position)
            .filter(|p| p.id != out.id && !squad.contains(p.id))
            .filter(|p| !p.status.is_ruled_out())
            .filter(|p| p.price <= max_price)
            .filter(|p| p.minutes >= self.config.min_minutes)
            .max_by(|a, b| {
                a.total_points
                    .cmp(&b.total_points)
                    .then(a.form.total_cmp(&b.form))
                    .then(b.id.cmp(&a.id))
            })
    }

    /// Drain observations gathered since the last call.
    pub fn take_pending_observations(&self) -> Vec<PendingObservation> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn recommend(
        &self,
        alert: &IntelligenceAlert,
        out: &Player,
        squad: &Squad,
        pool: &[Player],
        available: u32,
    ) -> UrgentOutcome {
        let Some(replacement) = self.find_replacement(out, squad, pool) else {
            warn!(player = %out.name, category = %alert.category, "no replacement within budget");
            return UrgentOutcome::NoReplacement { player_id: out.id };
        };

        let cost = if available >= 1 { 0 } else { self.hit_cost };
        let gain = self.config.replacement_points_per_gw * f64::from(self.horizon);
        let candidate = TransferCandidate {
            out_player: out.id,
            out_name: out.name.clone(),
            in_player: replacement.id,
            in_name: replacement.name.clone(),
            position: out.position,
            priority: CandidatePriority::Urgent,
            expected_gain: gain,
            cost,
            gameweek: alert.gameweek,
        };
        let funding = if cost == 0 {
            format!("uses 1 of {available} free transfer(s)")
        } else {
            format!("costs a -{cost} hit")
        };
        let reasoning = format!(
            "GW{}: {} {} ({:?}, confidence {:.0}%). Replace with {} ({} pts, {:.1}m); {}.",
            alert.gameweek,
            out.name,
            alert.category,
            alert.severity,
            alert.confidence * 100.0,
            replacement.name,
            replacement.total_points,
            replacement.price,
            funding,
        );

        let recommendation = TransferRecommendation {
            id: Uuid::new_v4(),
            gameweek: alert.gameweek,
            category: alert.category,
            severity: alert.severity,
            candidate,
            reasoning,
            created_at: Utc::now(),
        };
        info!(
            id = %recommendation.id,
            out = %out.name,
            replacement = %replacement.name,
            cost,
            "urgent transfer recommended"
        );
        UrgentOutcome::Recommended(recommendation)
    }

    fn defer(&self, alert: &IntelligenceAlert, subject: &Player) -> PendingObservation {
        let observation = PendingObservation {
            player_id: subject.id,
            player_name: subject.name.clone(),
            category: alert.category,
            detail: alert.detail.clone(),
            gameweek: alert.gameweek,
            received_at: alert.received_at,
        };
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        // Same situation reported again: keep the newest detail only
        pending.retain(|p| {
            !(p.player_id == observation.player_id
                && p.category == observation.category
                && p.gameweek == observation.gameweek)
        });
        pending.push(observation.clone());
        info!(player = %subject.name, category = %alert.category, "observation kept for weekly plan");
        observation
    }
}
