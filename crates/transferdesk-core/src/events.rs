use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chips::{ChipName, Urgency};
use crate::gameweek::GameweekId;
use crate::planner::PlanAction;
use crate::squad::PlayerId;
use crate::urgent::{AlertCategory, Severity};

/// Every decision the engine reaches produces an Event.
/// The announcement layer consumes them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PlanGenerated {
        gameweek: GameweekId,
        action: PlanAction,
        available_free_transfers: u32,
        transfers: usize,
        hit_cost: u32,
        at: DateTime<Utc>,
    },
    ChipRecommended {
        gameweek: GameweekId,
        chip: ChipName,
        instance: u8,
        urgency: Urgency,
        at: DateTime<Utc>,
    },
    /// A chip chosen by the use-or-lose override.
    ChipForced {
        gameweek: GameweekId,
        chip: ChipName,
        instance: u8,
        expiring: usize,
        at: DateTime<Utc>,
    },
    UrgentRecommendation {
        recommendation_id: Uuid,
        gameweek: GameweekId,
        out_player: PlayerId,
        in_player: PlayerId,
        cost: u32,
        at: DateTime<Utc>,
    },
    /// Alert about a situation already answered inside the suppression window.
    AlertSuppressed {
        player_id: PlayerId,
        category: AlertCategory,
        gameweek: GameweekId,
        at: DateTime<Utc>,
    },
    /// Medium-severity alert kept for the next weekly plan.
    AlertDeferred {
        player_id: PlayerId,
        category: AlertCategory,
        severity: Severity,
        gameweek: GameweekId,
        at: DateTime<Utc>,
    },
    /// Urgent alert for which the pool had no acceptable replacement.
    NoReplacementFound {
        player_id: PlayerId,
        gameweek: GameweekId,
        at: DateTime<Utc>,
    },
    LedgerDegraded {
        gameweek: GameweekId,
        reason: String,
        at: DateTime<Utc>,
    },
}
