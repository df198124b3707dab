//! Scheduled weekly cycle.
//!
//! Runs once per gameweek, a fixed lead time before the deadline:
//! ledger replay, transfer plan, chip status and chip decision. Every
//! external fetch runs on the blocking pool under a bounded wait. A fetch
//! that fails or times out degrades its part of the report and the cycle
//! carries on.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chips::{
    ChipAvailabilityTracker, ChipContext, ChipDecision, ChipDecisionEngine, ChipReport,
};
use crate::error::{DataError, ValidationError};
use crate::events::Event;
use crate::fixtures::FixtureCalendar;
use crate::gameweek::{next_open_gameweek, validate_gameweek, Gameweek, GameweekId};
use crate::ledger::{LedgerCache, LedgerState};
use crate::planner::{PlanningInputs, TransferPlan, TransferPlanner};
use crate::snapshot::SeasonSnapshot;
use crate::sources::{ChipCatalogSource, FixtureSource, HistorySource, PlayerPoolSource, RosterSource};
use crate::squad::Squad;
use crate::storage::EngineConfig;
use crate::urgent::UrgentResponseHandler;

/// External collaborators read by the cycle.
#[derive(Clone)]
pub struct CycleSources {
    pub history: Arc<dyn HistorySource>,
    pub chips: Arc<dyn ChipCatalogSource>,
    pub fixtures: Arc<dyn FixtureSource>,
    pub roster: Arc<dyn RosterSource>,
    pub pool: Arc<dyn PlayerPoolSource>,
}

impl CycleSources {
    pub fn from_snapshot(snapshot: Arc<SeasonSnapshot>) -> Self {
        Self {
            history: snapshot.clone(),
            chips: snapshot.clone(),
            fixtures: snapshot.clone(),
            roster: snapshot.clone(),
            pool: snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub gameweek: GameweekId,
    pub ledger: LedgerState,
    pub plan: TransferPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<ChipDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip_report: Option<ChipReport>,
    pub transfers_needed: u32,
    #[serde(default)]
    pub degraded_reasons: Vec<String>,
    #[serde(default)]
    pub events: Vec<Event>,
    pub generated_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_reasons.is_empty()
    }
}

pub struct WeeklyCycle {
    config: EngineConfig,
    sources: CycleSources,
    planner: TransferPlanner,
    tracker: ChipAvailabilityTracker,
    chip_engine: ChipDecisionEngine,
    cache: Arc<LedgerCache>,
    urgent: Option<Arc<UrgentResponseHandler>>,
    manual_override: Option<u32>,
}

impl WeeklyCycle {
    pub fn new(config: EngineConfig, sources: CycleSources) -> Self {
        Self {
            planner: TransferPlanner::new(&config.transfers),
            tracker: ChipAvailabilityTracker::new(config.chips.expiry_warning_gws),
            chip_engine: ChipDecisionEngine::new(config.chips.clone(), config.transfers.hit_cost),
            cache: Arc::new(LedgerCache::new()),
            urgent: None,
            manual_override: None,
            config,
            sources,
        }
    }

    /// Pull medium-severity observations from this handler into each plan.
    pub fn with_urgent_handler(mut self, handler: Arc<UrgentResponseHandler>) -> Self {
        self.urgent = Some(handler);
        self
    }

    pub fn with_manual_override(mut self, available: Option<u32>) -> Self {
        self.manual_override = available;
        self
    }

    pub fn with_cache(mut self, cache: Arc<LedgerCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<LedgerCache> {
        &self.cache
    }

    pub fn planner(&self) -> &TransferPlanner {
        &self.planner
    }

    /// When the cycle for `gameweek` should run.
    pub fn next_run_at(&self, gameweek: &Gameweek) -> DateTime<Utc> {
        gameweek.cycle_run_at(Duration::hours(self.config.cycle.lead_time_hours))
    }

    /// The next gameweek still open at `now` and when its cycle runs.
    pub fn next_scheduled(
        &self,
        gameweeks: &[Gameweek],
        now: DateTime<Utc>,
    ) -> Option<(GameweekId, DateTime<Utc>)> {
        next_open_gameweek(gameweeks, now).map(|gw| (gw.id, self.next_run_at(gw)))
    }

    /// Run the cycle for `gw`. Only an out-of-season gameweek is an error;
    /// data problems come back as degraded sections.
    pub async fn run(&self, gw: GameweekId) -> Result<CycleReport, ValidationError> {
        validate_gameweek(gw)?;
        let now = Utc::now();
        self.cache.invalidate_before(gw);

        let history_src = Arc::clone(&self.sources.history);
        let roster_src = Arc::clone(&self.sources.roster);
        let pool_src = Arc::clone(&self.sources.pool);
        let fixture_src = Arc::clone(&self.sources.fixtures);
        let chip_src = Arc::clone(&self.sources.chips);
        let (history, squad, pool, calendar, catalog) = tokio::join!(
            self.fetch("transfer history", move || history_src.transfer_history()),
            self.fetch("squad", move || roster_src.squad()),
            self.fetch("player pool", move || pool_src.ranked_players()),
            self.fetch("fixture calendar", move || fixture_src.fixture_calendar()),
            self.fetch("chip catalog", move || chip_src.chip_catalog()),
        );

        let mut degraded_reasons = Vec::new();
        let mut events = Vec::new();

        let ledger = match &history {
            Ok(history) => self.cache.get_or_compute(
                self.planner.ledger(),
                history,
                gw,
                self.manual_override,
            ),
            Err(e) => self.planner.ledger().fallback(gw, e, self.manual_override),
        };
        if let Some(reason) = &ledger.degraded {
            degraded_reasons.push(format!("transfer data unavailable, defaulted to {}", ledger.available));
            events.push(Event::LedgerDegraded {
                gameweek: gw,
                reason: reason.clone(),
                at: now,
            });
        }

        let squad_ok = squad.is_ok();
        let fixtures_ok = calendar.is_ok();
        let squad = unwrap_or_degraded(squad, Squad::default(), &mut degraded_reasons);
        let pool = unwrap_or_degraded(pool, Vec::new(), &mut degraded_reasons);
        let calendar = unwrap_or_degraded(calendar, FixtureCalendar::default(), &mut degraded_reasons);

        let observations = self
            .urgent
            .as_ref()
            .map(|h| h.take_pending_observations())
            .unwrap_or_default();
        let watchlist: HashSet<_> = observations.iter().map(|o| o.player_id).collect();
        let notes = observations.iter().map(ToString::to_string).collect();

        let inputs = PlanningInputs {
            squad,
            pool,
            calendar,
            watchlist,
        };

        let transfers_needed = if fixtures_ok {
            self.planner.transfers_needed(gw, &inputs)
        } else {
            inputs
                .squad
                .players
                .iter()
                .filter(|p| p.status.is_ruled_out() || inputs.watchlist.contains(&p.id))
                .count() as u32
        };

        let candidates = if fixtures_ok {
            self.planner.find_candidates(gw, &inputs)
        } else {
            Vec::new()
        };
        let mut plan = self.planner.plan_from(&ledger, candidates).with_notes(notes);
        for reason in degraded_reasons.iter().skip(usize::from(ledger.is_degraded())) {
            plan.reasoning.push_str(&format!(" Limited: {reason}."));
        }
        if plan.degraded.is_none() && !degraded_reasons.is_empty() {
            plan.degraded = Some(degraded_reasons.join("; "));
        }
        events.push(Event::PlanGenerated {
            gameweek: gw,
            action: plan.action,
            available_free_transfers: plan.available_free_transfers,
            transfers: plan.candidates.len(),
            hit_cost: plan.total_hit_cost(),
            at: now,
        });

        let chip_report = match catalog {
            Ok(catalog) => Some(self.tracker.status_all(&catalog, gw)),
            Err(e) => {
                degraded_reasons.push(e.to_string());
                None
            }
        };

        let chip = match &chip_report {
            Some(report) if squad_ok && fixtures_ok => {
                let profile = inputs
                    .calendar
                    .profile(gw, self.config.chips.blank_fixture_threshold);
                let ctx = ChipContext::from_squad(profile, &inputs.squad, transfers_needed);
                self.chip_engine.get_recommended_chip(&report.statuses, &ctx)
            }
            Some(_) => {
                warn!(gw, "chip advice skipped: squad or fixtures missing");
                degraded_reasons.push("chip advice skipped: squad or fixtures unavailable".into());
                None
            }
            None => None,
        };
        if let (Some(decision), Some(report)) = (&chip, &chip_report) {
            events.push(if decision.forced {
                Event::ChipForced {
                    gameweek: gw,
                    chip: decision.chip,
                    instance: decision.instance,
                    expiring: report.expiring_soon().count(),
                    at: now,
                }
            } else {
                Event::ChipRecommended {
                    gameweek: gw,
                    chip: decision.chip,
                    instance: decision.instance,
                    urgency: decision.urgency,
                    at: now,
                }
            });
        }

        info!(
            gw,
            action = %plan.action,
            chip = ?chip.as_ref().map(|c| c.chip),
            degraded = degraded_reasons.len(),
            "weekly cycle finished"
        );

        Ok(CycleReport {
            gameweek: gw,
            ledger,
            plan,
            chip,
            chip_report,
            transfers_needed,
            degraded_reasons,
            events,
            generated_at: now,
        })
    }

    async fn fetch<T, F>(&self, source_name: &'static str, f: F) -> Result<T, DataError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, DataError> + Send + 'static,
    {
        let waited_ms = self.config.cycle.fetch_timeout_ms;
        match tokio::time::timeout(
            StdDuration::from_millis(waited_ms),
            tokio::task::spawn_blocking(f),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(DataError::unavailable(source_name, join_err.to_string())),
            Err(_) => {
                warn!(source = source_name, waited_ms, "fetch timed out");
                Err(DataError::Timeout {
                    source_name: source_name.to_string(),
                    waited_ms,
                })
            }
        }
    }
}

fn unwrap_or_degraded<T>(result: Result<T, DataError>, fallback: T, reasons: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "cycle input degraded");
            reasons.push(e.to_string());
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips::ChipCatalog;
    use crate::ledger::TransferHistory;
    use crate::squad::{Player, PlayerStatus, Position};
    use chrono::TimeZone;

    struct SlowHistory;

    impl HistorySource for SlowHistory {
        fn transfer_history(&self) -> Result<TransferHistory, DataError> {
            std::thread::sleep(StdDuration::from_millis(600));
            Ok(TransferHistory::default())
        }
    }

    fn snapshot() -> Arc<SeasonSnapshot> {
        Arc::new(SeasonSnapshot {
            season: "test".into(),
            current_gameweek: Some(5),
            gameweeks: Vec::new(),
            history: TransferHistory::default(),
            chips: ChipCatalog::standard_two_halves(),
            fixtures: FixtureCalendar::default(),
            squad: Squad {
                players: vec![Player {
                    id: 1,
                    name: "Solo".into(),
                    team: 1,
                    position: Position::Midfielder,
                    price: 5.0,
                    points_per_game: 3.0,
                    form: 3.0,
                    total_points: 20,
                    minutes: 400,
                    expected_points: 3.0,
                    status: PlayerStatus::Available,
                }],
                bench: Vec::new(),
                captain: None,
            },
            players: Vec::new(),
            free_transfer_override: None,
            alerts: Vec::new(),
        })
    }

    fn config(timeout_ms: u64) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.cycle.fetch_timeout_ms = timeout_ms;
        config
    }

    #[tokio::test]
    async fn slow_history_degrades_instead_of_stalling() {
        let mut sources = CycleSources::from_snapshot(snapshot());
        sources.history = Arc::new(SlowHistory);
        let cycle = WeeklyCycle::new(config(100), sources);

        let report = cycle.run(5).await.unwrap();
        assert!(report.ledger.is_degraded());
        assert_eq!(report.plan.available_free_transfers, 1);
        assert!(report
            .degraded_reasons
            .iter()
            .any(|r| r == "transfer data unavailable, defaulted to 1"));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, Event::LedgerDegraded { .. })));
    }

    #[tokio::test]
    async fn missing_pool_still_produces_plan() {
        let cycle = WeeklyCycle::new(config(2000), CycleSources::from_snapshot(snapshot()));
        let report = cycle.run(5).await.unwrap();
        assert_eq!(report.ledger.available, 5);
        assert!(report.is_degraded());
        assert!(report.plan.reasoning.contains("Limited: player pool unavailable"));
        assert!(report.chip_report.is_some());
    }

    #[tokio::test]
    async fn out_of_season_gameweek_rejected() {
        let cycle = WeeklyCycle::new(config(2000), CycleSources::from_snapshot(snapshot()));
        assert!(cycle.run(39).await.is_err());
    }

    #[tokio::test]
    async fn ledger_results_cached_per_gameweek() {
        let cycle = WeeklyCycle::new(config(2000), CycleSources::from_snapshot(snapshot()));
        cycle.run(5).await.unwrap();
        assert_eq!(cycle.cache().len(), 1);
        cycle.run(6).await.unwrap();
        assert_eq!(cycle.cache().len(), 1);
    }

    #[test]
    fn next_run_is_lead_time_before_deadline() {
        let cycle = WeeklyCycle::new(EngineConfig::default(), CycleSources::from_snapshot(snapshot()));
        let deadline = Utc.with_ymd_and_hms(2025, 11, 1, 11, 0, 0).unwrap();
        let gw = Gameweek {
            id: 11,
            deadline,
            finished: false,
        };
        assert_eq!(cycle.next_run_at(&gw), deadline - Duration::hours(24));
        let now = deadline - Duration::days(3);
        assert_eq!(
            cycle.next_scheduled(std::slice::from_ref(&gw), now),
            Some((11, deadline - Duration::hours(24)))
        );
    }
}
