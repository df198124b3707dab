//! End-to-end decision scenarios through the public API.
//!
//! Covers the reference scenarios for the ledger, the transfer strategy and
//! the chip engine, then drives a whole weekly cycle and the alert router
//! from one season snapshot.

use std::sync::Arc;

use chrono::{Duration, Utc};
use transferdesk_core::chips::ChipWindowEntry;
use transferdesk_core::fixtures::Fixture;
use transferdesk_core::ledger::GameweekTransfers;
use transferdesk_core::urgent::{AlertDispatcher, SuppressionWindow};
use transferdesk_core::*;

fn player(id: PlayerId, team: u32, position: Position, ppg: f64) -> Player {
    Player {
        id,
        name: format!("Player {id}"),
        team,
        position,
        price: 6.0,
        points_per_game: ppg,
        form: ppg,
        total_points: (ppg * 10.0) as u32,
        minutes: 900,
        expected_points: ppg,
        status: PlayerStatus::Available,
    }
}

fn candidate(priority: CandidatePriority, gain: f64) -> TransferCandidate {
    TransferCandidate {
        out_player: 1,
        out_name: "Out".to_string(),
        in_player: 2,
        in_name: "In".to_string(),
        position: Position::Forward,
        priority,
        expected_gain: gain,
        cost: 0,
        gameweek: 12,
    }
}

fn ledger_at(available: u32) -> LedgerState {
    FreeTransferLedger::default().compute(&TransferHistory::default(), 12, Some(available))
}

#[test]
fn test_scenario_a_three_idle_weeks_bank_to_four() {
    let history = TransferHistory::new(
        1,
        (1..=3)
            .map(|gw| GameweekTransfers {
                gameweek: gw,
                transfers_used: 0,
                chip: None,
            })
            .collect(),
    );
    let state = FreeTransferLedger::default().compute(&history, 4, None);
    assert_eq!(state.available, 4);
    assert_eq!(state.banked_before, 3);
    assert!(!state.gap_assumed);
}

#[test]
fn test_scenario_b_hit_taken_for_big_urgent_gain() {
    let planner = TransferPlanner::default();
    let plan = planner.plan_from(&ledger_at(0), vec![candidate(CandidatePriority::Urgent, 6.0)]);
    assert_eq!(plan.action, PlanAction::TakeHit);
    assert_eq!(plan.candidates.len(), 1);
    assert_eq!(plan.candidates[0].cost, 4);
    assert_eq!(plan.total_hit_cost(), 4);
}

#[test]
fn test_scenario_b_small_gain_never_takes_hit() {
    let planner = TransferPlanner::default();
    let plan = planner.plan_from(&ledger_at(0), vec![candidate(CandidatePriority::Urgent, 2.0)]);
    assert_ne!(plan.action, PlanAction::TakeHit);
    assert!(plan.candidates.is_empty());
}

#[test]
fn test_scenario_c_cap_forces_single_free_transfer() {
    let planner = TransferPlanner::default();
    let plan = planner.plan_from(&ledger_at(5), vec![candidate(CandidatePriority::Planned, 3.0)]);
    assert_eq!(plan.action, PlanAction::UseOne);
    assert_eq!(plan.candidates.len(), 1);
    assert_eq!(plan.candidates[0].cost, 0);
    assert!(plan.reasoning.contains("cap"));
}

#[test]
fn test_scenario_d_bench_boost_in_double_gameweek() {
    let gw = 25;
    // Teams 1-3 double, team 4 plays once
    let mut fixtures = vec![
        Fixture { gameweek: gw, home: 1, away: 2, home_difficulty: 3, away_difficulty: 3 },
        Fixture { gameweek: gw, home: 2, away: 3, home_difficulty: 3, away_difficulty: 3 },
        Fixture { gameweek: gw, home: 3, away: 1, home_difficulty: 3, away_difficulty: 3 },
        Fixture { gameweek: gw, home: 4, away: 5, home_difficulty: 3, away_difficulty: 3 },
    ];
    for team in 6..18 {
        fixtures.push(Fixture { gameweek: gw, home: team, away: team + 100, home_difficulty: 3, away_difficulty: 3 });
    }
    let calendar = FixtureCalendar::new(fixtures);
    let config = EngineConfig::default();
    let profile = calendar.profile(gw, config.chips.blank_fixture_threshold);
    assert!(profile.is_double);
    assert!(!profile.is_blank);

    let mut players: Vec<Player> = (1..=11).map(|id| player(id, 6 + id, Position::Midfielder, 5.0)).collect();
    players.push(player(12, 1, Position::Goalkeeper, 3.0));
    players.push(player(13, 2, Position::Defender, 3.0));
    players.push(player(14, 3, Position::Defender, 3.0));
    players.push(player(15, 4, Position::Forward, 3.0));
    let squad = Squad {
        players,
        bench: vec![12, 13, 14, 15],
        captain: Some(1),
    };

    let ctx = ChipContext::from_squad(profile, &squad, 0);
    assert_eq!(ctx.bench_doubling_slots(), 3);

    let tracker = ChipAvailabilityTracker::new(config.chips.expiry_warning_gws);
    let report = tracker.status_all(&ChipCatalog::standard_two_halves(), gw);
    let status = report.status_of(ChipName::BenchBoost, 2).unwrap();

    let engine = ChipDecisionEngine::new(config.chips.clone(), config.transfers.hit_cost);
    let decision = engine.evaluate(status, &ctx);
    assert!(decision.use_chip);
    assert_eq!(decision.urgency, Urgency::High);
}

#[test]
fn test_scenario_e_wildcard_held_near_expiry() {
    let catalog = ChipCatalog::from_windows(
        vec![ChipWindowEntry { name: ChipName::Wildcard, start_gw: 2, stop_gw: 19 }],
        Vec::new(),
    )
    .unwrap();
    let tracker = ChipAvailabilityTracker::new(3);
    let report = tracker.status_all(&catalog, 17);
    let status = report.status_of(ChipName::Wildcard, 1).unwrap();
    assert!(status.expires_soon);

    let ctx = ChipContext {
        gameweek: 17,
        transfers_needed: 1,
        ..ChipContext::default()
    };
    let decision = ChipDecisionEngine::default().evaluate(status, &ctx);
    assert!(!decision.use_chip);
    assert_eq!(decision.urgency, Urgency::Low);
}

#[test]
fn test_chip_window_boundary() {
    let tracker = ChipAvailabilityTracker::new(3);
    let catalog = ChipCatalog::standard_two_halves();
    let at_stop = tracker.status_all(&catalog, 19);
    let after = tracker.status_all(&catalog, 20);
    assert!(at_stop.status_of(ChipName::FreeHit, 1).unwrap().available_now);
    assert!(!after.status_of(ChipName::FreeHit, 1).unwrap().available_now);
    assert!(after.status_of(ChipName::FreeHit, 2).unwrap().available_now);
}

#[test]
fn test_forced_use_when_expiring_chips_outnumber_weeks() {
    // GW18: all four first-half chips expire within two gameweeks
    let report = ChipAvailabilityTracker::new(3).status_all(&ChipCatalog::standard_two_halves(), 18);
    assert_eq!(report.expiring_soon().count(), 4);

    let ctx = ChipContext {
        gameweek: 18,
        ..ChipContext::default()
    };
    let decision = ChipDecisionEngine::default()
        .get_recommended_chip(&report.statuses, &ctx)
        .expect("a chip must be played");
    assert!(decision.use_chip);
}

fn season() -> SeasonSnapshot {
    let gw = 12;
    let mut fixtures = Vec::new();
    for g in gw..gw + 3 {
        // Team 1 hard run, team 2 easy run
        fixtures.push(Fixture { gameweek: g, home: 1, away: 2, home_difficulty: 5, away_difficulty: 2 });
        for team in 3..12 {
            fixtures.push(Fixture { gameweek: g, home: team, away: team + 50, home_difficulty: 3, away_difficulty: 3 });
        }
    }

    let mut squad_players: Vec<Player> = (100..115).map(|id| player(id, 3, Position::Defender, 4.0)).collect();
    squad_players[0] = player(100, 1, Position::Forward, 4.0);
    squad_players[0].name = "Hard Run".to_string();

    let mut replacement = player(200, 2, Position::Forward, 7.0);
    replacement.name = "Easy Run".to_string();

    SeasonSnapshot {
        season: "2025/26".to_string(),
        current_gameweek: Some(gw),
        gameweeks: Vec::new(),
        history: TransferHistory::new(
            3,
            (1..gw)
                .map(|g| GameweekTransfers { gameweek: g, transfers_used: 1, chip: None })
                .collect(),
        ),
        chips: ChipCatalog::standard_two_halves(),
        fixtures: FixtureCalendar::new(fixtures),
        squad: Squad {
            players: squad_players,
            bench: vec![111, 112, 113, 114],
            captain: Some(101),
        },
        players: vec![replacement],
        free_transfer_override: None,
        alerts: Vec::new(),
    }
}

#[tokio::test]
async fn test_weekly_cycle_from_snapshot() {
    let snapshot = Arc::new(season());
    let cycle = WeeklyCycle::new(EngineConfig::default(), CycleSources::from_snapshot(snapshot));
    let report = cycle.run(12).await.unwrap();

    assert!(!report.is_degraded());
    assert_eq!(report.ledger.available, 1);
    assert_eq!(report.transfers_needed, 1);
    assert_eq!(report.plan.considered.len(), 1);
    assert_eq!(report.plan.considered[0].in_name, "Easy Run");
    // A planned move with one free transfer below the cap is banked
    assert_eq!(report.plan.action, PlanAction::Roll);
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, Event::PlanGenerated { gameweek: 12, .. })));
}

#[tokio::test]
async fn test_medium_alert_reaches_next_plan() {
    let snapshot = Arc::new(season());
    let handler = Arc::new(UrgentResponseHandler::default());
    let dispatcher = AlertDispatcher::new(
        Arc::clone(&handler),
        SuppressionWindow::from_hours(24),
        snapshot.squad.clone(),
        snapshot.players.clone(),
        1,
    );
    let (router, mut events, join) = AlertRouter::spawn(dispatcher);
    router.submit(IntelligenceAlert {
        player_id: Some(105),
        player_name: String::new(),
        category: AlertCategory::Rotation,
        severity: Severity::Medium,
        confidence: 0.6,
        detail: "benched in cup".to_string(),
        gameweek: 12,
        received_at: Utc::now(),
    });
    router.shutdown();
    assert!(matches!(events.recv().await, Some(Event::AlertDeferred { player_id: 105, .. })));
    join.await.unwrap();

    let cycle = WeeklyCycle::new(EngineConfig::default(), CycleSources::from_snapshot(snapshot))
        .with_urgent_handler(Arc::clone(&handler));
    let report = cycle.run(12).await.unwrap();
    assert_eq!(report.plan.notes.len(), 1);
    assert!(report.plan.reasoning.contains("Player 105 rotation risk"));
    assert_eq!(handler.pending_count(), 0);
}

#[tokio::test]
async fn test_duplicate_critical_alerts_emit_one_recommendation() {
    let snapshot = season();
    let dispatcher = AlertDispatcher::new(
        Arc::new(UrgentResponseHandler::default()),
        SuppressionWindow::from_hours(24),
        snapshot.squad.clone(),
        snapshot.players.clone(),
        1,
    );
    let (router, mut events, join) = AlertRouter::spawn(dispatcher);
    let at = Utc::now();
    for minutes in [0, 5, 30] {
        router.submit(IntelligenceAlert {
            player_id: None,
            player_name: "hard run".to_string(),
            category: AlertCategory::Injury,
            severity: Severity::Critical,
            confidence: 0.95,
            detail: "ankle".to_string(),
            gameweek: 12,
            received_at: at + Duration::minutes(minutes),
        });
    }
    router.shutdown();
    join.await.unwrap();

    let mut recommendations = 0;
    let mut suppressed = 0;
    while let Some(event) = events.recv().await {
        match event {
            Event::UrgentRecommendation { out_player, in_player, cost, .. } => {
                assert_eq!((out_player, in_player, cost), (100, 200, 0));
                recommendations += 1;
            }
            Event::AlertSuppressed { .. } => suppressed += 1,
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(recommendations, 1);
    assert_eq!(suppressed, 2);
}
