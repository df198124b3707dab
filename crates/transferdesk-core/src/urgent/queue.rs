//! Alert routing.
//!
//! Alerts and state updates travel as [`AlertMessage`] values through an
//! unbounded channel to one dispatcher task. The dispatcher owns the
//! current squad, pool and free transfer count, calls the
//! [`UrgentResponseHandler`] and sends [`Event`]s back on an output channel.
//!
//! A [`SuppressionWindow`] keyed by `(player, category, gameweek)` keeps a
//! second alert about an already answered situation from producing another
//! recommendation. Only emitted recommendations open a window.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{AlertCategory, IntelligenceAlert, UrgentOutcome, UrgentResponseHandler};
use crate::events::Event;
use crate::gameweek::GameweekId;
use crate::squad::{Player, PlayerId, Squad};

#[derive(Debug, Clone)]
pub enum AlertMessage {
    Alert(IntelligenceAlert),
    SquadUpdated(Squad),
    PoolUpdated(Vec<Player>),
    /// Free transfers currently available
    LedgerUpdated(u32),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuppressionKey {
    pub player_id: PlayerId,
    pub category: AlertCategory,
    pub gameweek: GameweekId,
}

/// Remembers when each situation was last answered.
#[derive(Debug, Clone)]
pub struct SuppressionWindow {
    window: Duration,
    answered: HashMap<SuppressionKey, DateTime<Utc>>,
}

impl SuppressionWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            answered: HashMap::new(),
        }
    }

    pub fn from_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True when `key` was answered less than one window before `now`.
    pub fn is_suppressed(&self, key: &SuppressionKey, now: DateTime<Utc>) -> bool {
        self.answered
            .get(key)
            .is_some_and(|at| now < *at + self.window)
    }

    pub fn record(&mut self, key: SuppressionKey, now: DateTime<Utc>) {
        self.answered.insert(key, now);
    }

    /// Forget entries whose window has closed.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.answered.retain(|_, at| now < *at + window);
    }

    pub fn len(&self) -> usize {
        self.answered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answered.is_empty()
    }
}

/// State owned by the dispatcher task.
#[derive(Debug)]
pub struct AlertDispatcher {
    handler: Arc<UrgentResponseHandler>,
    suppression: SuppressionWindow,
    squad: Squad,
    pool: Vec<Player>,
    available: u32,
}

impl AlertDispatcher {
    pub fn new(
        handler: Arc<UrgentResponseHandler>,
        suppression: SuppressionWindow,
        squad: Squad,
        pool: Vec<Player>,
        available: u32,
    ) -> Self {
        Self {
            handler,
            suppression,
            squad,
            pool,
            available,
        }
    }

    pub fn handler(&self) -> &Arc<UrgentResponseHandler> {
        &self.handler
    }

    /// Apply one message. Returns the events it produced.
    pub fn dispatch(&mut self, message: AlertMessage) -> Vec<Event> {
        match message {
            AlertMessage::Alert(alert) => self.on_alert(alert),
            AlertMessage::SquadUpdated(squad) => {
                self.squad = squad;
                Vec::new()
            }
            AlertMessage::PoolUpdated(pool) => {
                self.pool = pool;
                Vec::new()
            }
            AlertMessage::LedgerUpdated(available) => {
                self.available = available;
                Vec::new()
            }
            AlertMessage::Shutdown => Vec::new(),
        }
    }

    fn on_alert(&mut self, alert: IntelligenceAlert) -> Vec<Event> {
        if let Err(e) = alert.validate() {
            warn!(player = %alert.player_name, error = %e, "alert rejected");
            return Vec::new();
        }
        let now = alert.received_at;
        self.suppression.prune(now);

        let key = self
            .squad
            .resolve(alert.player_id, &alert.player_name)
            .map(|p| SuppressionKey {
                player_id: p.id,
                category: alert.category,
                gameweek: alert.gameweek,
            });
        if let Some(key) = key {
            if self.suppression.is_suppressed(&key, now) {
                warn!(player_id = key.player_id, category = %key.category, "duplicate alert suppressed");
                return vec![Event::AlertSuppressed {
                    player_id: key.player_id,
                    category: key.category,
                    gameweek: key.gameweek,
                    at: now,
                }];
            }
        }

        match self
            .handler
            .handle(&alert, &self.squad, &self.pool, self.available)
        {
            UrgentOutcome::Recommended(rec) => {
                if let Some(key) = key {
                    self.suppression.record(key, now);
                }
                if rec.candidate.cost == 0 {
                    self.available = self.available.saturating_sub(1);
                }
                vec![Event::UrgentRecommendation {
                    recommendation_id: rec.id,
                    gameweek: rec.gameweek,
                    out_player: rec.candidate.out_player,
                    in_player: rec.candidate.in_player,
                    cost: rec.candidate.cost,
                    at: now,
                }]
            }
            UrgentOutcome::Deferred(obs) => vec![Event::AlertDeferred {
                player_id: obs.player_id,
                category: obs.category,
                severity: alert.severity,
                gameweek: obs.gameweek,
                at: now,
            }],
            UrgentOutcome::NoReplacement { player_id } => vec![Event::NoReplacementFound {
                player_id,
                gameweek: alert.gameweek,
                at: now,
            }],
            UrgentOutcome::NotInSquad | UrgentOutcome::Ignored { .. } => Vec::new(),
        }
    }
}

/// Handle for submitting messages to a running dispatcher.
#[derive(Debug, Clone)]
pub struct AlertRouter {
    sender: mpsc::UnboundedSender<AlertMessage>,
}

impl AlertRouter {
    /// Start the dispatcher task. Events arrive on the returned receiver;
    /// the join handle yields the dispatcher back after shutdown.
    pub fn spawn(
        mut dispatcher: AlertDispatcher,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<Event>,
        JoinHandle<AlertDispatcher>,
    ) {
        let (tx, mut rx) = mpsc::unbounded_channel::<AlertMessage>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<Event>();

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if matches!(message, AlertMessage::Shutdown) {
                    debug!("alert dispatcher shutting down");
                    break;
                }
                for event in dispatcher.dispatch(message) {
                    if events_tx.send(event).is_err() {
                        debug!("event receiver dropped");
                    }
                }
            }
            dispatcher
        });

        (Self { sender: tx }, events_rx, handle)
    }

    pub fn submit(&self, alert: IntelligenceAlert) {
        self.send(AlertMessage::Alert(alert));
    }

    pub fn update_squad(&self, squad: Squad) {
        self.send(AlertMessage::SquadUpdated(squad));
    }

    pub fn update_pool(&self, pool: Vec<Player>) {
        self.send(AlertMessage::PoolUpdated(pool));
    }

    pub fn update_available(&self, available: u32) {
        self.send(AlertMessage::LedgerUpdated(available));
    }

    pub fn shutdown(&self) {
        self.send(AlertMessage::Shutdown);
    }

    fn send(&self, message: AlertMessage) {
        if let Err(err) = self.sender.send(message) {
            error!("alert dispatcher channel closed: {err}");
        }
    }
}
