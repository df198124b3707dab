use std::sync::Arc;

use clap::Args;
use transferdesk_core::urgent::{AlertDispatcher, SuppressionWindow};
use transferdesk_core::{
    AlertCategory, AlertRouter, Event, FreeTransferLedger, IntelligenceAlert, PlayerId, Severity,
    UrgentResponseHandler,
};

use super::{print_json, SnapshotArgs};

#[derive(Args, Debug)]
pub struct AlertArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,
    /// Player identifier; omit both --player and --name to replay the
    /// snapshot's recorded alerts
    #[arg(long)]
    pub player: Option<PlayerId>,
    /// Player display name, used when the identifier is unknown
    #[arg(long)]
    pub name: Option<String>,
    /// injury | rotation | suspension
    #[arg(long, default_value = "injury")]
    pub category: String,
    /// critical | high | medium | low
    #[arg(long, default_value = "high")]
    pub severity: String,
    #[arg(long, default_value_t = 1.0)]
    pub confidence: f64,
    #[arg(long, default_value = "")]
    pub detail: String,
}

pub fn run(args: AlertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = args.input.load()?;
    let gameweek = loaded.gameweek;

    let alerts = if args.player.is_some() || args.name.is_some() {
        let category: AlertCategory = args.category.parse()?;
        let severity: Severity = args.severity.parse()?;
        vec![IntelligenceAlert {
            player_id: args.player,
            player_name: args.name.unwrap_or_default(),
            category,
            severity,
            confidence: args.confidence,
            detail: args.detail,
            gameweek,
            received_at: chrono::Utc::now(),
        }]
    } else {
        loaded.snapshot.alerts.clone()
    };

    let available = FreeTransferLedger::new(&loaded.config.transfers)
        .compute_from_source(&loaded.snapshot, gameweek, loaded.snapshot.free_transfer_override)
        .available;
    let handler = Arc::new(UrgentResponseHandler::new(
        &loaded.config.urgent,
        &loaded.config.transfers,
    ));
    let dispatcher = AlertDispatcher::new(
        handler,
        SuppressionWindow::from_hours(loaded.config.urgent.suppression_window_hours),
        loaded.snapshot.squad,
        loaded.snapshot.players,
        available,
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let events = runtime.block_on(async move {
        let (router, mut rx, join) = AlertRouter::spawn(dispatcher);
        for alert in alerts {
            router.submit(alert);
        }
        router.shutdown();

        let mut events: Vec<Event> = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        join.await.map(|_| events)
    })?;
    print_json(&events)
}
