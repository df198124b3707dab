use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "transferdesk-cli", version, about = "Transferdesk CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Free transfers available for a gameweek
    Ledger(commands::ledger::LedgerArgs),
    /// Chip status and recommendations
    Chips {
        #[command(subcommand)]
        action: commands::chips::ChipsAction,
    },
    /// Weekly transfer plan
    Plan(commands::plan::PlanArgs),
    /// Full weekly cycle: ledger, plan and chip decision
    Cycle(commands::cycle::CycleArgs),
    /// Feed player news through the urgent response path
    Alert(commands::alert::AlertArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRANSFERDESK_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Ledger(args) => commands::ledger::run(args),
        Commands::Chips { action } => commands::chips::run(action),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Cycle(args) => commands::cycle::run(args),
        Commands::Alert(args) => commands::alert::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
