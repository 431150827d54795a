//! Claimchart CLI - Command-line interface for reviewing patent claim charts.

use claimchart_cli::commands;
use claimchart_cli::{session, Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> claimchart_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let db = match cli.db {
        Some(path) => path,
        None => config.database_path()?,
    };
    let response = match &cli.command {
        Command::Extract(args) => Some(args.response.as_path()),
        Command::Refine(args) => args.response.as_deref(),
        _ => None,
    };
    let session = session::open(&db, response, config.refiner_config())?;

    // Handle commands
    let result = match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &session, &formatter).await,
        Command::Attach(args) => commands::execute_attach(args, &session, &formatter),
        Command::List => commands::execute_list(&session, &formatter),
        Command::Show(args) => commands::execute_show(args, &session, &formatter),
        Command::Refine(args) => commands::execute_refine(args, &session, &formatter).await,
        Command::Accept(args) => commands::execute_accept(args, &session, &formatter),
        Command::Reject(args) => commands::execute_reject(args, &session, &formatter),
        Command::History(args) => commands::execute_history(args, &session, &formatter),
        Command::Diff(args) => commands::execute_diff(args, &session, &formatter),
        Command::Check(args) => commands::execute_check(args, &session, &formatter),
        Command::Delete(args) => commands::execute_delete(args, &session, &formatter),
    };

    session.close()?;
    result
}
