use std::sync::Arc;

use clap::Parser;
use sheetbase::{
    config::{CliArgs, Command, Config, LoggingConfig},
    grid::GridAccessor,
    server::{self, AppState},
    settings::Settings,
    setup::Provisioner,
    table_service::TableService,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli)?;
    init_tracing(&config.logging);

    let grid = GridAccessor::open(&config.storage)?;
    let tables = Arc::new(TableService::new(grid, config.codec()?));

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Setup { sample_data, reset } => {
            let provisioner = Provisioner::new(&tables);
            let report = provisioner.create_all_sheets(true);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if sample_data {
                let rows = provisioner.add_all_sample_data(reset)?;
                tracing::info!(rows, "Sample data seeded");
            }
        }
        Command::Verify => {
            let report = Provisioner::new(&tables).verify_setup();
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success {
                std::process::exit(1);
            }
        }
        Command::Serve => {
            if config.storage.backend == "memory" {
                // Nothing persists in memory, so provision on every start.
                let report = Provisioner::new(&tables).create_all_sheets(true);
                tracing::info!(created = report.created, "In-memory sheets provisioned");
            }
            match Settings::load(&tables) {
                Ok(settings) if !settings.missing_required_keys().is_empty() => {
                    tracing::warn!(missing = ?settings.missing_required_keys(), "Configuration sheet is incomplete");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Configuration sheet unreadable"),
            }

            let addr = config.listen_addr()?;
            let app = server::router(AppState::new(tables));
            tracing::info!(%addr, "API listening");

            axum::Server::bind(&addr).serve(app.into_make_service()).await?;
        }
    }

    Ok(())
}
