use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;

use rotor::config::EngineConfig;
use rotor::ledger::SimLedger;
use rotor::market::StaticMarketData;
use rotor::orchestrator::SessionEngine;
use rotor::session::{CheckpointManager, JsonSessionStore};
use rotor::strategy::HoldStrategy;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rotor")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("rotor.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            session,
            laps,
            fund,
            fund_secondary,
        } => handle_run(session.as_deref(), *laps, *fund, *fund_secondary, config).await,
        Commands::Status { session } => handle_status(session, &config).await,
        Commands::RestartFrom { session, stage } => {
            handle_restart_from(session, *stage, &config).await
        }
        Commands::Sessions => handle_sessions(&config),
    }
}

async fn handle_run(
    session: Option<&str>,
    laps: Option<u64>,
    fund: f64,
    fund_secondary: f64,
    mut config: EngineConfig,
) -> Result<()> {
    if laps.is_some() {
        config.max_laps = laps;
    }

    let ledger = Arc::new(SimLedger::new());
    // Paper mode: the admin is the first identity the ledger mints
    ledger.credit("sim-0000", fund, fund_secondary);

    let store = Arc::new(
        JsonSessionStore::new(config.session_dir()).context("Failed to open session store")?,
    );
    let engine = Arc::new(SessionEngine::new(
        ledger,
        Arc::new(StaticMarketData::any()),
        store,
        Arc::new(HoldStrategy),
        config,
    ));

    let session_ref = engine
        .start(session)
        .context("Failed to start session")?;
    println!("{} {}", "Session:".green(), session_ref.bold());
    info!("Paper session {} started", session_ref);

    let stopper = engine.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("{}", "Stop requested, finishing current lap...".yellow());
            stopper.stop();
        }
    });

    engine.wait().await;

    let status = engine.status();
    let summary = engine.summary();
    println!(
        "{} {} laps ({} completed, {} failed)",
        "Done:".green(),
        summary.laps_run,
        summary.laps_completed,
        summary.laps_failed
    );
    println!(
        "  primary collected:   {:.6}",
        summary.total_primary_collected
    );
    println!(
        "  secondary collected: {:.6}",
        summary.total_secondary_collected
    );
    println!("  workers regenerated: {}", summary.workers_regenerated);
    if let Some(err) = status.last_error {
        println!("{} {}", "Session error:".red(), err);
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_status(session: &str, config: &EngineConfig) -> Result<()> {
    let store = Arc::new(
        JsonSessionStore::new(config.session_dir()).context("Failed to open session store")?,
    );
    let manager = CheckpointManager::new(store);
    let checkpoint = manager
        .resume(session)
        .await
        .context("Failed to load session")?;

    println!("{} {}", "Session:".green(), checkpoint.session_ref.bold());
    println!("  stage:    {}", checkpoint.stage);
    println!("  resource: {}", checkpoint.resource_name);
    println!("  pool:     {} workers", checkpoint.pool.len());
    println!(
        "  admin:    {}",
        checkpoint
            .admin
            .as_ref()
            .map(|a| a.address.as_str())
            .unwrap_or("not created")
    );
    if let Some(pair) = &checkpoint.pair {
        println!(
            "  pair:     {} ({}/{})",
            pair.pair_address, pair.base_symbol, pair.quote_symbol
        );
    }
    Ok(())
}

async fn handle_restart_from(session: &str, stage: u8, config: &EngineConfig) -> Result<()> {
    let store = Arc::new(
        JsonSessionStore::new(config.session_dir()).context("Failed to open session store")?,
    );
    let manager = CheckpointManager::new(store);
    let target = rotor::domain::Stage::from_u8(stage).context("Invalid stage number")?;
    let checkpoint = manager
        .restart_from(session, target)
        .await
        .context("Failed to reset session stage")?;

    println!(
        "{} {} reset to stage {}",
        "Session:".green(),
        checkpoint.session_ref.bold(),
        checkpoint.stage
    );
    println!("{}", "Run with --session to re-execute from there".cyan());
    Ok(())
}

fn handle_sessions(config: &EngineConfig) -> Result<()> {
    let dir = config.session_dir();
    if !dir.exists() {
        println!("{}", "No sessions found".yellow());
        return Ok(());
    }
    let mut found = false;
    for entry in fs::read_dir(&dir).context("Failed to read session directory")? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                println!("{}", name);
                found = true;
            }
        }
    }
    if !found {
        println!("{}", "No sessions found".yellow());
    }
    Ok(())
}
