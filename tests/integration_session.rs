//! Whole-engine tests: paper sessions over the simulated ledger, exercising
//! bootstrap, lap rotation, persistence, and the control surface together.

use std::sync::Arc;

use tempfile::TempDir;

use rotor::RotorError;
use rotor::config::EngineConfig;
use rotor::domain::{SessionCheckpoint, Stage};
use rotor::ledger::{LedgerClient, SimLedger};
use rotor::market::{PairInfo, StaticMarketData};
use rotor::orchestrator::SessionEngine;
use rotor::session::{JsonSessionStore, SessionStore};
use rotor::strategy::HoldStrategy;

type PaperEngine = SessionEngine<SimLedger, StaticMarketData, JsonSessionStore>;

const POOL_SIZE: usize = 4;

fn fast_config(max_laps: Option<u64>) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.resource_name = "DEMO".to_string();
    config.pool_size = POOL_SIZE;
    config.trading_duration_secs = 0;
    config.throttle_ms = 0;
    config.max_retries = 0;
    config.max_laps = max_laps;
    config
}

fn engine(dir: &TempDir, ledger: Arc<SimLedger>, max_laps: Option<u64>) -> PaperEngine {
    SessionEngine::new(
        ledger,
        Arc::new(StaticMarketData::any()),
        Arc::new(JsonSessionStore::new(dir.path()).unwrap()),
        Arc::new(HoldStrategy),
        fast_config(max_laps),
    )
}

/// Fund the paper admin ahead of creation; SimLedger addresses are
/// deterministic and the admin is the first identity minted.
fn funded_ledger(primary: f64, secondary: f64) -> Arc<SimLedger> {
    let ledger = Arc::new(SimLedger::new());
    ledger.credit("sim-0000", primary, secondary);
    ledger
}

#[tokio::test]
async fn full_session_conserves_value() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 0.0);
    let engine = engine(&dir, ledger.clone(), Some(3));

    engine.start(None).unwrap();
    engine.wait().await;

    let status = engine.status();
    assert!(status.last_error.is_none(), "{:?}", status.last_error);
    assert_eq!(status.stage, Some(Stage::AccountsSwept));

    // Everything distributed came back through collection and the final
    // sweep: the admin ends the session holding the full initial funding
    let (admin_primary, admin_secondary) = ledger.balance_of("sim-0000");
    assert!((admin_primary - 1.0).abs() < 1e-9, "{}", admin_primary);
    assert_eq!(admin_secondary, 0.0);
}

#[tokio::test]
async fn secondary_funding_rotates_with_the_pool() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 400.0);
    let engine = engine(&dir, ledger.clone(), Some(2));

    engine.start(None).unwrap();
    engine.wait().await;

    assert!(engine.status().last_error.is_none());
    let summary = engine.summary();
    assert_eq!(summary.laps_completed, 2);
    // Each lap sweeps the full secondary holdings back in
    assert!((summary.total_secondary_collected - 800.0).abs() < 1e-6);

    let (_, admin_secondary) = ledger.balance_of("sim-0000");
    assert!((admin_secondary - 400.0).abs() < 1e-6);
}

#[tokio::test]
async fn failed_worker_contribution_is_stranded_not_invented() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 0.0);
    // The initial pool occupies sim-0001..sim-0004; one sweep always fails
    ledger.fail_transfers_from("sim-0002");
    let engine = engine(&dir, ledger.clone(), Some(1));

    engine.start(None).unwrap();
    engine.wait().await;

    let summary = engine.summary();
    assert_eq!(summary.laps_completed, 1);
    // Three of four workers swept their 0.25 share
    assert!((summary.total_primary_collected - 0.75).abs() < 1e-9);

    // The failed worker's share is stranded at its address, never re-counted
    let (stranded, _) = ledger.balance_of("sim-0002");
    assert!((stranded - 0.25).abs() < 1e-9);
    let (admin_primary, _) = ledger.balance_of("sim-0000");
    assert!((admin_primary - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn stop_request_finishes_lap_and_sweeps() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 0.0);
    let engine = engine(&dir, ledger.clone(), None);

    engine.start(None).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    engine.stop();
    engine.wait().await;

    let status = engine.status();
    assert!(!status.running);
    assert_eq!(status.stage, Some(Stage::AccountsSwept));
    // All value is back with the admin after the close-out sweep
    let (admin_primary, _) = ledger.balance_of("sim-0000");
    assert!((admin_primary - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn bootstrap_resumes_from_persisted_stage() {
    let dir = TempDir::new().unwrap();
    let ledger = Arc::new(SimLedger::new());

    // A previous run got as far as creating the admin, then died
    let admin = ledger.create_identity().await.unwrap();
    ledger.credit(&admin.address, 1.0, 0.0);
    let store = JsonSessionStore::new(dir.path()).unwrap();
    let mut checkpoint = SessionCheckpoint::new(
        "sess-resume",
        "DEMO",
        PairInfo {
            pair_address: "pair-DEMO".to_string(),
            base_symbol: "DEMO".to_string(),
            quote_symbol: "PRI".to_string(),
            price: 1.0,
            liquidity: 0.0,
        },
    );
    checkpoint.stage = Stage::AdminCreated;
    checkpoint.admin = Some(admin);
    store.save(&checkpoint).await.unwrap();

    let engine = engine(&dir, ledger.clone(), Some(1));
    engine.start(Some("sess-resume")).unwrap();
    engine.wait().await;

    assert!(engine.status().last_error.is_none());
    assert_eq!(engine.status().stage, Some(Stage::AccountsSwept));
    // No second admin was minted: one bootstrap pool plus one lap rotation
    assert_eq!(ledger.creates_done(), 1 + POOL_SIZE * 2);
}

#[tokio::test]
async fn restart_from_reruns_later_stages() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 0.0);

    let first = engine(&dir, ledger.clone(), Some(1));
    let session_ref = first.start(None).unwrap();
    first.wait().await;
    assert_eq!(first.status().stage, Some(Stage::AccountsSwept));
    let creates_after_first = ledger.creates_done();

    // Reset to stage 2 and re-run: pool generation onward executes again
    let stage = first.restart_from(&session_ref, 2).await.unwrap();
    assert_eq!(stage, Stage::AdminCreated);

    let second = engine(&dir, ledger.clone(), Some(1));
    second.start(Some(&session_ref)).unwrap();
    second.wait().await;

    assert!(second.status().last_error.is_none());
    assert_eq!(second.status().stage, Some(Stage::AccountsSwept));
    // A fresh bootstrap pool and one lap rotation, but no new admin
    assert_eq!(ledger.creates_done(), creates_after_first + POOL_SIZE * 2);
}

#[tokio::test]
async fn restart_into_emptied_pool_is_rejected() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, funded_ledger(1.0, 0.0), Some(1));

    let session_ref = engine.start(None).unwrap();
    engine.wait().await;

    // The close-out sweep emptied the pool, so stage 3 has no data to
    // re-enter with
    let err = engine.restart_from(&session_ref, 3).await.unwrap_err();
    assert!(matches!(err, RotorError::InvalidState(_)));
}

#[tokio::test]
async fn checkpoint_survives_engine_instances() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 0.0);

    let first = engine(&dir, ledger.clone(), Some(2));
    let session_ref = first.start(None).unwrap();
    first.wait().await;

    // A different engine over the same store sees the swept session and
    // performs no work
    let second = engine(&dir, ledger.clone(), None);
    second.start(Some(&session_ref)).unwrap();
    second.wait().await;

    assert!(second.status().last_error.is_none());
    assert_eq!(second.summary().laps_run, 0);
}

#[tokio::test]
async fn unknown_resumed_session_is_created_fresh() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, funded_ledger(1.0, 0.0), Some(1));

    // Starting with an arbitrary reference creates that session
    engine.start(Some("sess-named")).unwrap();
    engine.wait().await;

    assert!(engine.status().last_error.is_none());
    let store = JsonSessionStore::new(dir.path()).unwrap();
    let checkpoint = store.load("sess-named").await.unwrap();
    assert_eq!(checkpoint.stage, Stage::AccountsSwept);
    assert!(checkpoint.pool.is_empty());
}

#[tokio::test]
async fn lap_history_records_partial_failures() {
    let dir = TempDir::new().unwrap();
    let ledger = funded_ledger(1.0, 0.0);
    ledger.fail_transfers_from("sim-0003");
    let engine = engine(&dir, ledger, Some(1));

    engine.start(None).unwrap();
    engine.wait().await;

    let history = engine.history();
    assert_eq!(history.len(), 1);
    let lap = &history[0];
    assert!(lap.status.is_terminal());
    // The lap completed despite one failed sweep
    assert_eq!(lap.error_message, None);
    assert!((lap.total_primary_collected - 0.75).abs() < 1e-9);
    assert_eq!(lap.workers_regenerated, POOL_SIZE);
}
