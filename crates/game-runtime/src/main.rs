//! # Chain Clicker Demo
//!
//! Plays one session against the simulated ledger: taps L1 until the first
//! automation is affordable, buys it, and lets the game run.
//!
//! ## Environment
//!
//! - Everything `GameConfig::load` reads (`CC_CONFIG`, `CC_*`)
//! - `CC_DEMO_SECONDS`: run time (default 10)
//! - `CC_DEMO_FAILURE_RATE`: simulated ledger failure probability (default 0)

use anyhow::{Context, Result};
use cc_02_economy::{AutomationId, EconomyError};
use game_runtime::{telemetry, GameConfig, GameSession, SessionError, SimulatedLedger, SimulatedLedgerConfig};
use shared_bus::{EventFilter, EventTopic, GameEvent};
use shared_types::{ContractAddress, StageKind, TierId};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

const DEMO_CONTRACT: &str = "0xc1c4e2";
const TAP_INTERVAL: Duration = Duration::from_millis(50);

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid value {raw:?} for {name}")),
        Err(_) => Ok(default),
    }
}

/// One manual tap on whichever L1 stage accepts it.
fn tap(session: &GameSession) -> Result<(), SessionError> {
    let tier = TierId::BASE;
    if session.is_ready(tier, StageKind::Mining) {
        session.add_transaction(tier)?;
    } else if session.is_ready(tier, StageKind::Sequencing) {
        session.click_sequencer(tier)?;
    }
    Ok(())
}

async fn play(session: &GameSession) {
    let mut ticker = tokio::time::interval(TAP_INTERVAL);
    let mut miner_bought = false;
    loop {
        ticker.tick().await;
        match tap(session) {
            Ok(()) | Err(SessionError::Reverting) => {}
            Err(e) => warn!(error = %e, "Tap refused"),
        }

        if !miner_bought {
            match session.buy_automation(TierId::BASE, AutomationId::Miner) {
                Ok(purchase) => {
                    info!(cost = %purchase.cost, "Bought the first miner");
                    miner_bought = true;
                }
                Err(SessionError::Economy(EconomyError::InsufficientFunds { .. }))
                | Err(SessionError::Reverting) => {}
                Err(e) => {
                    warn!(error = %e, "Miner purchase failed");
                    miner_bought = true;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = GameConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.telemetry).context("Failed to initialize logging")?;

    if config.game_contract.is_empty() {
        warn!(contract = DEMO_CONTRACT, "No game contract configured, using the demo address");
        config.game_contract = ContractAddress::new(DEMO_CONTRACT);
    }

    let run_for = Duration::from_secs(env_or("CC_DEMO_SECONDS", 10u64)?);
    let ledger = Arc::new(SimulatedLedger::new(SimulatedLedgerConfig {
        failure_rate: env_or("CC_DEMO_FAILURE_RATE", 0.0f64)?,
        ..SimulatedLedgerConfig::default()
    }));

    let session = GameSession::with_simulated_ledger(config, ledger.clone())
        .context("Failed to build game session")?;

    let mut reverts = session
        .events()
        .event_stream(EventFilter::topics(vec![EventTopic::Revert]));
    tokio::spawn(async move {
        while let Some(event) = reverts.next().await {
            match event {
                GameEvent::TerminalFailure { batch_id, last_error } => {
                    error!(batch_id = %batch_id, error = %last_error, "Ledger gave up on a batch");
                }
                GameEvent::RevertCompleted { revert_counter, success } => {
                    warn!(revert_counter, success, "Local state rolled back");
                }
                _ => {}
            }
        }
    });

    info!(seconds = run_for.as_secs(), "Chain Clicker demo running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = play(&session) => {}
        _ = tokio::time::sleep(run_for) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    session.shutdown().await;
    let status = session.status();
    info!(
        attempts = ledger.attempts(),
        accepted = ledger.accepted().len(),
        status = %serde_json::to_string(&status)?,
        "Demo finished"
    );
    Ok(())
}
