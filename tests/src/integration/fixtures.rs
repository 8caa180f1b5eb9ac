//! Shared builders for the integration flows.

use async_trait::async_trait;
use cc_04_action_queue::{LedgerTransport, SubmissionResult, TransportError};
use game_runtime::{GameConfig, GameSession, SimulatedLedger, SimulatedLedgerConfig};
use parking_lot::Mutex;
use shared_types::{Action, ContractAddress, StageKind, TierId};
use std::sync::Arc;

/// Base tier.
pub const L1: TierId = TierId::BASE;

/// Contract the test sessions address.
pub const GAME_CONTRACT: &str = "0xc1c4e2";

/// Balance after the L1 genesis block is mined and sequenced with default
/// levels: 50 genesis reward plus 16 fees of 1.
pub const GENESIS_PAYOUT: u64 = 66;

/// Config with a short retry delay and the given batch size.
pub fn config(max_batch_size: usize) -> GameConfig {
    let mut config = GameConfig {
        game_contract: ContractAddress::new(GAME_CONTRACT),
        ..GameConfig::default()
    };
    config.queue.max_batch_size = max_batch_size;
    config.queue.retry_delay_ms = 100;
    config
}

/// Session on an instant simulated ledger.
pub fn simulated_session(config: GameConfig) -> (GameSession, Arc<SimulatedLedger>) {
    let ledger = Arc::new(SimulatedLedger::new(SimulatedLedgerConfig::instant()));
    let session = GameSession::with_simulated_ledger(config, ledger.clone())
        .expect("valid test config");
    (session, ledger)
}

/// Tap Mining until the block is built, then Sequencing until it is sealed.
pub fn play_block(session: &GameSession, tier: TierId) {
    while session.is_ready(tier, StageKind::Mining) {
        session.add_transaction(tier).expect("mining tap");
    }
    while session.is_ready(tier, StageKind::Sequencing) {
        session.click_sequencer(tier).expect("sequencing tap");
    }
}

/// Play one block, flush and wait until the ledger has confirmed it.
pub async fn play_settled_block(session: &GameSession, tier: TierId) {
    play_block(session, tier);
    session.flush();
    session.queue().wait_idle().await;
}

/// Transport that always refuses with a ledger rejection.
#[derive(Default)]
pub struct RejectingTransport {
    pub calls: Mutex<Vec<Vec<Action>>>,
}

#[async_trait]
impl LedgerTransport for RejectingTransport {
    async fn submit(&self, actions: &[Action]) -> Result<SubmissionResult, TransportError> {
        self.calls.lock().push(actions.to_vec());
        Err(TransportError::Rejected("nonce too low".into()))
    }
}
