//! # Reconciliation Flows
//!
//! Pipeline output travelling through the action queue to the ledger, and
//! the way back when the ledger gives up.
//!
//! ## Flows Tested
//!
//! 1. **Batching + bundling**: full batches drain FIFO, each as one bundled
//!    ledger transaction
//! 2. **Checkpoint + revert**: a terminal failure rolls balance, levels and
//!    stages back to the last settled state
//! 3. **Fail-fast rejection**: opt-in terminal rejection on first attempt
//! 4. **Manual clear**: reset discards the queue without reverting
//! 5. **Missing contract**: local play continues, nothing is queued

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use cc_02_economy::{Feature, Item, UpgradeId};
    use game_runtime::{GameSession, SessionError};
    use primitive_types::U256;
    use shared_bus::{EventFilter, EventTopic, GameEvent};
    use shared_types::{BatchId, ContractAddress, Entrypoint, StageKind, TierId};
    use std::sync::Arc;

    // =============================================================================
    // BATCHING + BUNDLING
    // =============================================================================

    #[tokio::test]
    async fn test_full_batches_drain_fifo_as_bundled_calls() {
        let (session, ledger) = simulated_session(config(4));
        let mut queue_events = session.subscribe(EventFilter::topics(vec![EventTopic::Queue]));

        // 16 add_transaction + 1 mine_block: four full batches, one buffered
        play_block(&session, L1);
        assert_eq!(session.queue().buffered(), 1);
        session.flush();
        session.queue().wait_idle().await;

        let confirmed: Vec<BatchId> = queue_events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                GameEvent::BatchConfirmed { batch_id, .. } => Some(batch_id),
                _ => None,
            })
            .collect();
        assert_eq!(confirmed, (1..=5).map(BatchId).collect::<Vec<_>>());

        let accepted = ledger.accepted();
        assert_eq!(accepted.len(), 5);
        for batch in &accepted[..4] {
            assert_eq!(batch.actions.len(), 1);
            assert_eq!(batch.actions[0].entrypoint, Entrypoint::AddTransactionBundled);
            assert_eq!(
                batch.actions[0].calldata,
                [0u64, 4, 1, 1, 1, 1].map(U256::from).to_vec()
            );
        }
        assert_eq!(accepted[4].actions[0].entrypoint, Entrypoint::MineBlock);

        let metrics = session.queue().metrics();
        assert_eq!(metrics.batches_confirmed, 5);
        assert_eq!(metrics.calls_saved, 12);
    }

    #[tokio::test]
    async fn test_purchase_rides_alone_after_pending_pipeline_actions() {
        let (session, ledger) = simulated_session(config(1_000));
        play_block(&session, L1);
        session.buy_upgrade(L1, UpgradeId::BlockSize).unwrap();
        session.queue().wait_idle().await;

        let accepted = ledger.accepted();
        assert_eq!(accepted.len(), 2);
        let purchase = &accepted[1].actions;
        assert_eq!(purchase.len(), 1);
        assert_eq!(purchase[0].entrypoint, Entrypoint::BuyUpgrade);
        assert_eq!(purchase[0].tier(), Some(L1));
    }

    // =============================================================================
    // CHECKPOINT + REVERT
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_rolls_back_to_last_settled_state() {
        let (session, ledger) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;
        let settled = session.checkpoint();
        assert_eq!(settled.balance, U256::from(GENESIS_PAYOUT));

        let mut revert_events = session.subscribe(EventFilter::topics(vec![EventTopic::Revert]));
        ledger.fail_next(3);

        // optimistic progress the ledger never sees
        session.buy_upgrade(L1, UpgradeId::BlockSize).unwrap();
        for _ in 0..5 {
            session.add_transaction(L1).unwrap();
        }
        assert!(session.balance() < U256::from(GENESIS_PAYOUT));
        session.flush();
        session.queue().wait_idle().await;

        assert_eq!(ledger.attempts(), 1 + 3);
        assert_eq!(session.queue().revert_counter(), 1);
        assert_eq!(session.queue().len(), 0);
        assert_eq!(session.queue().buffered(), 0);
        assert_eq!(session.balance(), settled.balance);
        assert_eq!(session.level(L1, Item::Upgrade(UpgradeId::BlockSize)), 0);
        assert_eq!(session.stage(L1, StageKind::Mining).unwrap().units(), 0);
        assert_eq!(session.height(L1), 1);

        let events = revert_events.drain();
        assert!(matches!(events[0], GameEvent::TerminalFailure { .. }));
        assert!(matches!(events[1], GameEvent::RevertStarted { revert_counter: 1 }));
        assert!(matches!(
            events[2],
            GameEvent::RevertCompleted {
                revert_counter: 1,
                success: true
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_keeps_batches_confirmed_ahead_of_buffered_actions() {
        let (session, ledger) = simulated_session(config(2));
        for _ in 0..3 {
            session.add_transaction(L1).unwrap();
        }
        session.queue().wait_idle().await;
        assert_eq!(ledger.accepted().len(), 1);
        assert_eq!(session.queue().buffered(), 1);
        assert_eq!(session.checkpoint().after, Some(BatchId(1)));

        // the fourth transaction seals batch 2, which never lands
        ledger.fail_next(3);
        session.add_transaction(L1).unwrap();
        session.queue().wait_idle().await;

        assert_eq!(session.queue().revert_counter(), 1);
        assert_eq!(session.stage(L1, StageKind::Mining).unwrap().units(), 2);
        assert_eq!(session.balance(), U256::zero());
        assert_eq!(session.queue().buffered(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_purchase_survives_later_revert() {
        let (session, ledger) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;

        let purchase = session.buy_upgrade(L1, UpgradeId::BlockSize).unwrap();
        session.add_transaction(L1).unwrap();
        session.queue().wait_idle().await;
        assert_eq!(session.checkpoint().after, Some(BatchId(2)));

        ledger.fail_next(3);
        session.flush();
        session.queue().wait_idle().await;

        assert_eq!(session.queue().revert_counter(), 1);
        assert_eq!(session.level(L1, Item::Upgrade(UpgradeId::BlockSize)), 1);
        assert_eq!(session.balance(), U256::from(GENESIS_PAYOUT) - purchase.cost);
        assert_eq!(session.stage(L1, StageKind::Mining).unwrap().units(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_resumes_after_revert() {
        let (session, ledger) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;

        ledger.fail_next(3);
        session.add_transaction(L1).unwrap();
        session.flush();
        session.queue().wait_idle().await;
        assert_eq!(session.queue().revert_counter(), 1);

        play_settled_block(&session, L1).await;
        assert_eq!(session.height(L1), 2);
        assert_eq!(session.checkpoint().balance, session.balance());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_terminal_when_fail_fast() {
        let mut config = config(1_000);
        config.queue.retry_on_rejection = false;
        let transport = Arc::new(RejectingTransport::default());
        let session = GameSession::new(config, transport.clone(), None).unwrap();

        play_block(&session, L1);
        session.flush();
        session.queue().wait_idle().await;

        assert_eq!(transport.calls.lock().len(), 1);
        assert_eq!(session.queue().revert_counter(), 1);
        assert_eq!(session.balance(), U256::zero());
        assert_eq!(session.height(L1), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_retried_by_default() {
        let transport = Arc::new(RejectingTransport::default());
        let session = GameSession::new(config(1_000), transport.clone(), None).unwrap();

        session.add_transaction(L1).unwrap();
        session.flush();
        session.queue().wait_idle().await;

        assert_eq!(transport.calls.lock().len(), 3);
        assert_eq!(session.queue().revert_counter(), 1);
    }

    // =============================================================================
    // MANUAL CLEAR + CONFIGURATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_queue_without_reverting() {
        let (session, ledger) = simulated_session(config(1_000));
        ledger.fail_next(100);
        play_block(&session, L1);
        session.flush();
        tokio::task::yield_now().await;

        session.reset().await;
        session.queue().wait_idle().await;

        assert_eq!(session.queue().revert_counter(), 0);
        assert_eq!(session.queue().len(), 0);
        assert_eq!(session.balance(), U256::zero());
        assert_eq!(session.height(L1), 0);
    }

    #[tokio::test]
    async fn test_missing_contract_keeps_local_play() {
        let mut config = config(4);
        config.game_contract = ContractAddress::default();
        let (session, ledger) = simulated_session(config);

        play_block(&session, L1);
        assert_eq!(session.balance(), U256::from(GENESIS_PAYOUT));
        assert_eq!(session.queue().len(), 0);
        assert_eq!(session.queue().buffered(), 0);
        assert_eq!(session.queue().metrics().actions_dropped, 17);

        // purchases still apply locally; only their ledger action is dropped
        let purchase = session.buy_upgrade(L1, UpgradeId::BlockSize).unwrap();
        assert_eq!(session.balance(), U256::from(GENESIS_PAYOUT) - purchase.cost);
        assert_eq!(session.queue().len(), 0);
        assert_eq!(session.queue().metrics().actions_dropped, 18);
        assert_eq!(ledger.attempts(), 0);
    }

    #[tokio::test]
    async fn test_l2_unlock_requires_funds() {
        let (session, _) = simulated_session(config(1_000));
        play_block(&session, L1);

        let err = session
            .unlock_feature(TierId(1), Feature::Chain)
            .unwrap_err();
        assert!(matches!(err, SessionError::Economy(_)));
        assert!(!session.status().tiers[1].unlocked);
    }
}
