//! # Automation Flows
//!
//! The scheduler tapping a real pipeline on tokio's paused clock. Every
//! automation tick goes through the same path as a player tap, so its
//! output is queued and reverted like any other action.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use cc_02_economy::{AutomationId, Item};
    use cc_05_automation::AutomationKey;
    use primitive_types::U256;
    use shared_types::StageKind;
    use std::time::Duration;

    fn miner_key() -> AutomationKey {
        AutomationKey::new(L1, StageKind::Mining)
    }

    fn mining_units(session: &game_runtime::GameSession) -> u64 {
        session
            .stage(L1, StageKind::Mining)
            .map_or(0, |stage| stage.units())
    }

    #[tokio::test(start_paused = true)]
    async fn test_automated_miner_fills_block_then_idles() {
        let (session, _) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;

        session.buy_automation(L1, AutomationId::Miner).unwrap();
        assert_eq!(session.status().automation, vec![miner_key()]);

        // one unit per second, sixteen units per block
        tokio::time::sleep(Duration::from_millis(16_100)).await;
        assert_eq!(mining_units(&session), 16);
        assert!(!session.is_ready(L1, StageKind::Mining));
        assert_eq!(session.automation_ticks(), 16);

        // a built block is not ready, so the scheduler skips
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(session.automation_ticks(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_pair_never_ticks_until_resumed() {
        let (session, _) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;

        session.pause_automation(miner_key());
        session.buy_automation(L1, AutomationId::Miner).unwrap();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(mining_units(&session), 0);
        assert_eq!(session.automation_ticks(), 0);

        session.resume_automation(miner_key());
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(mining_units(&session), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_disable_stops_every_pair() {
        let (session, _) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;
        session.buy_automation(L1, AutomationId::Miner).unwrap();

        session.set_automation_enabled(false);
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(mining_units(&session), 0);
        assert!(!session.status().automation_enabled);

        session.set_automation_enabled(true);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(mining_units(&session), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_resyncs_automation_with_restored_levels() {
        let (session, ledger) = simulated_session(config(1_000));
        play_settled_block(&session, L1).await;

        ledger.fail_next(3);
        session.buy_automation(L1, AutomationId::Miner).unwrap();
        assert_eq!(session.balance(), U256::from(GENESIS_PAYOUT - 25));

        // three retries at 100ms settle long before the first 1s tick
        session.queue().wait_idle().await;
        assert_eq!(session.queue().revert_counter(), 1);
        assert_eq!(session.level(L1, Item::Automation(AutomationId::Miner)), -1);
        assert_eq!(session.balance(), U256::from(GENESIS_PAYOUT));
        assert!(session.status().automation.is_empty());

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(session.automation_ticks(), 0);
        assert_eq!(mining_units(&session), 0);
    }
}
