//! Adapters that let the queue and the scheduler call back into a session.
//!
//! Both hold a weak reference: the session owns the queue and the
//! scheduler, so a strong one would keep the session alive forever.

use super::state::SessionCore;
use anyhow::Context;
use async_trait::async_trait;
use cc_04_action_queue::{ConfirmationObserver, RevertHandler};
use cc_05_automation::{AutomationDriver, AutomationKey};
use shared_types::BatchId;
use std::sync::{OnceLock, Weak};
use tracing::debug;

/// Revert handler and confirmation observer of a session.
///
/// Built before the session because the queue needs it; bound once the
/// session exists.
#[derive(Default)]
pub(crate) struct CheckpointHooks {
    core: OnceLock<Weak<SessionCore>>,
}

impl CheckpointHooks {
    pub(crate) fn bind(&self, core: Weak<SessionCore>) {
        let _ = self.core.set(core);
    }

    fn core(&self) -> Option<std::sync::Arc<SessionCore>> {
        self.core.get().and_then(Weak::upgrade)
    }
}

#[async_trait]
impl RevertHandler for CheckpointHooks {
    async fn revert(&self) -> anyhow::Result<()> {
        let core = self.core().context("session is gone, nothing to restore")?;
        core.restore_checkpoint();
        Ok(())
    }
}

#[async_trait]
impl ConfirmationObserver for CheckpointHooks {
    async fn confirmed(&self, batch_id: BatchId, settled: bool) {
        if let Some(core) = self.core() {
            core.on_batch_confirmed(batch_id, settled);
        }
    }
}

/// Automation driver performing the same taps a player would.
pub(crate) struct SessionDriver {
    pub(crate) core: Weak<SessionCore>,
}

impl AutomationDriver for SessionDriver {
    fn units_per_second(&self, key: AutomationKey) -> u32 {
        self.core
            .upgrade()
            .map_or(0, |core| core.automation_rate(key))
    }

    fn ready(&self, key: AutomationKey) -> bool {
        self.core.upgrade().map_or(false, |core| {
            !core.queue.is_reverting() && core.pipeline.lock().is_ready(key.tier, key.stage)
        })
    }

    fn tick(&self, key: AutomationKey) {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        if let Err(e) = core.tap(key.tier, key.stage) {
            debug!(key = %key, error = %e, "[runtime] Automated tap refused");
        }
    }
}
