//! The port the scheduler drives.

use serde::{Deserialize, Serialize};
use shared_types::{StageKind, TierId};
use std::fmt;

/// One automatable (tier, stage) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AutomationKey {
    /// Tier driven.
    pub tier: TierId,
    /// Stage driven.
    pub stage: StageKind,
}

impl AutomationKey {
    /// Key for a pair.
    pub fn new(tier: TierId, stage: StageKind) -> Self {
        Self { tier, stage }
    }
}

impl fmt::Display for AutomationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier, self.stage)
    }
}

/// What automation ticks act on.
///
/// Implementations must be cheap and non-blocking: they are called from
/// the scheduler's tasks on every tick.
pub trait AutomationDriver: Send + Sync + 'static {
    /// Current rate; zero disables the pair.
    fn units_per_second(&self, key: AutomationKey) -> u32;

    /// Whether a tick would be accepted right now.
    fn ready(&self, key: AutomationKey) -> bool;

    /// Perform the same work a manual tap would.
    fn tick(&self, key: AutomationKey);
}
