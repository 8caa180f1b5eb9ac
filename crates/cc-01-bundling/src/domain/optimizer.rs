//! Run-length bundling of ledger actions.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Action, ContractAddress, Entrypoint};
use tracing::trace;

/// Grouping key of a bundleable action. Two actions belong to the same run
/// only when every field matches.
#[derive(PartialEq, Eq)]
struct RunKey<'a> {
    entrypoint: Entrypoint,
    target: &'a ContractAddress,
    tier: &'a U256,
}

impl<'a> RunKey<'a> {
    fn of(action: &'a Action) -> Option<Self> {
        action.entrypoint.bundled()?;
        let tier = action.calldata.first()?;
        Some(Self {
            entrypoint: action.entrypoint,
            target: &action.target,
            tier,
        })
    }
}

/// Collapse runs of consecutive homogeneous actions into bundled calls.
///
/// A run of `n >= 2` actions becomes one action with the bundled entrypoint
/// and calldata `[tier, n, args_1.., args_n..]`, where `args_i` is the
/// calldata of the i-th original action after its tier word.
#[must_use]
pub fn optimize(actions: &[Action]) -> Vec<Action> {
    let mut optimized = Vec::with_capacity(actions.len());
    let mut start = 0;

    while start < actions.len() {
        let Some(key) = RunKey::of(&actions[start]) else {
            optimized.push(actions[start].clone());
            start += 1;
            continue;
        };

        let run_len = actions[start..]
            .iter()
            .take_while(|action| RunKey::of(action).as_ref() == Some(&key))
            .count();
        let run = &actions[start..start + run_len];

        optimized.push(bundle_run(run));
        start += run_len;
    }

    trace!(
        before = actions.len(),
        after = optimized.len(),
        "[cc-01] Bundling pass complete"
    );
    optimized
}

fn bundle_run(run: &[Action]) -> Action {
    let head = &run[0];
    let bundled = match (run.len(), head.entrypoint.bundled()) {
        (n, Some(bundled)) if n >= 2 => bundled,
        _ => return head.clone(),
    };

    let arg_words: usize = run.iter().map(|a| a.calldata.len() - 1).sum();
    let mut calldata = Vec::with_capacity(arg_words + 2);
    calldata.push(head.calldata[0]);
    calldata.push(U256::from(run.len()));
    for action in run {
        calldata.extend_from_slice(&action.calldata[1..]);
    }

    Action::new(head.target.clone(), bundled, calldata)
}

/// How much a bundling pass shrank a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSavings {
    /// Actions before bundling.
    pub before: usize,
    /// Actions after bundling.
    pub after: usize,
    /// Calls saved.
    pub saved: usize,
}

impl BundleSavings {
    /// Share of calls saved, in percent.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.before == 0 {
            return 0.0;
        }
        self.saved as f64 * 100.0 / self.before as f64
    }
}

/// Compare a batch before and after [`optimize`].
#[must_use]
pub fn bundle_savings(before: &[Action], after: &[Action]) -> BundleSavings {
    BundleSavings {
        before: before.len(),
        after: after.len(),
        saved: before.len().saturating_sub(after.len()),
    }
}
