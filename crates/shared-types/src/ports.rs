//! # Action Sink Port
//!
//! The single seam through which the production pipeline emits ledger
//! actions. The action queue handle implements it in production; tests use
//! the `Vec<Action>` implementation to capture emissions.

use crate::entities::Action;

/// Receiver of ledger actions produced by local state transitions.
pub trait ActionSink {
    /// Hand one action over for eventual submission.
    fn push_action(&mut self, action: Action);
}

impl ActionSink for Vec<Action> {
    fn push_action(&mut self, action: Action) {
        self.push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ContractAddress, Entrypoint, TierId};

    #[test]
    fn test_vec_sink_preserves_order() {
        let target = ContractAddress::new("0xgame");
        let mut sink: Vec<Action> = Vec::new();
        sink.push_action(Action::for_tier(target.clone(), Entrypoint::MineBlock, TierId(0), vec![]));
        sink.push_action(Action::for_tier(target, Entrypoint::StoreDa, TierId(0), vec![]));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].entrypoint, Entrypoint::MineBlock);
        assert_eq!(sink[1].entrypoint, Entrypoint::StoreDa);
    }
}
