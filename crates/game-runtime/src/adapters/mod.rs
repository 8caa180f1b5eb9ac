//! Port implementations the runtime provides.

pub mod simulated_ledger;

pub use simulated_ledger::{AcceptedBatch, SimulatedLedger, SimulatedLedgerConfig};
