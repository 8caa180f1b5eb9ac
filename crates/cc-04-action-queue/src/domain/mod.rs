//! Domain layer: batches and receipt classification.

mod batch;
mod receipt;

pub use batch::{ActionBatch, BatchStatus, BatchSummary};
pub use receipt::classify;
