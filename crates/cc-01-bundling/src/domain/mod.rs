//! Domain layer for bundling: the optimizer and its savings report.

mod optimizer;

pub use optimizer::{bundle_savings, optimize, BundleSavings};
