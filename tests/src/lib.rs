//! # Chain Clicker Test Suite
//!
//! Cross-subsystem flows driven through a full `GameSession` against the
//! in-process simulated ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # Session builders, scripted transports
//!     ├── flows.rs        # Batching, FIFO, revert, manual clear
//!     └── automation.rs   # Scheduler driving the pipeline
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cc-tests
//! cargo test -p cc-tests integration::flows::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
