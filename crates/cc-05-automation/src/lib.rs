//! # Chain Clicker - Automation Scheduler (Subsystem 05)
//!
//! **Bounded Context:** Timed production
//!
//! ## Purpose
//!
//! Drives the production pipeline without player input. Each automatable
//! `(tier, stage)` pair owns one task that ticks `units_per_second` times a
//! second and performs exactly what a manual tap would.
//!
//! ```text
//!   refresh(key) ──► rate = driver.units_per_second(key)
//!                        │
//!                 0 ─────┴───── n > 0
//!                 │              │
//!           abort task    spawn task(interval = 1000/n ms)
//!                                │
//!                  sleep_until(deadline) ◄───────────┐
//!                                │                   │
//!              enabled && !paused && driver.ready()  │
//!                                │                   │
//!                          driver.tick(key)          │
//!                                │                   │
//!                  deadline = previous + interval ───┘
//! ```
//!
//! ## Invariants
//!
//! 1. At most one task per pair; refreshing with an unchanged rate keeps it.
//! 2. A paused pair or a disabled scheduler never ticks.
//! 3. Deadlines advance from the previous deadline, so tick timing does not
//!    drift; a task more than one interval late resynchronizes from now.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod driver;
pub mod scheduler;

pub use driver::{AutomationDriver, AutomationKey};
pub use scheduler::{interval_for, next_deadline, AutomationScheduler};

/// Subsystem identifier used in log prefixes.
pub const SUBSYSTEM_ID: u8 = 5;
