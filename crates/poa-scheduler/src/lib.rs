//! Deterministic authority round-robin proposer scheduling with absentee
//! handling and scoring.

#![warn(missing_debug_implementations, unreachable_pub)]

mod error;
mod params;
mod proposer;
mod scheduler;

pub use error::SchedulerError;
pub use params::{DEFAULT_BLOCK_INTERVAL, INITIAL_MAX_PROPOSERS};
pub use proposer::Proposer;
pub use scheduler::{Scheduler, Updates};
