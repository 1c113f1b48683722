//! Tunable constants for the proposer scheduler.

/// Spacing between block slots, in the same unit as block timestamps
/// (seconds). Kept as a constant here and as a configurable field on
/// [`crate::Scheduler`] so tests can exercise other spacings without
/// touching the algorithm.
pub const DEFAULT_BLOCK_INTERVAL: u64 = 10;

/// Upper bound on how far back [`crate::Scheduler::updates`] walks when
/// collecting skipped proposers.
pub const INITIAL_MAX_PROPOSERS: usize = 101;
