//! Authority round-robin proposer scheduling.

use std::collections::HashSet;

use blake2::{Blake2b512, Digest};
use tracing::instrument;
use txpool_primitives::Address;

use crate::{error::SchedulerError, params::INITIAL_MAX_PROPOSERS, proposer::Proposer};

/// `dprp(parentBlockNumber, t) = BigEndian64(Blake2b(BigEndian32(parentBlockNumber) || BigEndian64(t)))`.
fn dprp(parent_block_number: u64, t: u64) -> u64 {
    let mut hasher = Blake2b512::new();
    hasher.update((parent_block_number as u32).to_be_bytes());
    hasher.update(t.to_be_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes(digest[..8].try_into().expect("blake2b-512 digest is >= 8 bytes"))
}

/// The outcome of evaluating [`Scheduler::updates`] for a prospective block
/// time: which proposers missed their slot since the parent block (and
/// should be deactivated), whether the scheduling proposer itself is being
/// reactivated, and the resulting authority-set score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updates {
    /// Distinct proposers (other than the scheduling proposer) whose slot
    /// was skipped between the parent block and `t`.
    pub to_deactivate: Vec<Address>,
    /// Set if the scheduling proposer was inactive in the authorized set and
    /// is being brought back by minting this block.
    pub reactivated: Option<Address>,
    /// `|actives| - |to_deactivate|`.
    pub score: u64,
}

/// Decides, for a single proposer `P` and a single block-proposal decision,
/// when `P` may next mint a block and what authority-set changes minting at
/// a given time implies. Scoped to one decision; build a new `Scheduler` per
/// parent block.
#[derive(Debug, Clone)]
pub struct Scheduler {
    self_address: Address,
    proposers: Vec<Proposer>,
    actives: Vec<Address>,
    parent_block_number: u64,
    parent_block_time: u64,
    block_interval: u64,
}

impl Scheduler {
    /// Builds a scheduler for `self_address` against the authorized set `s`
    /// and the given parent block. Fails if `self_address` is not a member
    /// of `s` at all (active or not).
    pub fn new(
        self_address: Address,
        proposers: Vec<Proposer>,
        parent_block_number: u64,
        parent_block_time: u64,
        block_interval: u64,
    ) -> Result<Self, SchedulerError> {
        if !proposers.iter().any(|p| p.address == self_address) {
            return Err(SchedulerError::ErrUnauthorizedProposer);
        }

        let actives = proposers
            .iter()
            .filter(|p| p.active || p.address == self_address)
            .map(|p| p.address)
            .collect();

        Ok(Self { self_address, proposers, actives, parent_block_number, parent_block_time, block_interval })
    }

    /// The ordered subset of the authorized set currently in play: active
    /// proposers, plus the scheduling proposer itself regardless of its
    /// recorded activity.
    pub fn actives(&self) -> &[Address] {
        &self.actives
    }

    fn whose_turn(&self, t: u64) -> Address {
        let idx = (dprp(self.parent_block_number, t) as usize) % self.actives.len();
        self.actives[idx]
    }

    /// Finds the next block time `>= now` and `> parentBlockTime`, aligned
    /// on `block_interval` above `parentBlockTime`, at which `self_address`
    /// owns the slot.
    #[instrument(level = "trace", skip(self))]
    pub fn schedule(&self, now: u64) -> u64 {
        let mut k = if now <= self.parent_block_time {
            1
        } else {
            let diff = now - self.parent_block_time;
            diff.div_ceil(self.block_interval)
        }
        .max(1);

        loop {
            let t = self.parent_block_time + k * self.block_interval;
            if self.whose_turn(t) == self.self_address {
                return t;
            }
            k += 1;
        }
    }

    /// True iff `t` is a valid slot (aligned, past the parent) and
    /// `self_address` owns it.
    pub fn is_the_time(&self, t: u64) -> bool {
        t > self.parent_block_time
            && (t - self.parent_block_time) % self.block_interval == 0
            && self.whose_turn(t) == self.self_address
    }

    /// Walks backward from `t - block_interval` in `block_interval` steps,
    /// for up to [`INITIAL_MAX_PROPOSERS`] iterations while still above
    /// `parentBlockTime`, collecting every distinct proposer whose slot was
    /// skipped. Also reports whether `self_address` is being reactivated.
    #[instrument(level = "trace", skip(self))]
    pub fn updates(&self, t: u64) -> Updates {
        let mut to_deactivate = Vec::new();
        let mut seen = HashSet::new();
        let mut time = t.saturating_sub(self.block_interval);

        for _ in 0..INITIAL_MAX_PROPOSERS {
            if time <= self.parent_block_time {
                break;
            }
            let owner = self.whose_turn(time);
            if owner != self.self_address && seen.insert(owner) {
                to_deactivate.push(owner);
            }
            time = time.saturating_sub(self.block_interval);
        }

        let reactivated = self
            .proposers
            .iter()
            .find(|p| p.address == self.self_address && !p.active)
            .map(|p| p.address);

        let score = (self.actives.len() as u64).saturating_sub(to_deactivate.len() as u64);

        Updates { to_deactivate, reactivated, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::with_last_byte(n)
    }

    fn all_active(n: u8) -> Vec<Proposer> {
        (1..=n).map(|i| Proposer::new(addr(i), true)).collect()
    }

    #[test]
    fn unauthorized_proposer_fails_construction() {
        let proposers = all_active(3);
        let err = Scheduler::new(addr(99), proposers, 1, 1000, 10).unwrap_err();
        assert_eq!(err, SchedulerError::ErrUnauthorizedProposer);
    }

    /// Exactly one proposer owns any given valid slot, and `schedule`
    /// returns the first slot that proposer owns.
    #[test]
    fn exactly_one_owner_per_slot_and_schedule_finds_it() {
        let proposers = all_active(5);
        for i in 1..=5u8 {
            let scheduler = Scheduler::new(addr(i), proposers.clone(), 1, 1000, 10).unwrap();
            let scheduled = scheduler.schedule(0);
            assert!(scheduled > 1000);
            assert_eq!((scheduled - 1000) % 10, 0);
            assert!(scheduler.is_the_time(scheduled));

            // Exactly one proposer owns this slot.
            let owners: Vec<_> = (1..=5u8)
                .filter(|&j| {
                    let s = Scheduler::new(addr(j), proposers.clone(), 1, 1000, 10).unwrap();
                    s.is_the_time(scheduled)
                })
                .collect();
            assert_eq!(owners.len(), 1);
        }
    }

    #[test]
    fn schedule_respects_now_floor() {
        let proposers = all_active(5);
        for i in 1..=5u8 {
            let scheduler = Scheduler::new(addr(i), proposers.clone(), 1, 1000, 10).unwrap();
            let scheduled = scheduler.schedule(5_000);
            assert!(scheduled >= 5_000);
            assert!(scheduler.is_the_time(scheduled));
        }
    }

    #[test]
    fn is_the_time_rejects_misaligned_or_past_slots() {
        let scheduler = Scheduler::new(addr(1), all_active(1), 1, 1000, 10).unwrap();
        assert!(!scheduler.is_the_time(1000));
        assert!(!scheduler.is_the_time(1005));
    }

    #[test]
    fn score_accounts_for_skipped_proposers() {
        let proposers = all_active(5);
        let scheduler = Scheduler::new(addr(1), proposers, 1, 1000, 10).unwrap();
        let t = scheduler.schedule(0).max(1050);
        let updates = scheduler.updates(if scheduler.is_the_time(t) { t } else { scheduler.schedule(t) });
        assert_eq!(updates.score, 5 - updates.to_deactivate.len() as u64);
    }

    #[test]
    fn inactive_self_is_reported_as_reactivated() {
        let mut proposers = all_active(3);
        proposers[0].active = false;
        let scheduler = Scheduler::new(addr(1), proposers, 1, 1000, 10).unwrap();
        let t = scheduler.schedule(0);
        let updates = scheduler.updates(t);
        assert_eq!(updates.reactivated, Some(addr(1)));
    }

    #[test]
    fn dprp_is_deterministic() {
        assert_eq!(dprp(1, 1010), dprp(1, 1010));
    }
}
