//! External interfaces: the narrow contracts this crate expects from the
//! chain-storage and state-execution components it is not responsible for.
//! Expressed as `async_trait`s, with `#[auto_impl::auto_impl(Arc)]` so
//! `Arc<dyn ChainRepository>` is usable directly without a wrapper.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use auto_impl::auto_impl;
use fee_market::HeaderView;

/// Settlement state of a transaction a pending tx `dependsOn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyState {
    /// Included in a block already part of the canonical chain.
    Settled,
    /// Not yet included, but still a candidate (e.g. still pooled elsewhere).
    Pending,
    /// Included in a block that was later reverted/reorged away, or expired
    /// before it could settle.
    RevertedOrExpired,
}

/// Chain repository (consumer interface).
#[async_trait]
#[auto_impl(Arc, Box, &)]
pub trait ChainRepository: Send + Sync + std::fmt::Debug {
    /// The current canonical head's header summary.
    async fn best_block_summary(&self) -> HeaderView;

    /// Resolves a block number on the chain rooted at the current head to
    /// its id. Used to seed `ProvedWork`'s tie-breaker.
    async fn get_block_id(&self, number: u64) -> Option<B256>;

    /// The chain tag every admitted transaction must carry.
    fn chain_tag(&self) -> u8;

    /// Settlement state of a transaction this pool is tracking as a
    /// dependency of another (`tx.dependsOn`).
    async fn dependency_state(&self, tx_id: B256) -> DependencyState;
}

/// Read-only state accessors `executable` needs: a snapshot rooted at a
/// given state root.
#[async_trait]
#[auto_impl(Arc, Box, &)]
pub trait StateProvider: Send + Sync + std::fmt::Debug {
    async fn account_exists(&self, address: Address) -> bool;
    async fn balance(&self, address: Address) -> U256;
    /// Energy (gas-prepayment currency) balance projected to `at_timestamp`,
    /// so admission checks solvency at `head.timestamp + BLOCK_INTERVAL`
    /// rather than at the current instant.
    async fn energy_balance(&self, address: Address, at_timestamp: u64) -> U256;
    async fn storage(&self, address: Address, key: B256) -> B256;
    /// Iterates every occupied storage slot under `address`. Used to build
    /// snapshots/diffs of an account's full storage rather than probing one
    /// key at a time.
    async fn for_each_storage(&self, address: Address, f: &mut dyn FnMut(B256, B256) -> bool);
}

/// Yields a [`StateProvider`] rooted at a given state root.
#[async_trait]
#[auto_impl(Arc, Box, &)]
pub trait Stater: Send + Sync + std::fmt::Debug {
    async fn new_state(&self, state_root: B256) -> Arc<dyn StateProvider>;
}

/// Membership test against the blocklist cache. Kept as its own small seam
/// so ingress doesn't depend on the concrete poller in [`crate::blocklist`].
#[auto_impl(Arc, Box, &)]
pub trait BlocklistCheck: Send + Sync + std::fmt::Debug {
    fn contains(&self, address: Address) -> bool;
}
