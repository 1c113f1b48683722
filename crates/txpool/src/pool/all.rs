//! The pool index: a concurrent map from transaction id to resolved object,
//! with per-account quotas, pending-cost accounting and hash-collision
//! detection. Single-writer via `parking_lot::Mutex`; readers get a stable
//! snapshot via `to_tx_objects` without holding the lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;

use crate::error::TxRejectedError;
use crate::tx::Tx;
use crate::tx_object::TxObject;

#[derive(Debug, Default)]
struct AccountEntry {
    ids: HashSet<B256>,
    /// Aggregated `pendingCost` across this payer's non-executable objects,
    /// the value handed to `payerCheck`.
    pending_cost: U256,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<B256, Arc<TxObject>>,
    hash_to_id: HashMap<B256, B256>,
    accounts: HashMap<Address, AccountEntry>,
}

/// Invariants upheld by `add`:
/// - no two objects share an id;
/// - `contains_hash(h)` is true iff some object has hash `h`;
/// - per account, at most `limit_per_account` objects exist;
/// - `payer_check(payer, totalNeeded)` gates admission.
#[derive(Debug, Default)]
pub struct TxObjectMap {
    inner: Mutex<Inner>,
}

impl TxObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `payer_check` receives the payer and its would-be total pending cost
    /// — the sum of every non-executable object already held by the payer,
    /// plus this one's own cost regardless of this one's own executable
    /// status — and may reject the insertion; the caller is expected to
    /// have already resolved the payer's current solvency before calling
    /// this (e.g. via [`crate::traits::StateProvider::energy_balance`]),
    /// since this map does no I/O. Only once the object is accepted does
    /// its cost join the stored aggregate, and only if it is itself
    /// non-executable: the aggregate tracks non-executable exposure only.
    pub fn add(
        &self,
        obj: TxObject,
        limit_per_account: usize,
        payer_check: impl FnOnce(Address, U256) -> Result<(), TxRejectedError>,
    ) -> Result<Arc<TxObject>, TxRejectedError> {
        let id = obj.tx.id();
        let hash = obj.tx.hash();
        let payer = obj.payer();
        let this_cost = obj.pending_cost();
        let this_executable = obj.executable();

        let mut inner = self.inner.lock();

        if inner.by_id.contains_key(&id) {
            // Idempotent re-insert: ingress treats this as a silent accept,
            // not as an error here.
            return Ok(Arc::clone(&inner.by_id[&id]));
        }

        let account = inner.accounts.entry(payer).or_default();
        if account.ids.len() >= limit_per_account {
            return Err(TxRejectedError::PoolFull);
        }

        let total_needed = account.pending_cost.saturating_add(this_cost);
        payer_check(payer, total_needed)?;

        let account = inner.accounts.entry(payer).or_default();
        account.ids.insert(id);
        if !this_executable {
            account.pending_cost = total_needed;
        }

        let obj = Arc::new(obj);
        inner.by_id.insert(id, Arc::clone(&obj));
        inner.hash_to_id.insert(hash, id);
        Ok(obj)
    }

    pub fn get_by_id(&self, id: B256) -> Option<Arc<TxObject>> {
        self.inner.lock().by_id.get(&id).cloned()
    }

    pub fn contains_hash(&self, hash: B256) -> bool {
        self.inner.lock().hash_to_id.contains_key(&hash)
    }

    pub fn remove_by_hash(&self, hash: B256) -> Option<Arc<TxObject>> {
        let mut inner = self.inner.lock();
        let id = inner.hash_to_id.remove(&hash)?;
        let obj = inner.by_id.remove(&id)?;
        if let Some(account) = inner.accounts.get_mut(&obj.payer()) {
            account.ids.remove(&id);
            if !obj.executable() {
                account.pending_cost = account.pending_cost.saturating_sub(obj.pending_cost());
            }
            if account.ids.is_empty() {
                inner.accounts.remove(&obj.payer());
            }
        }
        Some(obj)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_txs(&self) -> Vec<Tx> {
        self.inner.lock().by_id.values().map(|obj| obj.tx.clone()).collect()
    }

    /// A stable snapshot suitable for iteration without holding the lock.
    pub fn to_tx_objects(&self) -> Vec<Arc<TxObject>> {
        self.inner.lock().by_id.values().cloned().collect()
    }

    /// Moves `id`'s own contribution to its payer's pending-cost aggregate
    /// from `old_contribution` to `new_contribution`. The caller computes
    /// both relative to executable status: a currently-executable object
    /// contributes zero, so a transition into or out of executable moves
    /// the full cost in or out of the aggregate even when the cost itself
    /// is unchanged. Also updates the object's own stored cost to whatever
    /// `new_contribution` implies was just recomputed (a no-op if the cost
    /// didn't change, since the caller passes back the same value).
    pub fn update_pending_cost(&self, id: B256, old_contribution: U256, new_contribution: U256) {
        let mut inner = self.inner.lock();
        let Some(obj) = inner.by_id.get(&id).cloned() else { return };
        let payer = obj.payer();
        if let Some(account) = inner.accounts.get_mut(&payer) {
            account.pending_cost =
                account.pending_cost.saturating_sub(old_contribution).saturating_add(new_contribution);
        }
    }

    /// Bulk insert from a trusted source (e.g. state restore on startup),
    /// bypassing per-payer checks entirely. Still respects the
    /// non-executable-only aggregate: an already-executable object's cost
    /// is not added to its payer's pending-cost total.
    pub fn fill(&self, objs: Vec<TxObject>) {
        let mut inner = self.inner.lock();
        for obj in objs {
            let id = obj.tx.id();
            let hash = obj.tx.hash();
            let payer = obj.payer();
            let executable = obj.executable();
            let cost = obj.pending_cost();
            let obj = Arc::new(obj);
            inner.by_id.insert(id, obj);
            inner.hash_to_id.insert(hash, id);
            let account = inner.accounts.entry(payer).or_default();
            account.ids.insert(id);
            if !executable {
                account.pending_cost = account.pending_cost.saturating_add(cost);
            }
        }
    }
}
