//! The pool itself: ingress validation wired to the index, the housekeeper
//! and the subscription fan-out. A thin façade over the background tasks
//! it owns.

pub mod all;
pub mod events;
pub mod housekeeper;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::B256;
use arc_swap::ArcSwap;
use fee_market::{ForkConfig, Header};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::config::PoolConfig;
use crate::error::{BadTxError, PoolError, TxRejectedError};
use crate::traits::{BlocklistCheck, ChainRepository, Stater};
use crate::tx::Tx;
use crate::tx_object::{executable, resolve, TxObject};
use crate::SignatureRecovery;

pub use all::TxObjectMap;
pub use events::{Subscribers, TxEvent};

/// Past this many block intervals since the observed head, the chain is
/// treated as unsynced and washing/executability checks are skipped
/// entirely.
const UNSYNCED_THRESHOLD_INTERVALS: u64 = 6;

fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// This transaction's own contribution to its payer's pending-cost
/// aggregate: the value moved by every clause plus the gas it could burn
/// at the current overall gas price. `TxObjectMap` sums this across a
/// payer's held non-executable objects; EVM execution cost beyond gas
/// (e.g. a clause reverting partway through) is not modeled.
fn own_pending_cost(tx: &Tx, base_fee: alloy_primitives::U256, fork: &ForkConfig) -> alloy_primitives::U256 {
    let value: alloy_primitives::U256 = tx.clauses.iter().map(|c| c.value).fold(alloy_primitives::U256::ZERO, |a, b| a.saturating_add(b));
    let gas_cost = alloy_primitives::U256::from(tx.gas)
        .saturating_mul(fee_market::overall_gas_price(&tx.fee, fork.legacy_base_gas_price, base_fee));
    value.saturating_add(gas_cost)
}

/// The pending-transaction pool. Cheap to clone (an `Arc` inside), meant to
/// be passed around by value to every task that needs ingress or read
/// access.
#[derive(Debug)]
pub struct Pool {
    config: PoolConfig,
    fork: ForkConfig,
    block_interval: u64,
    chain: Arc<dyn ChainRepository>,
    stater: Arc<dyn Stater>,
    signer: Arc<dyn SignatureRecovery>,
    blocklist: Arc<dyn BlocklistCheck>,
    all: TxObjectMap,
    executables: ArcSwap<Vec<Arc<TxObject>>>,
    subscribers: Subscribers,
    added_after_wash: AtomicUsize,
    closed: AtomicBool,
    cancel: CancellationToken,
    background: SyncMutex<Vec<JoinHandle<()>>>,
}

impl Pool {
    pub fn new(
        config: PoolConfig,
        fork: ForkConfig,
        chain: Arc<dyn ChainRepository>,
        stater: Arc<dyn Stater>,
        signer: Arc<dyn SignatureRecovery>,
        blocklist: Arc<dyn BlocklistCheck>,
    ) -> Self {
        Self {
            config,
            fork,
            block_interval: poa_scheduler::DEFAULT_BLOCK_INTERVAL,
            chain,
            stater,
            signer,
            blocklist,
            all: TxObjectMap::new(),
            executables: ArcSwap::from_pointee(Vec::new()),
            subscribers: Subscribers::new(),
            added_after_wash: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            background: SyncMutex::new(Vec::new()),
        }
    }

    /// Spawns the housekeeper as a background task tied to this pool's
    /// shared cancellation token. Call once after wrapping the pool in an
    /// `Arc`; the blocklist poller is started the same way once configured.
    pub fn start(self: &Arc<Self>) {
        let handle = housekeeper::spawn(Arc::clone(self), self.cancel.clone());
        self.background.lock().push(handle);
    }

    /// Spawns the blocklist poller under this pool's shared cancellation
    /// token, so `close()` also waits for it. Only meaningful
    /// when this pool's `blocklist` was built from the same `Arc<Blocklist>`
    /// passed here; tests wiring a fake `BlocklistCheck` have no poller to
    /// spawn.
    #[cfg(feature = "blocklist-http")]
    pub fn spawn_blocklist_poller(self: &Arc<Self>, blocklist: Arc<crate::Blocklist>, fetch_url: String) {
        let cache_file = self.config.blocklist_cache_file_path.clone();
        let fetcher: Arc<dyn crate::blocklist::BlocklistFetcher> =
            Arc::new(crate::blocklist::ReqwestBlocklistFetcher::default());
        let handle = crate::blocklist::spawn(blocklist, fetcher, fetch_url, cache_file, self.cancel.clone());
        self.background.lock().push(handle);
    }

    /// Signals cancellation, waits for every background task to exit, and
    /// closes all subscription channels. Blocks until every spawned task
    /// has returned.
    pub async fn close(&self) {
        self.mark_closed();
        self.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = self.background.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn contains_hash(&self, hash: B256) -> bool {
        self.all.contains_hash(hash)
    }

    /// The published, sorted executable view.
    pub fn executables(&self) -> Arc<Vec<Arc<TxObject>>> {
        self.executables.load_full()
    }

    pub fn subscribe_tx_event(&self) -> mpsc::Receiver<TxEvent> {
        self.subscribers.subscribe()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Signals shutdown so subsequent ingress calls fail fast.
    /// Background-task joining and channel closure are driven by
    /// whatever owns this `Pool`'s `CancellationToken` (`housekeeper`),
    /// since those handles aren't owned here.
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
        self.subscribers.close_all();
    }

    /// Remote ingress.
    #[instrument(level = "debug", skip(self, tx), fields(hash = %tx.hash()))]
    pub async fn add(&self, tx: Tx) -> Result<(), PoolError> {
        self.ingress(tx, false, false).await
    }

    /// Like [`Pool::add`], but bypasses the remote pool-size cap and is
    /// retained through washes regardless of the executable limit.
    #[instrument(level = "debug", skip(self, tx), fields(hash = %tx.hash()))]
    pub async fn add_local(&self, tx: Tx) -> Result<(), PoolError> {
        self.ingress(tx, true, false).await
    }

    /// Like [`Pool::add`], but rejects a not-yet-executable transaction
    /// instead of pooling it non-executable.
    #[instrument(level = "debug", skip(self, tx), fields(hash = %tx.hash()))]
    pub async fn strictly_add(&self, tx: Tx) -> Result<(), PoolError> {
        self.ingress(tx, false, true).await
    }

    async fn ingress(&self, tx: Tx, local_submitted: bool, strict: bool) -> Result<(), PoolError> {
        if self.is_closed() {
            return Err(TxRejectedError::PoolFull.into());
        }

        // Idempotent re-insert of an already-known hash.
        if self.all.contains_hash(tx.hash()) {
            return Ok(());
        }

        // Chain tag and size are checked before signature recovery: the
        // cheapest rejections first.
        let tx_type = crate::metrics::tx_type_label(&tx);

        let expected_tag = self.chain.chain_tag();
        if tx.chain_tag != expected_tag {
            crate::metrics::record_rejected(tx_type);
            return Err(BadTxError::ChainTagMismatch { expected: expected_tag, got: tx.chain_tag }.into());
        }

        let size = tx.size();
        if size > crate::tx::MAX_TX_SIZE {
            crate::metrics::record_rejected(tx_type);
            return Err(TxRejectedError::SizeTooLarge { size, max: crate::tx::MAX_TX_SIZE }.into());
        }

        // Resolve — only after the cheap checks pass does this pay for
        // ECDSA recovery.
        let obj = resolve(tx, local_submitted, self.signer.as_ref())
            .inspect_err(|_| crate::metrics::record_rejected(tx_type))?;

        // Applied here since `origin`/`delegator` are only known
        // post-resolution: blocked senders are dropped silently, denying
        // them any signal about why.
        if self.blocklist.contains(obj.origin) || obj.delegator.is_some_and(|d| self.blocklist.contains(d)) {
            return Ok(());
        }

        let head = self.chain.best_block_summary().await;
        let synced = now_unix_seconds().abs_diff(head.timestamp()) < UNSYNCED_THRESHOLD_INTERVALS * self.block_interval;

        if !synced {
            // Unsynced: size-bounded admission only.
            if self.all.len() >= self.config.limit {
                crate::metrics::record_rejected(tx_type);
                return Err(TxRejectedError::PoolFull.into());
            }
            self.finish_admission(obj, false).await;
            return Ok(());
        }

        if !local_submitted && self.all.len() >= self.config.hard_limit() {
            crate::metrics::record_rejected(tx_type);
            return Err(TxRejectedError::PoolFull.into());
        }

        let state = self.stater.new_state(head.state_root()).await;
        let is_executable = match executable(&obj, self.chain.as_ref(), state.as_ref(), &head, &self.fork).await {
            Ok(is_executable) => is_executable,
            Err(err) => {
                crate::metrics::record_rejected(tx_type);
                // A failed executability check is a retryable pool-policy
                // rejection, not a permanent `BadTxError`: the same
                // transaction may become executable once the chain
                // advances (the base fee moves, a dependency settles).
                let rejected = match err {
                    BadTxError::Fee(fee_err) => TxRejectedError::Fee(fee_err),
                    other => TxRejectedError::Unexecutable(other),
                };
                return Err(rejected.into());
            }
        };

        if strict && !is_executable {
            crate::metrics::record_rejected(tx_type);
            return Err(TxRejectedError::NotExecutable.into());
        }

        if !is_executable {
            let non_executable_count = self.all.len().saturating_sub(self.executables().len());
            if non_executable_count >= self.config.non_executable_reserve() {
                crate::metrics::record_rejected(tx_type);
                return Err(TxRejectedError::NonExecutablePoolFull.into());
            }
        }

        let payer = obj.payer();
        let at_timestamp = head.timestamp() + self.block_interval;
        let available = state.energy_balance(payer, at_timestamp).await;
        let base_fee = head.base_fee().unwrap_or(self.fork.initial_base_fee);
        obj.set_pending_cost(own_pending_cost(&obj.tx, base_fee, &self.fork));
        obj.set_executable(is_executable);

        let obj = self
            .all
            .add(obj, self.config.limit_per_account, |_payer, total_needed| {
                if total_needed > available {
                    Err(TxRejectedError::PayerInsufficientEnergy { needed: total_needed, available })
                } else {
                    Ok(())
                }
            })
            .inspect_err(|_| crate::metrics::record_rejected(tx_type))
            .map_err(PoolError::from)?;

        self.added_after_wash.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_added(if local_submitted { "local" } else { "remote" }, tx_type);
        self.subscribers.broadcast(TxEvent { tx: obj, executable: is_executable });

        Ok(())
    }

    async fn finish_admission(&self, obj: TxObject, is_executable: bool) {
        let tx_type = crate::metrics::tx_type_label(&obj.tx);
        let local = obj.local_submitted;
        obj.set_executable(is_executable);
        match self.all.add(obj, self.config.limit_per_account, |_, _| Ok(())) {
            Ok(obj) => {
                self.added_after_wash.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_added(if local { "local" } else { "remote" }, tx_type);
                self.subscribers.broadcast(TxEvent { tx: obj, executable: is_executable });
            }
            Err(err) => warn!(target: "txpool", %err, "unsynced admission unexpectedly rejected"),
        }
    }

    /// Swaps in the housekeeper's freshly-sorted executable view.
    pub(crate) fn publish_executables(&self, objs: Vec<Arc<TxObject>>) {
        self.executables.store(Arc::new(objs));
    }

    pub(crate) fn take_added_after_wash(&self) -> usize {
        self.added_after_wash.swap(0, Ordering::AcqRel)
    }

    pub(crate) fn all(&self) -> &TxObjectMap {
        &self.all
    }

    pub(crate) fn chain(&self) -> &dyn ChainRepository {
        self.chain.as_ref()
    }

    pub(crate) fn config_ref(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) fn fork(&self) -> &ForkConfig {
        &self.fork
    }

    pub(crate) fn stater(&self) -> &dyn Stater {
        self.stater.as_ref()
    }

    pub(crate) fn blocklist(&self) -> &dyn BlocklistCheck {
        self.blocklist.as_ref()
    }

    pub(crate) fn block_interval(&self) -> u64 {
        self.block_interval
    }

    pub(crate) fn broadcast(&self, event: TxEvent) {
        self.subscribers.broadcast(event);
    }
}
