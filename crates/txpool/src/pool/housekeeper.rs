//! The housekeeper: a 1 Hz background task that classifies, evicts, sorts,
//! publishes and broadcasts. Spawned as its own `tokio::task`, cancelled by
//! a shared `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use fee_market::{Header, HeaderView};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use super::{Pool, TxEvent};
use crate::tx_object::{effective_priority_fee_per_gas, executable, proved_work, TxObject};

const TICK: Duration = Duration::from_secs(1);
/// Wash when the pool is small but has grown since the last wash.
const SMALL_POOL_THRESHOLD: usize = 200;
const UNSYNCED_THRESHOLD_INTERVALS: u64 = 6;

/// Spawns the housekeeper loop, returning the task handle `Pool::close`
/// should `.await`.
pub fn spawn(pool: Arc<Pool>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TICK);
        let mut cached_head: Option<HeaderView> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(target: "txpool::housekeeper", "cancellation observed, exiting");
                    pool.mark_closed();
                    return;
                }
                _ = ticker.tick() => {
                    tick(&pool, &mut cached_head).await;
                }
            }
        }
    })
}

#[instrument(level = "debug", skip_all)]
async fn tick(pool: &Pool, cached_head: &mut Option<HeaderView>) {
    let head = pool.chain().best_block_summary().await;

    let head_changed = cached_head.as_ref().map(|h| h.id() != head.id()).unwrap_or(true);
    let base_fee_changed = cached_head.as_ref().map(|h| h.base_fee() != head.base_fee()).unwrap_or(true);
    *cached_head = Some(head);
    let head = cached_head.as_ref().expect("just set");

    let now = now_unix_seconds();
    if now.abs_diff(head.timestamp()) >= UNSYNCED_THRESHOLD_INTERVALS * pool.block_interval() {
        debug!(target: "txpool::housekeeper", "chain unsynced, skipping wash");
        return;
    }

    let added_after_wash = pool.take_added_after_wash();
    let should_wash =
        head_changed || pool.len() > pool.config().limit || (pool.len() < SMALL_POOL_THRESHOLD && added_after_wash > 0);

    if !should_wash {
        return;
    }

    if let Err(err) = wash(pool, head, base_fee_changed).await {
        error!(target: "txpool::housekeeper", %err, "wash failed, falling back to a forced size cut");
        forced_cut(pool);
    }
}

fn now_unix_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Sorts by `priorityGasPrice` descending, stably by `timeAdded` ascending.
fn sort_by_priority(objs: &mut [Arc<TxObject>]) {
    objs.sort_by(|a, b| b.priority_gas_price().cmp(&a.priority_gas_price()).then(a.time_added.cmp(&b.time_added)));
}

#[instrument(level = "debug", skip(pool, head))]
async fn wash(pool: &Pool, head: &HeaderView, base_fee_changed: bool) -> eyre::Result<()> {
    let snapshot = pool.all().to_tx_objects();
    let fork = pool.fork();
    let chain = pool.chain();
    let state = pool.stater().new_state(head.state_root()).await;

    let mut to_remove: Vec<Arc<TxObject>> = Vec::new();
    let mut executable_remote: Vec<Arc<TxObject>> = Vec::new();
    let mut executable_local: Vec<Arc<TxObject>> = Vec::new();
    let mut non_executable_remote: Vec<Arc<TxObject>> = Vec::new();
    let mut newly_executable = std::collections::HashSet::new();
    // (object, was-executable-before-this-tick) — kept so the pending-cost
    // pass below can tell whether an object's aggregate contribution needs
    // to move, independent of whether the base fee itself moved.
    let mut transitions: Vec<(Arc<TxObject>, bool)> = Vec::new();

    for obj in snapshot {
        if pool.blocklist().contains(obj.origin) || obj.delegator.is_some_and(|d| pool.blocklist().contains(d)) {
            to_remove.push(obj);
            continue;
        }

        if !obj.local_submitted {
            let age_ns = now_unix_seconds().saturating_mul(1_000_000_000).saturating_sub(obj.time_added);
            if Duration::from_nanos(age_ns) > pool.config().max_lifetime {
                to_remove.push(obj);
                continue;
            }
        }

        match executable(&obj, chain, state.as_ref(), head, fork).await {
            Err(_) => {
                to_remove.push(obj);
            }
            Ok(is_exec) => {
                let was_executable = obj.executable();
                if is_exec && !was_executable {
                    newly_executable.insert(obj.tx.id());
                }
                obj.set_executable(is_exec);
                transitions.push((Arc::clone(&obj), was_executable));
                match (is_exec, obj.local_submitted) {
                    (true, false) => executable_remote.push(obj),
                    (true, true) => executable_local.push(obj),
                    (false, _) => non_executable_remote.push(obj),
                }
            }
        }
    }

    if base_fee_changed {
        if let Some(base_fee) = head.base_fee() {
            let past_id = chain.get_block_id(head.number()).await.unwrap_or_else(|| head.id());
            for obj in
                executable_remote.iter().chain(executable_local.iter()).chain(non_executable_remote.iter())
            {
                let pw = proved_work(&obj.tx, past_id);
                let tip = effective_priority_fee_per_gas(&obj.tx.fee, fork.legacy_base_gas_price, base_fee, pw);
                obj.set_priority_gas_price(tip);
            }
        }
    }

    // The per-payer pending-cost aggregate only sums costs of currently
    // non-executable objects. Refresh an object's contribution whenever its
    // own cost may have changed (the base fee moved) or its executable
    // status flipped (which changes whether it counts toward the aggregate
    // at all), even absent a base-fee move (e.g. a dependency just settled).
    let base_fee_for_cost = head.base_fee().unwrap_or(fork.initial_base_fee);
    for (obj, was_executable) in &transitions {
        let is_exec = obj.executable();
        if !base_fee_changed && was_executable == &is_exec {
            continue;
        }

        let old_cost = obj.pending_cost();
        let new_cost =
            if base_fee_changed { super::own_pending_cost(&obj.tx, base_fee_for_cost, fork) } else { old_cost };

        let old_contribution = if *was_executable { U256::ZERO } else { old_cost };
        let new_contribution = if is_exec { U256::ZERO } else { new_cost };
        if old_contribution != new_contribution {
            pool.all().update_pending_cost(obj.tx.id(), old_contribution, new_contribution);
        }
        obj.set_pending_cost(new_cost);
    }

    sort_by_priority(&mut executable_remote);
    sort_by_priority(&mut non_executable_remote);

    let limit = pool.config().limit;
    let reserve = pool.config().non_executable_reserve();

    if executable_remote.len() > limit {
        to_remove.extend(non_executable_remote.drain(..));
        to_remove.extend(executable_remote.split_off(limit));
    } else if executable_remote.len() + non_executable_remote.len() > limit {
        let keep = limit - executable_remote.len();
        if non_executable_remote.len() > keep {
            to_remove.extend(non_executable_remote.split_off(keep));
        }
    } else if non_executable_remote.len() > reserve {
        to_remove.extend(non_executable_remote.split_off(reserve));
    }

    for obj in &to_remove {
        pool.all().remove_by_hash(obj.tx.hash());
        crate::metrics::record_removed("washed", crate::metrics::tx_type_label(&obj.tx));
    }

    let mut executables_all = executable_remote;
    executables_all.extend(executable_local);
    sort_by_priority(&mut executables_all);

    for obj in &executables_all {
        if newly_executable.contains(&obj.tx.id()) || obj.local_submitted {
            pool.broadcast(TxEvent { tx: Arc::clone(obj), executable: true });
        }
    }

    crate::metrics::set_pool_size(pool.len());
    crate::metrics::set_executable_count(executables_all.len());
    pool.publish_executables(executables_all);

    Ok(())
}

/// Fallback when `wash` itself errors: keep the last `Limit` objects in the
/// snapshot's insertion order, drop the rest, and skip publishing a new
/// executables view.
fn forced_cut(pool: &Pool) {
    let snapshot = pool.all().to_tx_objects();
    let limit = pool.config().limit;
    if snapshot.len() <= limit {
        return;
    }
    warn!(target: "txpool::housekeeper", kept = limit, dropped = snapshot.len() - limit, "forced cut applied");
    for obj in snapshot.into_iter().take(snapshot.len().saturating_sub(limit)) {
        pool.all().remove_by_hash(obj.tx.hash());
    }
}
