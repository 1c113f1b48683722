//! Metric surface: total pool size, executable count, added, removed,
//! rejected, labeled by `type ∈ {Legacy, DynamicFee}` and
//! `source ∈ {local, remote, washed, n/a}`. A networked exporter is out of
//! scope; the instrumentation itself is ambient stack and carried
//! regardless, built on the `metrics` facade's counters/gauges.

use metrics::{counter, gauge};

use crate::tx::Tx;
use fee_market::FeeFields;

pub fn tx_type_label(tx: &Tx) -> &'static str {
    match tx.fee {
        FeeFields::Legacy { .. } => "Legacy",
        FeeFields::DynamicFee { .. } => "DynamicFee",
    }
}

pub fn record_added(source: &'static str, tx_type: &'static str) {
    counter!("txpool_added_total", "source" => source, "type" => tx_type).increment(1);
}

pub fn record_removed(source: &'static str, tx_type: &'static str) {
    counter!("txpool_removed_total", "source" => source, "type" => tx_type).increment(1);
}

pub fn record_rejected(tx_type: &'static str) {
    counter!("txpool_rejected_total", "type" => tx_type, "source" => "n/a").increment(1);
}

pub fn set_pool_size(total: usize) {
    gauge!("txpool_size").set(total as f64);
}

pub fn set_executable_count(count: usize) {
    gauge!("txpool_executable_count").set(count as f64);
}
