//! Concurrent pending-transaction pool: resolution, admission, housekeeping,
//! blocklist cache and subscription fan-out.
//!
//! A resolved transaction object (`TxObject`), a concurrency-safe index
//! (`pool::all`), a background housekeeper (`pool::housekeeper`), and an
//! event fan-out (`pool::events`), wired together by `Pool`.

#![warn(missing_debug_implementations)]

mod basefee_cache;
mod blocklist;
mod config;
mod error;
pub mod metrics;
mod pool;
mod signer;
mod traits;
mod tx;
mod tx_object;

pub use basefee_cache::BaseFeeCache;
pub use blocklist::{BlocklistFetcher, FetchOutcome};
#[cfg(feature = "blocklist-http")]
pub use blocklist::ReqwestBlocklistFetcher;
pub use blocklist::Blocklist;
pub use config::PoolConfig;
pub use error::{BadTxError, PoolError, TxRejectedError};
pub use pool::housekeeper;
pub use pool::{Pool, Subscribers, TxEvent, TxObjectMap};
pub use signer::{RecoveryError, Secp256k1Recovery, Signature, SignatureRecovery};
pub use traits::{BlocklistCheck, ChainRepository, DependencyState, StateProvider, Stater};
pub use tx::{Clause, Tx, MAX_TX_SIZE};
pub use tx_object::{effective_priority_fee_per_gas, executable, proved_work, resolve, TxObject};
