//! Pool configuration: a plain `serde`-(de)serializable struct centralizing
//! the pool's admission knobs instead of scattering literals.

use std::path::PathBuf;
use std::time::Duration;

/// Tunable admission and retention limits for a [`crate::Pool`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Soft cap on total objects. Remote admission is rejected past
    /// `limit * 12 / 10`.
    pub limit: usize,
    /// Maximum resolved objects held per payer.
    pub limit_per_account: usize,
    /// Applies only to non-local transactions; locally submitted ones never
    /// age out on their own.
    pub max_lifetime: Duration,
    /// Optional on-disk cache of the blocklist, loaded at startup.
    pub blocklist_cache_file_path: Option<PathBuf>,
    /// Optional remote source polled for blocklist updates.
    pub blocklist_fetch_url: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            limit: 8_192,
            limit_per_account: 16,
            max_lifetime: Duration::from_secs(20 * 60),
            blocklist_cache_file_path: None,
            blocklist_fetch_url: None,
        }
    }
}

impl PoolConfig {
    /// `Limit * 12/10`: the hard ceiling enforced by `TxObjectMap`.
    pub fn hard_limit(&self) -> usize {
        self.limit * 12 / 10
    }

    /// `Limit * 2/10`: the reserve the non-executable subset may occupy.
    pub fn non_executable_reserve(&self) -> usize {
        self.limit * 2 / 10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.limit, 8_192);
        assert_eq!(cfg.limit_per_account, 16);
        assert_eq!(cfg.max_lifetime, Duration::from_secs(1_200));
    }

    #[test]
    fn hard_limit_and_reserve_match_documented_ratios() {
        let cfg = PoolConfig { limit: 100, ..PoolConfig::default() };
        assert_eq!(cfg.hard_limit(), 120);
        assert_eq!(cfg.non_executable_reserve(), 20);
    }
}
