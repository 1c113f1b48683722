//! Blocklist cache: an optional on-disk seed plus an optional periodic HTTP
//! poll, feeding the [`BlocklistCheck`] seam that ingress and the
//! housekeeper both read.
//!
//! Cache format is deliberately plain: one lowercase-hex address per line,
//! blank lines and `#`-prefixed comments ignored. Both the on-disk file and
//! the fetched HTTP body use the same format.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::traits::BlocklistCheck;

/// Poll every 60-120 seconds, uniform jitter, so many nodes polling the
/// same source don't synchronize into a thundering herd.
const POLL_MIN_SECS: u64 = 60;
const POLL_MAX_SECS: u64 = 120;

#[derive(Debug, Default)]
struct Inner {
    addresses: HashSet<Address>,
    etag: Option<String>,
}

/// The blocklist's in-memory state. Cheap to query (`contains`), updated
/// from a background poller and/or a one-time startup load.
#[derive(Debug, Default)]
pub struct Blocklist {
    inner: RwLock<Inner>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the on-disk cache file, if it exists. A missing file or a
    /// parse failure is logged and treated as an empty set — the blocklist
    /// is a denylist, so starting empty fails open rather than closed.
    pub fn load_from_file(path: &Path) -> Self {
        let blocklist = Self::new();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                blocklist.inner.write().addresses = parse_addresses(&contents);
            }
            Err(err) => {
                debug!(target: "txpool::blocklist", %err, path = %path.display(), "no blocklist cache file to load");
            }
        }
        blocklist
    }

    fn persist(&self, path: &Path) {
        let body = {
            let inner = self.inner.read();
            let mut lines: Vec<String> = inner.addresses.iter().map(|a| a.to_string()).collect();
            lines.sort();
            lines.join("\n")
        };
        if let Err(err) = std::fs::write(path, body) {
            warn!(target: "txpool::blocklist", %err, path = %path.display(), "failed to persist blocklist cache file");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlocklistCheck for Blocklist {
    fn contains(&self, address: Address) -> bool {
        self.inner.read().addresses.contains(&address)
    }
}

fn parse_addresses(contents: &str) -> HashSet<Address> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.parse::<Address>().ok())
        .collect()
}

/// Outcome of one fetch attempt under conditional-GET semantics.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The source returned a 304/equivalent: no change since the last etag.
    NotModified,
    /// A fresh body, plus whatever etag it carries for the next request.
    Updated { body: String, etag: Option<String> },
}

/// Fetches the blocklist source, abstracted over the HTTP client so the
/// pool core has no hard dependency on one. A `reqwest`-based
/// implementation is provided behind the `blocklist-http` feature.
#[async_trait::async_trait]
pub trait BlocklistFetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, url: &str, etag: Option<&str>) -> eyre::Result<FetchOutcome>;
}

/// Spawns the periodic fetch task. Failures are logged and retried on the
/// next tick; they never propagate to the pool.
pub fn spawn(
    blocklist: Arc<Blocklist>,
    fetcher: Arc<dyn BlocklistFetcher>,
    fetch_url: String,
    cache_file: Option<PathBuf>,
    cancel: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let jitter_secs = rand::Rng::gen_range(&mut rand::thread_rng(), POLL_MIN_SECS..=POLL_MAX_SECS);
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(target: "txpool::blocklist", "cancellation observed, exiting");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_secs(jitter_secs)) => {}
            }

            if let Err(err) = poll_once(fetcher.as_ref(), &fetch_url, &blocklist, cache_file.as_deref()).await {
                warn!(target: "txpool::blocklist", %err, "blocklist poll failed, retrying next tick");
            }
        }
    })
}

async fn poll_once(
    fetcher: &dyn BlocklistFetcher,
    url: &str,
    blocklist: &Blocklist,
    cache_file: Option<&Path>,
) -> eyre::Result<()> {
    let etag = blocklist.inner.read().etag.clone();
    match fetcher.fetch(url, etag.as_deref()).await? {
        FetchOutcome::NotModified => {
            debug!(target: "txpool::blocklist", "blocklist unchanged");
            Ok(())
        }
        FetchOutcome::Updated { body, etag } => {
            let addresses = parse_addresses(&body);
            {
                let mut inner = blocklist.inner.write();
                inner.addresses = addresses;
                inner.etag = etag;
            }
            if let Some(path) = cache_file {
                blocklist.persist(path);
            }
            Ok(())
        }
    }
}

#[cfg(feature = "blocklist-http")]
#[derive(Debug, Default)]
pub struct ReqwestBlocklistFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "blocklist-http")]
#[async_trait::async_trait]
impl BlocklistFetcher for ReqwestBlocklistFetcher {
    async fn fetch(&self, url: &str, etag: Option<&str>) -> eyre::Result<FetchOutcome> {
        let mut request = self.client.get(url);
        if let Some(etag) = etag {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !response.status().is_success() {
            eyre::bail!("unexpected status {}", response.status());
        }

        let etag =
            response.headers().get(reqwest::header::ETAG).and_then(|v| v.to_str().ok()).map(String::from);
        let body = response.text().await?;
        Ok(FetchOutcome::Updated { body, etag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::with_last_byte(byte)
    }

    #[test]
    fn parses_ignoring_blanks_and_comments() {
        let text = format!("# seed list\n{}\n\n{}\n", addr(1), addr(2));
        let parsed = parse_addresses(&text);
        assert_eq!(parsed.len(), 2);
        assert!(parsed.contains(&addr(1)));
        assert!(parsed.contains(&addr(2)));
    }

    #[test]
    fn load_from_missing_file_is_empty_not_an_error() {
        let blocklist = Blocklist::load_from_file(Path::new("/nonexistent/path/blocklist.txt"));
        assert!(blocklist.is_empty());
    }

    #[test]
    fn persist_then_load_roundtrips() {
        let path = std::env::temp_dir().join(format!("txpool_blocklist_test_{:x}.txt", addr(9)));
        let blocklist = Blocklist::new();
        blocklist.inner.write().addresses.insert(addr(9));
        blocklist.inner.write().addresses.insert(addr(10));
        blocklist.persist(&path);

        let reloaded = Blocklist::load_from_file(&path);
        assert!(reloaded.contains(addr(9)));
        assert!(reloaded.contains(addr(10)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn contains_reflects_in_memory_set() {
        let blocklist = Blocklist::new();
        assert!(!blocklist.contains(addr(5)));
        blocklist.inner.write().addresses.insert(addr(5));
        assert!(blocklist.contains(addr(5)));
    }

    #[derive(Debug)]
    struct FakeFetcher {
        body: String,
        etag: Option<String>,
    }

    #[async_trait::async_trait]
    impl BlocklistFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str, etag: Option<&str>) -> eyre::Result<FetchOutcome> {
            if etag.is_some() && etag == self.etag.as_deref() {
                return Ok(FetchOutcome::NotModified);
            }
            Ok(FetchOutcome::Updated { body: self.body.clone(), etag: self.etag.clone() })
        }
    }

    #[tokio::test]
    async fn poll_once_updates_addresses_from_fetcher() {
        let blocklist = Blocklist::new();
        let fetcher = FakeFetcher { body: addr(3).to_string(), etag: Some("v1".into()) };
        poll_once(&fetcher, "http://example.invalid", &blocklist, None).await.unwrap();
        assert!(blocklist.contains(addr(3)));
        assert_eq!(blocklist.inner.read().etag.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn poll_once_leaves_set_untouched_on_not_modified() {
        let blocklist = Blocklist::new();
        blocklist.inner.write().addresses.insert(addr(4));
        blocklist.inner.write().etag = Some("v1".into());
        let fetcher = FakeFetcher { body: String::new(), etag: Some("v1".into()) };
        poll_once(&fetcher, "http://example.invalid", &blocklist, None).await.unwrap();
        assert!(blocklist.contains(addr(4)));
    }
}
