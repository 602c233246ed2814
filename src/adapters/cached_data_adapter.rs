//! File-backed TTL cache in front of any [`DataPort`].
//!
//! One JSON file per instrument code under the cache directory. An entry is
//! served while it is younger than the TTL, was fetched for the same provider
//! symbol and covers the requested start date; otherwise the inner port is
//! queried and the entry rewritten. Cache
//! I/O problems are logged and treated as misses: the cache can slow a cycle
//! down but never fail it.

use crate::domain::error::SignalError;
use crate::domain::price_history::{PriceHistory, PricePoint};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    code: String,
    symbol: String,
    fetched_at: DateTime<Utc>,
    start_date: NaiveDate,
    points: Vec<PricePoint>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            // fetched_at in the future: clock moved backwards, treat as stale
            Err(_) => false,
        }
    }
}

pub struct CachedDataAdapter<P: DataPort> {
    inner: P,
    cache_dir: PathBuf,
    ttl: Duration,
}

impl<P: DataPort> CachedDataAdapter<P> {
    /// Default time-to-live (1 hour).
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    /// Creates the cache directory if it does not exist.
    pub fn new(inner: P, cache_dir: impl AsRef<Path>, ttl: Duration) -> Result<Self, SignalError> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir).map_err(|e| SignalError::Cache {
            reason: format!("failed to create {}: {}", cache_dir.display(), e),
        })?;
        Ok(Self {
            inner,
            cache_dir,
            ttl,
        })
    }

    /// Bytes outside `[A-Za-z0-9_-]` become `~XX` hex escapes, so distinct
    /// codes never share a file.
    fn entry_path(&self, code: &str) -> PathBuf {
        let mut name = String::with_capacity(code.len());
        for b in code.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
                name.push(b as char);
            } else {
                name.push_str(&format!("~{:02X}", b));
            }
        }
        self.cache_dir.join(format!("{}.json", name))
    }

    fn read_entry(&self, code: &str) -> Result<Option<CacheEntry>, SignalError> {
        let path = self.entry_path(code);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|e| SignalError::Cache {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let entry: CacheEntry = serde_json::from_str(&json).map_err(|e| SignalError::Cache {
            reason: format!("corrupt entry {}: {}", path.display(), e),
        })?;
        Ok(Some(entry))
    }

    fn write_entry(&self, entry: &CacheEntry) -> Result<(), SignalError> {
        let path = self.entry_path(&entry.code);
        let json = serde_json::to_string(entry).map_err(|e| SignalError::Cache {
            reason: format!("failed to serialize {}: {}", entry.code, e),
        })?;
        fs::write(&path, json).map_err(|e| SignalError::Cache {
            reason: format!("failed to write {}: {}", path.display(), e),
        })
    }
}

impl<P: DataPort> DataPort for CachedDataAdapter<P> {
    fn fetch_history(
        &self,
        code: &str,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<PriceHistory, SignalError> {
        match self.read_entry(code) {
            Ok(Some(entry))
                if entry.symbol == symbol
                    && entry.is_fresh(Utc::now(), self.ttl)
                    && entry.start_date <= start_date =>
            {
                tracing::debug!(%code, fetched_at = %entry.fetched_at, "cache hit");
                return PriceHistory::new(code, entry.points).map(|h| h.since(start_date));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(%code, "ignoring cache entry: {e}"),
        }

        let history = self.inner.fetch_history(code, symbol, start_date)?;

        let entry = CacheEntry {
            code: code.to_string(),
            symbol: symbol.to_string(),
            fetched_at: Utc::now(),
            start_date,
            points: history.points().to_vec(),
        };
        if let Err(e) = self.write_entry(&entry) {
            tracing::warn!(%code, "failed to cache history: {e}");
        }

        Ok(history)
    }
}
