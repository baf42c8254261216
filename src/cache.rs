use crate::feed::normalize::normalize_records;
use crate::feed::types::{RawRecord, VehiclePosition};
use crate::feed::{FeedSource, FetchError};
use crate::filter::VehicleFilter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Maximum snapshot age before a query pulls the upstream feed again.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no vehicle snapshot available: {0}")]
    NoData(Arc<FetchError>),
}

#[derive(Debug)]
pub struct Snapshot {
    pub vehicles: Vec<VehiclePosition>,
    pub fetched_at: DateTime<Utc>,
    refreshed_at: Instant,
}

impl Snapshot {
    fn from_records(
        records: &[RawRecord],
        refreshed_at: Instant,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicles: normalize_records(records),
            fetched_at,
            refreshed_at,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.refreshed_at) <= SNAPSHOT_TTL
    }

    pub fn line_ids(&self) -> Vec<String> {
        self.vehicles
            .iter()
            .filter_map(|v| v.line.as_deref())
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Newest report time in the snapshot, 0 when nothing is dated.
    pub fn latest_report(&self) -> i64 {
        self.vehicles.iter().map(|v| v.timestamp).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineListing {
    pub lines: Vec<String>,
    /// Pass back as `since` to only get newer reports.
    pub since: i64,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStatus {
    pub fetched_at: DateTime<Utc>,
    pub vehicles: usize,
}

/// Request-driven cache over the upstream feed.
///
/// Readers clone the current `Arc<Snapshot>` and drop the lock before
/// filtering, so a swap never tears a read. Refreshes are serialized by
/// `refresh_gate`: queries that queue behind an in-flight refresh reuse its
/// outcome instead of fetching again. On a failed refresh the previous
/// snapshot keeps being served.
pub struct SnapshotCache {
    source: Arc<dyn FeedSource>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    /// Holds the error of the latest attempt if it failed.
    refresh_gate: Mutex<Option<Arc<FetchError>>>,
    /// Completed refresh attempts; only written while `refresh_gate` is held.
    attempts: AtomicU64,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub async fn query(
        &self,
        filter: &VehicleFilter,
    ) -> Result<Vec<VehiclePosition>, QueryError> {
        let snapshot = self.current().await?;
        Ok(filter.apply(&snapshot.vehicles))
    }

    pub async fn lines(&self) -> Result<LineListing, QueryError> {
        let snapshot = self.current().await?;
        Ok(LineListing {
            lines: snapshot.line_ids(),
            since: snapshot.latest_report(),
            fetched_at: snapshot.fetched_at,
        })
    }

    /// Describes the snapshot currently held, without refreshing.
    pub async fn status(&self) -> Option<SnapshotStatus> {
        self.snapshot.read().await.as_ref().map(|s| SnapshotStatus {
            fetched_at: s.fetched_at,
            vehicles: s.vehicles.len(),
        })
    }

    async fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        let guard = self.snapshot.read().await;
        guard.as_ref().filter(|s| s.is_fresh(Instant::now())).cloned()
    }

    async fn current(&self) -> Result<Arc<Snapshot>, QueryError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            tracing::debug!(vehicles = snapshot.vehicles.len(), "Serving cached snapshot");
            return Ok(snapshot);
        }

        let seen_attempts = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.refresh_gate.lock().await;

        // Another query refreshed while we waited for the gate.
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }
        if self.attempts.load(Ordering::Acquire) != seen_attempts {
            if let Some(error) = last_failure.clone() {
                return self.fall_back(error).await;
            }
        }

        let refreshed_at = Instant::now();
        let fetched_at = Utc::now();
        let result = self.source.fetch().await;
        self.attempts.fetch_add(1, Ordering::Release);

        match result {
            Ok(records) => {
                let snapshot =
                    Arc::new(Snapshot::from_records(&records, refreshed_at, fetched_at));
                tracing::info!(
                    vehicles = snapshot.vehicles.len(),
                    elapsed_ms = refreshed_at.elapsed().as_millis() as u64,
                    "Refreshed vehicle snapshot"
                );
                *self.snapshot.write().await = Some(snapshot.clone());
                *last_failure = None;
                Ok(snapshot)
            }
            Err(e) => {
                let error = Arc::new(e);
                *last_failure = Some(error.clone());
                self.fall_back(error).await
            }
        }
    }

    async fn fall_back(&self, error: Arc<FetchError>) -> Result<Arc<Snapshot>, QueryError> {
        match self.snapshot.read().await.clone() {
            Some(stale) => {
                tracing::warn!(
                    fetched_at = %stale.fetched_at,
                    "Feed refresh failed, serving stale snapshot: {}",
                    error
                );
                Ok(stale)
            }
            None => Err(QueryError::NoData(error)),
        }
    }
}
