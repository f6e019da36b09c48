//! Per-query execution ledger for cross-cluster search
//!
//! One [`ExecutionInfo`] is created per incoming distributed query, seeded
//! with one [`Cluster`] entry per participating cluster (the local cluster
//! counts as one, under the reserved [`LOCAL_CLUSTER_ALIAS`]), mutated by the
//! coordinator policies while planning and execution progress, and discarded
//! once the response is returned.
//!
//! ```text
//! Cluster states: Running → {Successful, Skipped, Partial, Failed}
//!
//! Transitions:
//!   running → skipped:    remote unavailable or no matching index,
//!                         skip_unavailable=true
//!   running → successful: wildcard-only expression matched nothing, or
//!                         execution finished cleanly
//!   running → partial:    execution finished with per-shard failures
//!   running → failed:     execution failed after planning
//! ```
//!
//! All mutation goes through [`ExecutionInfo::swap_cluster`], an atomic
//! per-key read-modify-write. Concurrent callbacks for different clusters
//! never block each other's correctness, and two callbacks racing on the
//! same alias are serialized by the ledger lock.

use crate::error::ClusterError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Reserved alias of the local cluster. Index names without a `:` separator
/// belong to it; remote aliases are always non-empty.
pub const LOCAL_CLUSTER_ALIAS: &str = "";

/// Execution state of one participating cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    /// Still being planned or searched; the only initial state
    Running,
    /// Finished with every shard accounted for
    Successful,
    /// Excused from the query, result degraded but not fatal
    Skipped,
    /// Finished with some shard failures
    Partial,
    /// Failed after planning completed
    Failed,
}

impl ClusterStatus {
    /// Get status as a string for metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Running => "running",
            ClusterStatus::Successful => "successful",
            ClusterStatus::Skipped => "skipped",
            ClusterStatus::Partial => "partial",
            ClusterStatus::Failed => "failed",
        }
    }

    /// Every non-running state is terminal for the coordinator
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClusterStatus::Running)
    }
}

/// Recorded failure detail for one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterFailure {
    /// Human-readable reason
    pub reason: String,
}

impl ClusterFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn from_error(error: &ClusterError) -> Self {
        Self {
            reason: error.to_string(),
        }
    }
}

/// Execution record of one cluster participating in the query
///
/// A running cluster has `took` and all four shard counts unset; a terminal
/// cluster has all five set (possibly zero). Updates go through
/// [`Cluster::builder`], which copies the current record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    alias: String,
    index_expression: String,
    skip_unavailable: bool,
    status: ClusterStatus,
    took: Option<Duration>,
    total_shards: Option<u32>,
    successful_shards: Option<u32>,
    skipped_shards: Option<u32>,
    failed_shards: Option<u32>,
    failures: Vec<ClusterFailure>,
}

impl Cluster {
    /// Create a running cluster entry
    pub fn new(
        alias: impl Into<String>,
        index_expression: impl Into<String>,
        skip_unavailable: bool,
    ) -> Self {
        Self::with_status(alias, index_expression, skip_unavailable, ClusterStatus::Running)
    }

    /// Create an entry in a specific initial status
    ///
    /// A cluster created directly in `Skipped` (e.g. after a failed policy
    /// lookup upstream of planning) carries no counts yet; the
    /// end-of-planning pass finalizes it.
    pub fn with_status(
        alias: impl Into<String>,
        index_expression: impl Into<String>,
        skip_unavailable: bool,
        status: ClusterStatus,
    ) -> Self {
        Self {
            alias: alias.into(),
            index_expression: index_expression.into(),
            skip_unavailable,
            status,
            took: None,
            total_shards: None,
            successful_shards: None,
            skipped_shards: None,
            failed_shards: None,
            failures: Vec::new(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn index_expression(&self) -> &str {
        &self.index_expression
    }

    pub fn skip_unavailable(&self) -> bool {
        self.skip_unavailable
    }

    pub fn status(&self) -> ClusterStatus {
        self.status
    }

    pub fn took(&self) -> Option<Duration> {
        self.took
    }

    pub fn total_shards(&self) -> Option<u32> {
        self.total_shards
    }

    pub fn successful_shards(&self) -> Option<u32> {
        self.successful_shards
    }

    pub fn skipped_shards(&self) -> Option<u32> {
        self.skipped_shards
    }

    pub fn failed_shards(&self) -> Option<u32> {
        self.failed_shards
    }

    pub fn failures(&self) -> &[ClusterFailure] {
        &self.failures
    }

    /// Start a copy-on-write update of this record
    pub fn builder(&self) -> ClusterBuilder {
        ClusterBuilder {
            inner: self.clone(),
        }
    }
}

/// Copy-on-write builder over an existing [`Cluster`] record
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    inner: Cluster,
}

impl ClusterBuilder {
    pub fn status(mut self, status: ClusterStatus) -> Self {
        self.inner.status = status;
        self
    }

    pub fn took(mut self, took: Duration) -> Self {
        self.inner.took = Some(took);
        self
    }

    pub fn total_shards(mut self, shards: u32) -> Self {
        self.inner.total_shards = Some(shards);
        self
    }

    pub fn successful_shards(mut self, shards: u32) -> Self {
        self.inner.successful_shards = Some(shards);
        self
    }

    pub fn skipped_shards(mut self, shards: u32) -> Self {
        self.inner.skipped_shards = Some(shards);
        self
    }

    pub fn failed_shards(mut self, shards: u32) -> Self {
        self.inner.failed_shards = Some(shards);
        self
    }

    /// Replace the recorded failures
    pub fn failures(mut self, failures: Vec<ClusterFailure>) -> Self {
        self.inner.failures = failures;
        self
    }

    pub fn build(self) -> Cluster {
        self.inner
    }
}

/// The per-query ledger: alias → [`Cluster`], plus ledger-wide timestamps
///
/// Shared across the concurrently completing callbacks of one query. The
/// planning and overall elapsed times are each set exactly once; redundant
/// calls return the stored value.
#[derive(Debug)]
pub struct ExecutionInfo {
    clusters: RwLock<BTreeMap<String, Cluster>>,
    start: Instant,
    planning_took: RwLock<Option<Duration>>,
    overall_took: RwLock<Option<Duration>>,
    include_execution_metadata: bool,
}

impl ExecutionInfo {
    /// Create an empty ledger for a new query
    ///
    /// `include_execution_metadata` records whether the caller asked for the
    /// execution-metadata section in the response.
    pub fn new(include_execution_metadata: bool) -> Self {
        Self {
            clusters: RwLock::new(BTreeMap::new()),
            start: Instant::now(),
            planning_took: RwLock::new(None),
            overall_took: RwLock::new(None),
            include_execution_metadata,
        }
    }

    pub fn include_execution_metadata(&self) -> bool {
        self.include_execution_metadata
    }

    /// Atomically replace the entry for `alias`
    ///
    /// `update` receives the current record (or `None` for a new alias) and
    /// returns the replacement. This is the only way ledger entries are
    /// created or mutated; the read-modify-write is serialized per key, so
    /// racing callbacks cannot lose updates. Returns the record written.
    pub fn swap_cluster<F>(&self, alias: &str, update: F) -> Cluster
    where
        F: FnOnce(Option<&Cluster>) -> Cluster,
    {
        let mut clusters = self.clusters.write();
        let next = update(clusters.get(alias));
        clusters.insert(alias.to_string(), next.clone());
        next
    }

    /// Current record for `alias`, if seeded
    pub fn get_cluster(&self, alias: &str) -> Option<Cluster> {
        self.clusters.read().get(alias).cloned()
    }

    /// All known aliases, local first, remotes in lexical order
    pub fn cluster_aliases(&self) -> Vec<String> {
        self.clusters.read().keys().cloned().collect()
    }

    /// Snapshot of all records in alias order
    pub fn clusters(&self) -> Vec<Cluster> {
        self.clusters.read().values().cloned().collect()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.read().len()
    }

    /// A query is cross-cluster when it references any remote alias
    pub fn is_cross_cluster_search(&self) -> bool {
        let clusters = self.clusters.read();
        clusters.len() > 1
            || (clusters.len() == 1 && !clusters.contains_key(LOCAL_CLUSTER_ALIAS))
    }

    /// Whether failures on `alias` degrade the result instead of aborting.
    /// The local cluster never tolerates failure; unknown aliases don't
    /// either.
    pub fn is_skip_unavailable(&self, alias: &str) -> bool {
        if alias == LOCAL_CLUSTER_ALIAS {
            return false;
        }
        self.clusters
            .read()
            .get(alias)
            .map(|cluster| cluster.skip_unavailable)
            .unwrap_or(false)
    }

    /// Elapsed time since the query started
    pub fn took_so_far(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record the end of planning; idempotent, returns the stored duration
    pub fn mark_end_of_planning(&self) -> Duration {
        let mut planning = self.planning_took.write();
        *planning.get_or_insert_with(|| self.start.elapsed())
    }

    pub fn planning_took_time(&self) -> Option<Duration> {
        *self.planning_took.read()
    }

    /// Record the end of the whole query; idempotent, returns the stored
    /// duration
    pub fn mark_end_of_query(&self) -> Duration {
        let mut overall = self.overall_took.write();
        *overall.get_or_insert_with(|| self.start.elapsed())
    }

    pub fn overall_took(&self) -> Option<Duration> {
        *self.overall_took.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cluster_is_running_with_nothing_set() {
        let cluster = Cluster::new("remote1", "logs*", true);
        assert_eq!(cluster.status(), ClusterStatus::Running);
        assert!(cluster.took().is_none());
        assert!(cluster.total_shards().is_none());
        assert!(cluster.successful_shards().is_none());
        assert!(cluster.skipped_shards().is_none());
        assert!(cluster.failed_shards().is_none());
        assert!(cluster.failures().is_empty());
    }

    #[test]
    fn test_builder_copy_on_write() {
        let cluster = Cluster::new("remote1", "logs*", true);
        let updated = cluster
            .builder()
            .status(ClusterStatus::Skipped)
            .took(Duration::from_millis(3))
            .total_shards(0)
            .successful_shards(0)
            .skipped_shards(0)
            .failed_shards(0)
            .failures(vec![ClusterFailure::new("unreachable")])
            .build();

        // original untouched
        assert_eq!(cluster.status(), ClusterStatus::Running);
        assert_eq!(updated.status(), ClusterStatus::Skipped);
        assert_eq!(updated.took(), Some(Duration::from_millis(3)));
        assert_eq!(updated.total_shards(), Some(0));
        assert_eq!(updated.failures().len(), 1);
        assert_eq!(updated.alias(), "remote1");
        assert_eq!(updated.index_expression(), "logs*");
    }

    #[test]
    fn test_failure_from_error_uses_display() {
        let failure = ClusterFailure::from_error(&ClusterError::NoClustersToSearch);
        assert_eq!(failure.reason, "No clusters available to search");
    }

    #[test]
    fn test_swap_and_get() {
        let info = ExecutionInfo::new(true);
        info.swap_cluster(LOCAL_CLUSTER_ALIAS, |_| {
            Cluster::new(LOCAL_CLUSTER_ALIAS, "logs*", false)
        });
        info.swap_cluster("remote1", |_| Cluster::new("remote1", "*", true));

        assert_eq!(info.cluster_count(), 2);
        assert_eq!(
            info.cluster_aliases(),
            vec![LOCAL_CLUSTER_ALIAS.to_string(), "remote1".to_string()]
        );
        let remote1 = info.get_cluster("remote1").unwrap();
        assert_eq!(remote1.index_expression(), "*");
        assert!(info.get_cluster("remote9").is_none());
    }

    #[test]
    fn test_swap_sees_previous_value() {
        let info = ExecutionInfo::new(true);
        info.swap_cluster("remote1", |existing| {
            assert!(existing.is_none());
            Cluster::new("remote1", "logs*", true)
        });
        info.swap_cluster("remote1", |existing| {
            let base = existing.expect("entry seeded above");
            base.builder().status(ClusterStatus::Skipped).build()
        });
        assert_eq!(
            info.get_cluster("remote1").unwrap().status(),
            ClusterStatus::Skipped
        );
    }

    #[test]
    fn test_is_cross_cluster_search() {
        let local_only = ExecutionInfo::new(true);
        local_only.swap_cluster(LOCAL_CLUSTER_ALIAS, |_| {
            Cluster::new(LOCAL_CLUSTER_ALIAS, "logs*", false)
        });
        assert!(!local_only.is_cross_cluster_search());

        let remote_only = ExecutionInfo::new(true);
        remote_only.swap_cluster("remote1", |_| Cluster::new("remote1", "*", true));
        assert!(remote_only.is_cross_cluster_search());

        let mixed = ExecutionInfo::new(true);
        mixed.swap_cluster(LOCAL_CLUSTER_ALIAS, |_| {
            Cluster::new(LOCAL_CLUSTER_ALIAS, "logs*", false)
        });
        mixed.swap_cluster("remote1", |_| Cluster::new("remote1", "*", true));
        assert!(mixed.is_cross_cluster_search());

        assert!(!ExecutionInfo::new(true).is_cross_cluster_search());
    }

    #[test]
    fn test_is_skip_unavailable() {
        let info = ExecutionInfo::new(true);
        info.swap_cluster(LOCAL_CLUSTER_ALIAS, |_| {
            Cluster::new(LOCAL_CLUSTER_ALIAS, "logs*", false)
        });
        info.swap_cluster("remote1", |_| Cluster::new("remote1", "*", true));
        info.swap_cluster("remote2", |_| Cluster::new("remote2", "*", false));

        assert!(!info.is_skip_unavailable(LOCAL_CLUSTER_ALIAS));
        assert!(info.is_skip_unavailable("remote1"));
        assert!(!info.is_skip_unavailable("remote2"));
        assert!(!info.is_skip_unavailable("unknown"));
    }

    #[test]
    fn test_planning_and_overall_took_set_once() {
        let info = ExecutionInfo::new(true);
        assert!(info.planning_took_time().is_none());
        assert!(info.overall_took().is_none());

        let planning = info.mark_end_of_planning();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(info.mark_end_of_planning(), planning);
        assert_eq!(info.planning_took_time(), Some(planning));

        let overall = info.mark_end_of_query();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(info.mark_end_of_query(), overall);
        assert_eq!(info.overall_took(), Some(overall));
        assert!(overall >= planning);
    }

    #[test]
    fn test_swap_cluster_loses_no_updates_under_contention() {
        const THREADS: usize = 8;
        const UPDATES: usize = 100;

        let info = ExecutionInfo::new(true);
        info.swap_cluster("remote1", |_| Cluster::new("remote1", "logs*", true));

        std::thread::scope(|scope| {
            for thread in 0..THREADS {
                let info = &info;
                scope.spawn(move || {
                    for i in 0..UPDATES {
                        info.swap_cluster("remote1", |current| {
                            let base = current.expect("entry seeded before spawn");
                            let mut failures = base.failures().to_vec();
                            failures.push(ClusterFailure::new(format!("t{thread}-u{i}")));
                            base.builder().failures(failures).build()
                        });
                    }
                });
            }
        });

        let cluster = info.get_cluster("remote1").unwrap();
        assert_eq!(cluster.failures().len(), THREADS * UPDATES);
    }

    #[test]
    fn test_cluster_serde_roundtrip() {
        let cluster = Cluster::new("remote1", "mylogs1,mylogs2,logs*", true)
            .builder()
            .status(ClusterStatus::Skipped)
            .took(Duration::from_millis(12))
            .total_shards(0)
            .successful_shards(0)
            .skipped_shards(0)
            .failed_shards(0)
            .failures(vec![ClusterFailure::new("Unknown index [remote1:mylogs1]")])
            .build();

        let json = serde_json::to_string(&cluster).unwrap();
        let deserialized: Cluster = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, cluster);
    }
}
