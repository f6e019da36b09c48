//! Execution-metadata view of the ledger
//!
//! The finalized [`ExecutionInfo`] is rendered into the execution-metadata
//! section of the query response: status tallies, elapsed times and a
//! per-cluster detail map. The view is a plain serializable snapshot; the
//! ledger itself never leaves this process.

use crate::execution::{Cluster, ClusterFailure, ClusterStatus, ExecutionInfo, LOCAL_CLUSTER_ALIAS};
use serde::Serialize;
use std::collections::BTreeMap;

/// Display name used for the reserved local alias in responses
const LOCAL_CLUSTER_DISPLAY_NAME: &str = "(local)";

/// Serializable snapshot of the whole ledger
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSnapshot {
    pub total: usize,
    pub successful: usize,
    pub running: usize,
    pub skipped: usize,
    pub partial: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub took_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_took_ms: Option<u64>,
    pub details: BTreeMap<String, ClusterDetail>,
}

/// Serializable snapshot of one cluster's execution state
#[derive(Debug, Clone, Serialize)]
pub struct ClusterDetail {
    pub status: ClusterStatus,
    pub indices: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub took_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shards: Option<ShardCounts>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ClusterFailure>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShardCounts {
    pub total: u32,
    pub successful: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl From<&Cluster> for ClusterDetail {
    fn from(cluster: &Cluster) -> Self {
        let shards = match (
            cluster.total_shards(),
            cluster.successful_shards(),
            cluster.skipped_shards(),
            cluster.failed_shards(),
        ) {
            (Some(total), Some(successful), Some(skipped), Some(failed)) => Some(ShardCounts {
                total,
                successful,
                skipped,
                failed,
            }),
            _ => None,
        };
        Self {
            status: cluster.status(),
            indices: cluster.index_expression().to_string(),
            took_ms: cluster.took().map(|took| took.as_millis() as u64),
            shards,
            failures: cluster.failures().to_vec(),
        }
    }
}

impl ExecutionSnapshot {
    /// Render the ledger, or `None` when the caller did not ask for
    /// execution metadata.
    pub fn from_execution_info(info: &ExecutionInfo) -> Option<Self> {
        if !info.include_execution_metadata() {
            return None;
        }

        let clusters = info.clusters();
        let mut snapshot = Self {
            total: clusters.len(),
            successful: 0,
            running: 0,
            skipped: 0,
            partial: 0,
            failed: 0,
            took_ms: info.overall_took().map(|took| took.as_millis() as u64),
            planning_took_ms: info.planning_took_time().map(|took| took.as_millis() as u64),
            details: BTreeMap::new(),
        };

        for cluster in &clusters {
            match cluster.status() {
                ClusterStatus::Running => snapshot.running += 1,
                ClusterStatus::Successful => snapshot.successful += 1,
                ClusterStatus::Skipped => snapshot.skipped += 1,
                ClusterStatus::Partial => snapshot.partial += 1,
                ClusterStatus::Failed => snapshot.failed += 1,
            }
            snapshot
                .details
                .insert(display_alias(cluster.alias()).to_string(), cluster.into());
        }
        Some(snapshot)
    }
}

fn display_alias(alias: &str) -> &str {
    if alias == LOCAL_CLUSTER_ALIAS {
        LOCAL_CLUSTER_DISPLAY_NAME
    } else {
        alias
    }
}
