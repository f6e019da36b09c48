//! Coordinator policies for cross-cluster query execution
//!
//! The stateful half of the coordinator: every function here reads one
//! external signal (license state, field-caps failures, index resolution,
//! planning or query completion) and transitions ledger entries through
//! [`ExecutionInfo::swap_cluster`]. Policies are written to be
//! arrival-order independent: entries already in a terminal state are left
//! untouched, and elapsed times are computed fresh at each transition.
//!
//! ```text
//! Query → init_cross_cluster_state (license gate + seeding)
//!       → update_execution_info_with_unavailable_clusters   (field caps)
//!       → update_execution_info_with_clusters_with_no_matching_indices
//!       → update_execution_info_at_end_of_planning
//!       → ... physical execution (elsewhere) ...
//!       → return_success_with_empty_result /
//!         update_execution_info_to_return_empty_result      (degenerate end)
//! ```

use crate::config::RemoteClustersConfig;
use crate::error::{ClusterError, Result};
use crate::execution::{
    Cluster, ClusterFailure, ClusterStatus, ExecutionInfo, LOCAL_CLUSTER_ALIAS,
};
use crate::expression::{concrete_index_requested, split_expression};
use crate::failure::is_remote_unreachable;
use crate::license::{self, LicenseStatus};
use crate::metrics;
use crate::resolution::{FieldCapsFailure, IndexGrouper, IndexPattern, IndexResolution};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Seed the ledger from the query's index patterns and enforce the license
/// precondition for cross-cluster search.
///
/// Every resolved alias gets one `Running` entry with its alias-stripped
/// expression and the configured skip_unavailable flag. Entries are seeded
/// before the gate fires, so a rejected query still carries its cluster set
/// for telemetry. Purely local queries pass under any license state.
pub fn init_cross_cluster_state(
    grouper: &dyn IndexGrouper,
    license: Option<&LicenseStatus>,
    patterns: &[IndexPattern],
    info: &ExecutionInfo,
    remotes: &RemoteClustersConfig,
) -> Result<()> {
    if patterns.is_empty() {
        return Ok(());
    }

    let mut expressions: Vec<String> = Vec::new();
    for pattern in patterns {
        for part in split_expression(&pattern.pattern) {
            expressions.push(part.to_string());
        }
    }

    let grouped = grouper.group_indices(&expressions)?;
    for (alias, indices) in &grouped {
        let expression = indices.join(",");
        let skip_unavailable = remotes.skip_unavailable(alias);
        info.swap_cluster(alias, |existing| {
            debug_assert!(existing.is_none(), "cluster [{alias}] seeded twice");
            Cluster::new(alias.clone(), expression, skip_unavailable)
        });
    }

    if info.is_cross_cluster_search() && !license::is_ccs_allowed(license) {
        metrics::record_license_rejection();
        return Err(license::invalid_license_error(license));
    }

    debug!(
        clusters = info.cluster_count(),
        cross_cluster = info.is_cross_cluster_search(),
        "initialized execution ledger"
    );
    Ok(())
}

/// Apply the skip_unavailable policy to clusters deemed unreachable by the
/// field-capabilities pass.
///
/// Tolerant clusters transition `Running` → `Skipped` with zeroed counts and
/// the wrapped cause recorded; `took` stays unset until the end of planning.
/// An unreachable cluster with `skip_unavailable=false` aborts the whole
/// query with a server error wrapping the original cause.
pub fn update_execution_info_with_unavailable_clusters(
    info: &ExecutionInfo,
    unavailable: &BTreeMap<String, FieldCapsFailure>,
) -> Result<()> {
    for (alias, failure) in unavailable {
        let Some(cluster) = info.get_cluster(alias) else {
            continue;
        };

        if !cluster.skip_unavailable() {
            metrics::record_fatal_error("remote_unavailable");
            return Err(ClusterError::RemoteUnavailable {
                cluster: alias.clone(),
                source: Box::new(failure.cause.clone()),
            });
        }

        if cluster.status().is_terminal() {
            continue;
        }

        warn!(cluster = alias.as_str(), cause = %failure.cause, "skipping unavailable remote cluster");
        metrics::record_cluster_skipped(alias, "unavailable");
        let reason = format!(
            "Remote cluster [{alias}] (with setting skip_unavailable=true) is not available: {}",
            failure.cause
        );
        info.swap_cluster(alias, |current| {
            let base = current.unwrap_or(&cluster);
            if base.status().is_terminal() {
                return base.clone();
            }
            base.builder()
                .status(ClusterStatus::Skipped)
                .total_shards(0)
                .successful_shards(0)
                .skipped_shards(0)
                .failed_shards(0)
                .failures(vec![ClusterFailure::new(reason.clone())])
                .build()
        });
    }
    Ok(())
}

/// Finalize remote clusters that contributed no concrete index to the
/// field-capabilities resolution.
///
/// Three cases per cluster, in order: a failure already recorded upstream
/// means `Skipped` without a duplicate failure entry; a wildcard-only
/// expression legitimately matched nothing and counts as `Successful`; a
/// concrete index that was requested but not found is `Skipped` with one
/// synthetic failure when tolerated, or a verification error otherwise.
/// The local cluster and already-terminal entries are left untouched.
pub fn update_execution_info_with_clusters_with_no_matching_indices(
    info: &ExecutionInfo,
    resolution: &IndexResolution,
) -> Result<()> {
    let clusters_with_indices = resolution.clusters_with_resolved_indices();

    for alias in info.cluster_aliases() {
        if alias == LOCAL_CLUSTER_ALIAS || clusters_with_indices.contains(&alias) {
            continue;
        }
        let Some(cluster) = info.get_cluster(&alias) else {
            continue;
        };
        if cluster.status().is_terminal() {
            continue;
        }

        if resolution.failures().contains_key(&alias) {
            // a failure is already recorded upstream; do not add a duplicate
            metrics::record_cluster_skipped(&alias, "no_matching_indices");
            mark_cluster_final_no_shards(info, &cluster, ClusterStatus::Skipped, None);
        } else if !concrete_index_requested(cluster.index_expression()) {
            // wildcard-only expressions may legitimately match nothing
            mark_cluster_final_no_shards(info, &cluster, ClusterStatus::Successful, None);
        } else {
            let scoped = scoped_expression(&alias, cluster.index_expression());
            if cluster.skip_unavailable() {
                metrics::record_cluster_skipped(&alias, "unknown_index");
                mark_cluster_final_no_shards(
                    info,
                    &cluster,
                    ClusterStatus::Skipped,
                    Some(ClusterFailure::new(format!("Unknown index [{scoped}]"))),
                );
            } else {
                metrics::record_fatal_error("unknown_index");
                return Err(ClusterError::UnknownIndex(scoped));
            }
        }
    }
    Ok(())
}

/// Record the end of planning and finalize clusters skipped during it.
///
/// The planning elapsed time is set exactly once; every cluster still in
/// `Skipped` without a `took` gets that same elapsed value and zeroed
/// counts. Local-only queries only record the planning time.
pub fn update_execution_info_at_end_of_planning(info: &ExecutionInfo) {
    let planning = info.mark_end_of_planning();
    if !info.is_cross_cluster_search() {
        return;
    }

    for alias in info.cluster_aliases() {
        let Some(cluster) = info.get_cluster(&alias) else {
            continue;
        };
        if cluster.status() != ClusterStatus::Skipped {
            continue;
        }
        info.swap_cluster(&alias, |current| {
            let base = current.unwrap_or(&cluster);
            if base.status() != ClusterStatus::Skipped || base.took().is_some() {
                return base.clone();
            }
            base.builder()
                .took(planning)
                .total_shards(0)
                .successful_shards(0)
                .skipped_shards(0)
                .failed_shards(0)
                .build()
        });
    }
}

/// Decide whether a "nothing left to search" condition may be reported as a
/// successful empty response instead of an error.
///
/// True iff the query is cross-cluster, the local cluster is not involved,
/// every remaining remote tolerates unavailability, and the error is either
/// the dedicated no-clusters condition or a remote-unreachable failure.
pub fn return_success_with_empty_result(info: &ExecutionInfo, error: &ClusterError) -> bool {
    if !info.is_cross_cluster_search() {
        return false;
    }
    if info.get_cluster(LOCAL_CLUSTER_ALIAS).is_some() {
        return false;
    }
    if !(matches!(error, ClusterError::NoClustersToSearch) || is_remote_unreachable(error)) {
        return false;
    }
    info.clusters().iter().all(Cluster::skip_unavailable)
}

/// Finalize the ledger for a successful empty response.
///
/// Sets the overall elapsed time, marks the local cluster (if present)
/// `Successful` with no failures, and every remote `Skipped` with exactly
/// one synthetic failure noting the connection problem.
pub fn update_execution_info_to_return_empty_result(info: &ExecutionInfo, error: &ClusterError) {
    let took = info.mark_end_of_query();
    metrics::record_empty_result();

    let reason = match error {
        ClusterError::Connection(_) => format!("unable to connect to remote cluster: {error}"),
        _ => "unable to connect to remote cluster".to_string(),
    };

    for alias in info.cluster_aliases() {
        let Some(cluster) = info.get_cluster(&alias) else {
            continue;
        };
        let local = alias == LOCAL_CLUSTER_ALIAS;
        info.swap_cluster(&alias, |current| {
            let base = current.unwrap_or(&cluster);
            let builder = base
                .builder()
                .took(took)
                .total_shards(0)
                .successful_shards(0)
                .skipped_shards(0)
                .failed_shards(0);
            if local {
                builder.status(ClusterStatus::Successful).build()
            } else {
                builder
                    .status(ClusterStatus::Skipped)
                    .failures(vec![ClusterFailure::new(reason.clone())])
                    .build()
            }
        });
    }
}

/// Whether a runtime error (cancellation included) on `alias` should be
/// swallowed. The local cluster never ignores errors; a remote ignores
/// every runtime error iff it is configured skip_unavailable.
pub fn should_ignore_runtime_error(
    info: &ExecutionInfo,
    alias: &str,
    error: &ClusterError,
) -> bool {
    let ignore = info.is_skip_unavailable(alias);
    if ignore {
        debug!(cluster = alias, error = %error, "ignoring runtime error on skip_unavailable cluster");
    }
    ignore
}

/// Finalize one running cluster with no shards: target status, elapsed time
/// so far, zeroed counts and at most one recorded failure.
fn mark_cluster_final_no_shards(
    info: &ExecutionInfo,
    snapshot: &Cluster,
    status: ClusterStatus,
    failure: Option<ClusterFailure>,
) {
    let took = info.took_so_far();
    metrics::record_cluster_finalized(status.as_str());
    info.swap_cluster(snapshot.alias(), |current| {
        let base = current.unwrap_or(snapshot);
        if base.status().is_terminal() {
            return base.clone();
        }
        let mut builder = base
            .builder()
            .status(status)
            .took(took)
            .total_shards(0)
            .successful_shards(0)
            .skipped_shards(0)
            .failed_shards(0);
        if let Some(failure) = failure {
            builder = builder.failures(vec![failure]);
        }
        builder.build()
    });
}

fn scoped_expression(alias: &str, expression: &str) -> String {
    if alias == LOCAL_CLUSTER_ALIAS {
        expression.to_string()
    } else {
        format!("{alias}:{expression}")
    }
}
