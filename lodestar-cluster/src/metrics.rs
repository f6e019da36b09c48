//! Coordination observability metrics
//!
//! Counters for cross-cluster coordination decisions: clusters excused from
//! a query, fatal coordination errors, license rejections, and queries
//! answered through the empty-result path.

/// Record a cluster being excused from the query
pub fn record_cluster_skipped(cluster: &str, reason: &str) {
    metrics::counter!(
        "lodestar_ccs_clusters_skipped_total",
        "cluster" => cluster.to_string(),
        "reason" => reason.to_string(),
    )
    .increment(1);
}

/// Record a cluster reaching a terminal state during planning
pub fn record_cluster_finalized(status: &str) {
    metrics::counter!(
        "lodestar_ccs_clusters_finalized_total",
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Record a fatal coordination error
pub fn record_fatal_error(error_type: &str) {
    metrics::counter!(
        "lodestar_ccs_fatal_errors_total",
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record a cross-cluster query rejected by the license gate
pub fn record_license_rejection() {
    metrics::counter!("lodestar_ccs_license_rejections_total").increment(1);
}

/// Record a query answered as successful-but-empty
pub fn record_empty_result() {
    metrics::counter!("lodestar_ccs_empty_results_total").increment(1);
}
