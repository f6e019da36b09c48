//! Index expression parsing and recombination
//!
//! Index expressions are comma-separated lists of index names or wildcard
//! patterns, each part optionally scoped to a remote cluster with an
//! `alias:` prefix. The ledger stores per-cluster expressions alias-stripped;
//! these helpers split, re-qualify and recombine them.

use crate::execution::{ClusterStatus, ExecutionInfo, LOCAL_CLUSTER_ALIAS};

/// Split a comma-separated expression into its non-empty parts
pub fn split_expression(expression: &str) -> Vec<&str> {
    expression
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Split an index name on its first `:` into (cluster alias, bare name).
/// Names without a separator belong to the local cluster.
pub fn parse_cluster_alias(index_name: &str) -> (&str, &str) {
    match index_name.split_once(':') {
        Some((alias, name)) => (alias, name),
        None => (LOCAL_CLUSTER_ALIAS, index_name),
    }
}

/// Recombine the ledger into one index expression covering every cluster not
/// marked skipped. Non-local parts are qualified with their cluster alias;
/// per-cluster part order and cluster iteration order are preserved. Returns
/// an empty string when no cluster remains.
pub fn create_index_expression_from_available_clusters(info: &ExecutionInfo) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cluster in info.clusters() {
        if cluster.status() == ClusterStatus::Skipped {
            continue;
        }
        for part in split_expression(cluster.index_expression()) {
            if cluster.alias() == LOCAL_CLUSTER_ALIAS {
                parts.push(part.to_string());
            } else {
                parts.push(format!("{}:{}", cluster.alias(), part));
            }
        }
    }
    parts.join(",")
}

/// True iff at least one part of the expression names a concrete index
/// (contains no wildcard). A pure-wildcard expression may legitimately match
/// nothing; a concrete name must exist.
pub fn concrete_index_requested(expression: &str) -> bool {
    split_expression(expression)
        .iter()
        .any(|part| !part.contains('*'))
}
