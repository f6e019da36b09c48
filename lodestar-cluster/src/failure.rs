//! Failure classification for the field-capabilities pass
//!
//! Several distinct transport failures all mean the same thing for
//! coordination purposes: the remote cluster cannot be reached. The
//! classifier collapses them into a closed [`FailureKind`] so that policy
//! code never dispatches on concrete error shapes.

use crate::error::ClusterError;
use crate::execution::LOCAL_CLUSTER_ALIAS;
use crate::expression::parse_cluster_alias;
use crate::resolution::FieldCapsFailure;
use std::collections::{BTreeMap, BTreeSet};

/// Coordination-level category of a failure cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, seed-node or unknown-remote failures: the cluster is
    /// unreachable and skip_unavailable policy applies
    RemoteUnavailable,
    /// Anything else (data corruption, query errors, plain runtime errors)
    Other,
}

// Transport errors that crossed a serialization boundary can lose their
// type; the message is the only signal left.
const LOST_TYPE_MESSAGES: [&str; 2] = ["Unable to open any connections", "unknown host"];

/// Classify one failure cause
pub fn classify(error: &ClusterError) -> FailureKind {
    match error {
        ClusterError::Connection(_)
        | ClusterError::NoSeedNode(_)
        | ClusterError::NoSuchRemoteCluster(_) => FailureKind::RemoteUnavailable,
        ClusterError::RemoteUnavailable { source, .. } => classify(source),
        other => {
            let message = other.to_string();
            if LOST_TYPE_MESSAGES
                .iter()
                .any(|needle| message.contains(needle))
            {
                FailureKind::RemoteUnavailable
            } else {
                FailureKind::Other
            }
        }
    }
}

pub fn is_remote_unreachable(error: &ClusterError) -> bool {
    classify(error) == FailureKind::RemoteUnavailable
}

/// Group field-caps failures by the cluster alias of their index names.
/// A failure spanning several clusters is recorded in every group it names.
pub fn group_failures_per_cluster(
    failures: &[FieldCapsFailure],
) -> BTreeMap<String, Vec<FieldCapsFailure>> {
    let mut grouped: BTreeMap<String, Vec<FieldCapsFailure>> = BTreeMap::new();
    for failure in failures {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for index in &failure.indices {
            let (alias, _) = parse_cluster_alias(index);
            if seen.insert(alias) {
                grouped.entry(alias.to_string()).or_default().push(failure.clone());
            }
        }
    }
    grouped
}

/// Decide which remote clusters are unreachable
///
/// A remote alias is unavailable iff *every* cause recorded for it
/// classifies as [`FailureKind::RemoteUnavailable`]; one non-matching cause
/// disqualifies the alias (a reachable cluster with a broken index must not
/// be excused as unreachable). Returns alias → representative failure.
pub fn determine_unavailable_remote_clusters(
    grouped: &BTreeMap<String, Vec<FieldCapsFailure>>,
) -> BTreeMap<String, FieldCapsFailure> {
    let mut unavailable = BTreeMap::new();
    for (alias, failures) in grouped {
        if alias == LOCAL_CLUSTER_ALIAS || failures.is_empty() {
            continue;
        }
        if failures.iter().all(|failure| is_remote_unreachable(&failure.cause)) {
            unavailable.insert(alias.clone(), failures[0].clone());
        }
    }
    unavailable
}
