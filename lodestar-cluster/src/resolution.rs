//! Collaborator-facing types for index resolution
//!
//! The coordinator consumes completed values from two external
//! collaborators: an index-expression grouping service ([`IndexGrouper`])
//! that maps raw expressions to per-cluster groups, and the
//! field-capabilities pass whose outcome arrives as an [`IndexResolution`]
//! (matched concrete indices plus per-cluster failures).

use crate::error::{ClusterError, Result};
use crate::expression::parse_cluster_alias;
use std::collections::{BTreeMap, BTreeSet};

/// One raw, possibly comma-separated index expression from the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPattern {
    pub pattern: String,
}

impl IndexPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// Groups raw index expressions by cluster alias
///
/// Implemented by the remote-cluster registry: given expressions like
/// `logs*` or `remote1:mylogs*`, returns alias → alias-stripped expressions,
/// with the reserved local alias for unscoped parts. Fails with
/// [`ClusterError::NoSuchRemoteCluster`] when an expression references an
/// unknown alias.
pub trait IndexGrouper {
    fn group_indices(&self, expressions: &[String]) -> Result<BTreeMap<String, Vec<String>>>;
}

/// One failure reported by the field-capabilities pass
#[derive(Debug, Clone)]
pub struct FieldCapsFailure {
    /// Index names (possibly alias-qualified) the failure applies to
    pub indices: Vec<String>,
    pub cause: ClusterError,
}

impl FieldCapsFailure {
    pub fn new(indices: Vec<String>, cause: ClusterError) -> Self {
        Self { indices, cause }
    }
}

/// Outcome of the field-capabilities pass over the whole expression
#[derive(Debug, Clone, Default)]
pub struct IndexResolution {
    /// The original user-provided expression, for error reporting
    expression: String,
    /// Concrete indices that matched, alias-qualified for remotes
    resolved_indices: BTreeSet<String>,
    /// Failures grouped by cluster alias
    failures: BTreeMap<String, Vec<FieldCapsFailure>>,
}

impl IndexResolution {
    pub fn valid(
        expression: impl Into<String>,
        resolved_indices: BTreeSet<String>,
        failures: BTreeMap<String, Vec<FieldCapsFailure>>,
    ) -> Self {
        Self {
            expression: expression.into(),
            resolved_indices,
            failures,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn resolved_indices(&self) -> &BTreeSet<String> {
        &self.resolved_indices
    }

    pub fn failures(&self) -> &BTreeMap<String, Vec<FieldCapsFailure>> {
        &self.failures
    }

    /// Aliases that contributed at least one matched concrete index
    pub fn clusters_with_resolved_indices(&self) -> BTreeSet<String> {
        self.resolved_indices
            .iter()
            .map(|index| parse_cluster_alias(index).0.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::LOCAL_CLUSTER_ALIAS;

    #[test]
    fn test_clusters_with_resolved_indices() {
        let resolved: BTreeSet<String> = [
            "logs-a",
            "remote1:logs-a",
            "remote2:mylogs1",
            "remote2:mylogs2",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let resolution = IndexResolution::valid("logs*,remote1:*,remote2:mylogs*", resolved, BTreeMap::new());

        let clusters = resolution.clusters_with_resolved_indices();
        assert_eq!(clusters.len(), 3);
        assert!(clusters.contains(LOCAL_CLUSTER_ALIAS));
        assert!(clusters.contains("remote1"));
        assert!(clusters.contains("remote2"));
    }

    #[test]
    fn test_empty_resolution() {
        let resolution = IndexResolution::default();
        assert!(resolution.resolved_indices().is_empty());
        assert!(resolution.failures().is_empty());
        assert!(resolution.clusters_with_resolved_indices().is_empty());
    }
}
