//! Lodestar Cluster - Cross-cluster query coordination for Lodestar
//!
//! This crate owns the bookkeeping and policy for running one query across
//! the local cluster and any number of configured remote clusters: which
//! clusters are queried, which are excused from failure, and when a
//! degraded result set is still good enough to answer.
//!
//! # Architecture
//!
//! - **Execution ledger**: per-query map of cluster alias → execution state,
//!   mutated only through an atomic per-key swap
//! - **Coordinator policies**: transitions driven by field-caps failures,
//!   index resolution, planning completion and the degenerate
//!   nothing-left-to-search endgame
//! - **Failure classifier**: collapses transport failure shapes into
//!   reachable/unreachable
//! - **Expression builder**: splits and recombines `alias:`-scoped index
//!   expressions
//! - **License gate**: cross-cluster search requires an active Trial or
//!   Enterprise license; local search is never gated
//!
//! The physical execution engine, transport and license verification are
//! external collaborators; this crate only performs in-memory transitions
//! on completed values they deliver.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod execution;
pub mod expression;
pub mod failure;
pub mod license;
pub mod metrics;
pub mod resolution;
pub mod response;

pub use config::{RemoteClusterSettings, RemoteClustersConfig};
pub use coordinator::{
    init_cross_cluster_state, return_success_with_empty_result, should_ignore_runtime_error,
    update_execution_info_at_end_of_planning, update_execution_info_to_return_empty_result,
    update_execution_info_with_clusters_with_no_matching_indices,
    update_execution_info_with_unavailable_clusters,
};
pub use error::{ClusterError, RestStatus, Result};
pub use execution::{
    Cluster, ClusterBuilder, ClusterFailure, ClusterStatus, ExecutionInfo, LOCAL_CLUSTER_ALIAS,
};
pub use expression::{
    concrete_index_requested, create_index_expression_from_available_clusters, parse_cluster_alias,
};
pub use failure::{
    classify, determine_unavailable_remote_clusters, group_failures_per_cluster,
    is_remote_unreachable, FailureKind,
};
pub use license::{is_ccs_allowed, license_description, LicenseMode, LicenseStatus};
pub use resolution::{FieldCapsFailure, IndexGrouper, IndexPattern, IndexResolution};
pub use response::{ClusterDetail, ExecutionSnapshot, ShardCounts};
