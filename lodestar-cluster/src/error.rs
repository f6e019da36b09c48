//! Coordination error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while coordinating a cross-cluster query
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ClusterError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No seed node left: {0}")]
    NoSeedNode(String),

    #[error("No such remote cluster: [{0}]")]
    NoSuchRemoteCluster(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Task cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown index [{0}]")]
    UnknownIndex(String),

    #[error("A valid Enterprise license is required to run cross-cluster searches. License found: {0}")]
    LicenseRejected(String),

    #[error("Remote cluster [{cluster}] (with setting skip_unavailable=false) is not available")]
    RemoteUnavailable {
        cluster: String,
        #[source]
        source: Box<ClusterError>,
    },

    #[error("No clusters available to search")]
    NoClustersToSearch,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// HTTP-equivalent status class reported at the API boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestStatus {
    BadRequest,
    GatewayTimeout,
    InternalServerError,
}

impl RestStatus {
    pub fn as_u16(self) -> u16 {
        match self {
            RestStatus::BadRequest => 400,
            RestStatus::GatewayTimeout => 504,
            RestStatus::InternalServerError => 500,
        }
    }

    /// True for errors the caller can fix (bad request family)
    pub fn is_client_error(self) -> bool {
        matches!(self, RestStatus::BadRequest)
    }
}

impl ClusterError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            ClusterError::Connection(_) => "connection",
            ClusterError::NoSeedNode(_) => "no_seed_node",
            ClusterError::NoSuchRemoteCluster(_) => "no_such_remote_cluster",
            ClusterError::Timeout(_) => "timeout",
            ClusterError::Cancelled(_) => "cancelled",
            ClusterError::InvalidQuery(_) => "invalid_query",
            ClusterError::UnknownIndex(_) => "unknown_index",
            ClusterError::LicenseRejected(_) => "license_rejected",
            ClusterError::RemoteUnavailable { .. } => "remote_unavailable",
            ClusterError::NoClustersToSearch => "no_clusters_to_search",
            ClusterError::Internal(_) => "internal",
        }
    }

    /// Status class this error maps to at the API boundary
    pub fn status(&self) -> RestStatus {
        match self {
            ClusterError::InvalidQuery(_)
            | ClusterError::UnknownIndex(_)
            | ClusterError::LicenseRejected(_) => RestStatus::BadRequest,
            ClusterError::Timeout(_) => RestStatus::GatewayTimeout,
            ClusterError::Connection(_)
            | ClusterError::NoSeedNode(_)
            | ClusterError::NoSuchRemoteCluster(_)
            | ClusterError::Cancelled(_)
            | ClusterError::RemoteUnavailable { .. }
            | ClusterError::NoClustersToSearch
            | ClusterError::Internal(_) => RestStatus::InternalServerError,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
