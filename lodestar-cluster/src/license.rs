//! License gate for cross-cluster search
//!
//! Purely local searches are never gated. A query that references at least
//! one remote cluster alias requires an active Trial or Enterprise license.
//! This module only consumes an already-verified [`LicenseStatus`] value;
//! license storage, renewal and signature verification live elsewhere.

use crate::error::ClusterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation mode of an installed license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseMode {
    Basic,
    Standard,
    Gold,
    Platinum,
    Enterprise,
    Trial,
}

impl LicenseMode {
    pub const ALL: [LicenseMode; 6] = [
        LicenseMode::Basic,
        LicenseMode::Standard,
        LicenseMode::Gold,
        LicenseMode::Platinum,
        LicenseMode::Enterprise,
        LicenseMode::Trial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseMode::Basic => "basic",
            LicenseMode::Standard => "standard",
            LicenseMode::Gold => "gold",
            LicenseMode::Platinum => "platinum",
            LicenseMode::Enterprise => "enterprise",
            LicenseMode::Trial => "trial",
        }
    }
}

impl fmt::Display for LicenseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified license state, as handed over by the licensing subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseStatus {
    pub mode: LicenseMode,
    pub active: bool,
    /// Human-readable reason when the license is no longer active
    pub expiry_reason: Option<String>,
}

impl LicenseStatus {
    pub fn active(mode: LicenseMode) -> Self {
        Self {
            mode,
            active: true,
            expiry_reason: None,
        }
    }

    pub fn expired(mode: LicenseMode) -> Self {
        Self {
            mode,
            active: false,
            expiry_reason: Some("license expired".to_string()),
        }
    }
}

/// Whether the given license state permits cross-cluster search
pub fn is_ccs_allowed(license: Option<&LicenseStatus>) -> bool {
    matches!(
        license,
        Some(status) if status.active
            && matches!(status.mode, LicenseMode::Trial | LicenseMode::Enterprise)
    )
}

/// Short description of the license state, used in rejection messages:
/// `"none"`, `"expired <mode> license"` or `"active <mode> license"`.
pub fn license_description(license: Option<&LicenseStatus>) -> String {
    match license {
        None => "none".to_string(),
        Some(status) if status.active => format!("active {} license", status.mode),
        Some(status) => format!("expired {} license", status.mode),
    }
}

/// Client error raised when the license gate rejects a cross-cluster query
pub fn invalid_license_error(license: Option<&LicenseStatus>) -> ClusterError {
    ClusterError::LicenseRejected(license_description(license))
}
