//! Per-resource reconciliation outcomes and the per-cluster report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::AuthKind;

/// Reporting bucket, in the order categories appear in a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Updated,
    Failed,
    UpdateAvailable,
    UpToDate,
    BlockedOrSkipped,
}

/// Anything that can be counted into a [`Category`].
pub trait Categorized {
    fn category(&self) -> Category;
}

/// Cluster control plane status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    UpToDate,
    Blocked,
    Available,
    Upgrading,
    Error,
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpToDate => "up_to_date",
            Self::Blocked => "blocked",
            Self::Available => "available",
            Self::Upgrading => "upgrading",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Add-on status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonStatus {
    UpToDate,
    UpdateAvailable,
    Updated,
    Failed,
}

impl fmt::Display for AddonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpToDate => "up_to_date",
            Self::UpdateAvailable => "update_available",
            Self::Updated => "updated",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Managed node group status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeGroupStatus {
    UpToDate,
    UpdateAvailable,
    Updating,
    Failed,
    Skipped,
}

impl fmt::Display for NodeGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpToDate => "up_to_date",
            Self::UpdateAvailable => "update_available",
            Self::Updating => "updating",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterOutcome {
    pub name: String,
    pub status: ClusterStatus,
    pub current_version: Option<String>,
    pub target_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_available: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failing_checks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterOutcome {
    pub fn new(name: &str, status: ClusterStatus, current_version: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            current_version,
            target_version: None,
            latest_available: None,
            failing_checks: Vec::new(),
            update_id: None,
            error: None,
        }
    }

    pub fn error(name: &str, current_version: Option<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(name, ClusterStatus::Error, current_version)
        }
    }
}

impl Categorized for ClusterOutcome {
    fn category(&self) -> Category {
        match self.status {
            ClusterStatus::UpToDate => Category::UpToDate,
            ClusterStatus::Blocked => Category::BlockedOrSkipped,
            ClusterStatus::Available => Category::UpdateAvailable,
            ClusterStatus::Upgrading => Category::Updated,
            ClusterStatus::Error => Category::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddonOutcome {
    pub name: String,
    pub status: AddonStatus,
    pub current_version: String,
    pub target_version: Option<String>,
    pub auth: AuthKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddonOutcome {
    pub fn new(name: &str, status: AddonStatus, current_version: &str, auth: AuthKind) -> Self {
        Self {
            name: name.to_string(),
            status,
            current_version: current_version.to_string(),
            target_version: None,
            auth,
            update_id: None,
            error: None,
        }
    }

    pub fn failed(
        name: &str,
        current_version: &str,
        auth: AuthKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(name, AddonStatus::Failed, current_version, auth)
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: &str) -> Self {
        self.target_version = Some(target.to_string());
        self
    }
}

impl Categorized for AddonOutcome {
    fn category(&self) -> Category {
        match self.status {
            AddonStatus::UpToDate => Category::UpToDate,
            AddonStatus::UpdateAvailable => Category::UpdateAvailable,
            AddonStatus::Updated => Category::Updated,
            AddonStatus::Failed => Category::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeGroupOutcome {
    pub name: String,
    pub status: NodeGroupStatus,
    pub current_version: Option<String>,
    pub target_version: Option<String>,
    pub ami_release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeGroupOutcome {
    pub fn new(name: &str, status: NodeGroupStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            current_version: None,
            target_version: None,
            ami_release: None,
            update_id: None,
            error: None,
        }
    }

    pub fn failed(name: &str, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(name, NodeGroupStatus::Failed)
        }
    }
}

impl Categorized for NodeGroupOutcome {
    fn category(&self) -> Category {
        match self.status {
            NodeGroupStatus::UpToDate => Category::UpToDate,
            NodeGroupStatus::UpdateAvailable => Category::UpdateAvailable,
            NodeGroupStatus::Updating => Category::Updated,
            NodeGroupStatus::Failed => Category::Failed,
            NodeGroupStatus::Skipped => Category::BlockedOrSkipped,
        }
    }
}

/// Everything decided for one cluster in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub cluster: ClusterOutcome,
    pub addons: Vec<AddonOutcome>,
    pub nodegroups: Vec<NodeGroupOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_listing_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodegroup_listing_error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ClusterReport {
    pub fn new(cluster: ClusterOutcome) -> Self {
        Self {
            cluster,
            addons: Vec::new(),
            nodegroups: Vec::new(),
            addon_listing_error: None,
            nodegroup_listing_error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.cluster.name
    }
}

/// Result of a whole reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed_clusters: Vec<ClusterReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
