//! Per-resource upgrade eligibility rules.

use crate::provider::{NodeGroupInfo, ReadinessCheck};
use crate::version::{self, VersionRelation};

/// Why an upgrade cannot proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Upgrade-readiness insights are not passing.
    FailingReadinessChecks { count: usize, names: Vec<String> },
    /// Node group lifecycle status is not ACTIVE.
    NotActive { status: String },
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FailingReadinessChecks { count, .. } => {
                write!(f, "{count} failing upgrade readiness checks")
            }
            Self::NotActive { status } => {
                write!(f, "Node group status is {status}, not ACTIVE")
            }
        }
    }
}

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Already at the desired version.
    UpToDate,
    /// Behind, and allowed to advance to `target`.
    Eligible { target: String },
    /// Behind, but a hard gate prevents advancing.
    Blocked { target: String, reason: BlockReason },
    /// Not evaluated at all.
    Skipped { reason: BlockReason },
}

impl Decision {
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    pub fn target_version(&self) -> Option<&str> {
        match self {
            Self::Eligible { target } | Self::Blocked { target, .. } => Some(target.as_str()),
            Self::UpToDate | Self::Skipped { .. } => None,
        }
    }

    pub const fn block_reason(&self) -> Option<&BlockReason> {
        match self {
            Self::Blocked { reason, .. } | Self::Skipped { reason } => Some(reason),
            Self::UpToDate | Self::Eligible { .. } => None,
        }
    }
}

/// A cluster may advance one minor version when every readiness check passes.
pub fn evaluate_cluster<S: AsRef<str>>(
    current: &str,
    available: &[S],
    checks: &[ReadinessCheck],
) -> Decision {
    let Some(target) = version::next_step(current, available) else {
        return Decision::UpToDate;
    };

    let failing: Vec<String> = checks
        .iter()
        .filter(|c| !c.is_passing())
        .map(|c| c.name.clone())
        .collect();

    if failing.is_empty() {
        Decision::Eligible { target }
    } else {
        Decision::Blocked {
            target,
            reason: BlockReason::FailingReadinessChecks {
                count: failing.len(),
                names: failing,
            },
        }
    }
}

/// An add-on may jump straight to the latest compatible version.
pub fn evaluate_addon(current: &str, latest: Option<&str>) -> Decision {
    match latest {
        Some(latest) if version::compare(latest, current) == VersionRelation::Newer => {
            Decision::Eligible {
                target: latest.to_string(),
            }
        }
        _ => Decision::UpToDate,
    }
}

/// A node group must track the cluster version exactly.
pub fn evaluate_nodegroup(nodegroup: &NodeGroupInfo, cluster_version: &str) -> Decision {
    if let Some(status) = nodegroup.status.as_deref()
        && !status.is_empty()
        && status != NodeGroupInfo::ACTIVE
    {
        return Decision::Skipped {
            reason: BlockReason::NotActive {
                status: status.to_string(),
            },
        };
    }

    if nodegroup.version.as_deref() == Some(cluster_version) {
        Decision::UpToDate
    } else {
        Decision::Eligible {
            target: cluster_version.to_string(),
        }
    }
}
