//! Control-plane provider interface.
//!
//! The reconciler never talks to AWS directly. Everything it reads or
//! mutates goes through a [`Provider`], constructed once and passed in.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Cluster as reported by the provider.
#[derive(Debug, Clone, Default)]
pub struct ClusterInfo {
    pub name: String,
    pub version: Option<String>,
    pub tags: HashMap<String, String>,
}

/// One upgrade-readiness insight.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    pub name: String,
    pub status: String,
}

impl ReadinessCheck {
    pub const PASSING: &'static str = "PASSING";

    pub fn is_passing(&self) -> bool {
        self.status == Self::PASSING
    }
}

/// Pod identity association bound to an add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityAssociation {
    pub service_account: String,
    pub role_arn: String,
}

/// Authentication metadata the provider reports for an add-on.
#[derive(Debug, Clone, Default)]
pub struct AddonAuthMetadata {
    pub pod_identity_associations: Vec<IdentityAssociation>,
    pub service_account_role_arn: Option<String>,
}

/// Installed add-on.
#[derive(Debug, Clone)]
pub struct AddonInfo {
    pub name: String,
    pub version: String,
    pub auth: AddonAuthMetadata,
}

/// Managed node group.
#[derive(Debug, Clone)]
pub struct NodeGroupInfo {
    pub name: String,
    pub version: Option<String>,
    pub release_version: Option<String>,
    pub status: Option<String>,
}

impl NodeGroupInfo {
    pub const ACTIVE: &'static str = "ACTIVE";

    /// Returns the current version or "unknown" if not set.
    pub fn current_version(&self) -> &str {
        self.version.as_deref().unwrap_or("unknown")
    }
}

/// Outgoing add-on update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonUpdateRequest {
    pub cluster_name: String,
    pub addon_name: String,
    pub addon_version: String,
    pub pod_identity_associations: Option<Vec<IdentityAssociation>>,
    pub service_account_role_arn: Option<String>,
}

impl AddonUpdateRequest {
    pub fn new(cluster_name: &str, addon_name: &str, addon_version: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            addon_name: addon_name.to_string(),
            addon_version: addon_version.to_string(),
            pod_identity_associations: None,
            service_account_role_arn: None,
        }
    }
}

/// Remote control plane operations consumed by the reconciler.
///
/// Every method may fail with a classified provider error; throttling-class
/// failures are retried by the caller.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn list_clusters(&self) -> Result<Vec<String>>;

    /// Platform versions currently offered, newest first.
    async fn list_available_versions(&self) -> Result<Vec<String>>;

    async fn describe_cluster(&self, name: &str) -> Result<ClusterInfo>;

    async fn list_upgrade_insights(&self, cluster: &str) -> Result<Vec<ReadinessCheck>>;

    /// Returns the provider's update id.
    async fn request_cluster_version_change(&self, cluster: &str, version: &str)
    -> Result<String>;

    async fn list_addons(&self, cluster: &str) -> Result<Vec<String>>;

    async fn describe_addon(&self, cluster: &str, addon: &str) -> Result<AddonInfo>;

    /// Add-on versions compatible with `k8s_version`, latest first.
    async fn list_compatible_addon_versions(
        &self,
        cluster: &str,
        addon: &str,
        k8s_version: &str,
    ) -> Result<Vec<String>>;

    async fn request_addon_update(&self, request: &AddonUpdateRequest) -> Result<String>;

    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>>;

    async fn describe_nodegroup(&self, cluster: &str, nodegroup: &str) -> Result<NodeGroupInfo>;

    async fn request_nodegroup_version_change(
        &self,
        cluster: &str,
        nodegroup: &str,
        version: &str,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_check_passing() {
        let check = ReadinessCheck {
            name: "Deprecated APIs".to_string(),
            status: "PASSING".to_string(),
        };
        assert!(check.is_passing());

        let check = ReadinessCheck {
            name: "Kubelet skew".to_string(),
            status: "WARNING".to_string(),
        };
        assert!(!check.is_passing());
    }

    #[test]
    fn test_nodegroup_current_version_unknown() {
        let ng = NodeGroupInfo {
            name: "ng-system".to_string(),
            version: None,
            release_version: None,
            status: Some("ACTIVE".to_string()),
        };
        assert_eq!(ng.current_version(), "unknown");
    }

    #[test]
    fn test_addon_update_request_starts_without_auth() {
        let request = AddonUpdateRequest::new("dev", "vpc-cni", "v1.18.1-eksbuild.3");
        assert_eq!(request.cluster_name, "dev");
        assert!(request.pod_identity_associations.is_none());
        assert!(request.service_account_role_arn.is_none());
    }
}
