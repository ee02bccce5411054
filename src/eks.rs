//! AWS EKS implementation of [`Provider`].

pub mod addon;
pub mod client;
pub mod insights;
pub mod nodegroup;

use async_trait::async_trait;
use aws_sdk_eks::Client;

use crate::error::Result;
use crate::provider::{
    AddonInfo, AddonUpdateRequest, ClusterInfo, NodeGroupInfo, Provider, ReadinessCheck,
};

/// EKS-backed provider sharing one SDK client for the whole pass.
#[derive(Clone)]
pub struct EksProvider {
    client: Client,
}

impl EksProvider {
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for EksProvider {
    async fn list_clusters(&self) -> Result<Vec<String>> {
        client::list_clusters(&self.client).await
    }

    async fn list_available_versions(&self) -> Result<Vec<String>> {
        client::describe_cluster_versions(&self.client).await
    }

    async fn describe_cluster(&self, name: &str) -> Result<ClusterInfo> {
        client::describe_cluster(&self.client, name).await
    }

    async fn list_upgrade_insights(&self, cluster: &str) -> Result<Vec<ReadinessCheck>> {
        insights::list_upgrade_insights(&self.client, cluster).await
    }

    async fn request_cluster_version_change(
        &self,
        cluster: &str,
        version: &str,
    ) -> Result<String> {
        client::update_cluster_version(&self.client, cluster, version).await
    }

    async fn list_addons(&self, cluster: &str) -> Result<Vec<String>> {
        addon::list_addons(&self.client, cluster).await
    }

    async fn describe_addon(&self, cluster: &str, addon_name: &str) -> Result<AddonInfo> {
        addon::describe_addon(&self.client, cluster, addon_name).await
    }

    async fn list_compatible_addon_versions(
        &self,
        _cluster: &str,
        addon_name: &str,
        k8s_version: &str,
    ) -> Result<Vec<String>> {
        addon::get_compatible_versions(&self.client, addon_name, k8s_version).await
    }

    async fn request_addon_update(&self, request: &AddonUpdateRequest) -> Result<String> {
        addon::update_addon(&self.client, request).await
    }

    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>> {
        nodegroup::list_nodegroups(&self.client, cluster).await
    }

    async fn describe_nodegroup(&self, cluster: &str, nodegroup: &str) -> Result<NodeGroupInfo> {
        nodegroup::describe_nodegroup(&self.client, cluster, nodegroup).await
    }

    async fn request_nodegroup_version_change(
        &self,
        cluster: &str,
        nodegroup: &str,
        version: &str,
    ) -> Result<String> {
        nodegroup::update_nodegroup_version(&self.client, cluster, nodegroup, version).await
    }
}
