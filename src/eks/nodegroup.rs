//! EKS Managed Node Group operations.

use aws_sdk_eks::Client;
use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::provider::NodeGroupInfo;

/// List all managed node group names in a cluster.
pub async fn list_nodegroups(client: &Client, cluster_name: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut request = client.list_nodegroups().cluster_name(cluster_name);
        if let Some(token) = next_token.take() {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        names.extend(response.nodegroups().iter().cloned());

        next_token = response.next_token().map(ToString::to_string);
        if next_token.is_none() {
            break;
        }
    }

    debug!(cluster = cluster_name, "Found {} managed node groups", names.len());
    Ok(names)
}

pub async fn describe_nodegroup(
    client: &Client,
    cluster_name: &str,
    nodegroup_name: &str,
) -> Result<NodeGroupInfo> {
    debug!(
        cluster = cluster_name,
        nodegroup = nodegroup_name,
        "Describing managed node group"
    );

    let response = client
        .describe_nodegroup()
        .cluster_name(cluster_name)
        .nodegroup_name(nodegroup_name)
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let ng = response.nodegroup().ok_or_else(|| {
        ReconcileError::InvalidRequest(format!(
            "node group {nodegroup_name} not found in {cluster_name}"
        ))
    })?;

    Ok(NodeGroupInfo {
        name: ng.nodegroup_name().unwrap_or(nodegroup_name).to_string(),
        version: ng.version().map(ToString::to_string),
        release_version: ng.release_version().map(ToString::to_string),
        status: ng.status().map(|s| s.as_str().to_string()),
    })
}

/// Start a rolling update of a node group. Pod disruption budgets are respected.
pub async fn update_nodegroup_version(
    client: &Client,
    cluster_name: &str,
    nodegroup_name: &str,
    target_version: &str,
) -> Result<String> {
    let response = client
        .update_nodegroup_version()
        .cluster_name(cluster_name)
        .nodegroup_name(nodegroup_name)
        .version(target_version)
        .force(false)
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let update_id = response
        .update()
        .and_then(|u| u.id())
        .map(ToString::to_string)
        .unwrap_or_default();

    debug!(
        cluster = cluster_name,
        nodegroup = nodegroup_name,
        update_id = %update_id,
        "Managed node group update initiated"
    );
    Ok(update_id)
}
