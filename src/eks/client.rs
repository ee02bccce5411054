//! Cluster-level EKS operations.

use aws_sdk_eks::Client;
use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::provider::ClusterInfo;

/// List every cluster name in the region.
pub async fn list_clusters(client: &Client) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut request = client.list_clusters();
        if let Some(token) = next_token.take() {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        names.extend(response.clusters().iter().cloned());

        next_token = response.next_token().map(ToString::to_string);
        if next_token.is_none() {
            break;
        }
    }

    debug!("Found {} clusters", names.len());
    Ok(names)
}

/// Kubernetes versions EKS currently offers, in the order the service returns them.
pub async fn describe_cluster_versions(client: &Client) -> Result<Vec<String>> {
    let mut versions = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut request = client.describe_cluster_versions();
        if let Some(token) = next_token.take() {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        versions.extend(
            response
                .cluster_versions()
                .iter()
                .filter_map(|v| v.cluster_version())
                .map(ToString::to_string),
        );

        next_token = response.next_token().map(ToString::to_string);
        if next_token.is_none() {
            break;
        }
    }

    Ok(versions)
}

pub async fn describe_cluster(client: &Client, cluster_name: &str) -> Result<ClusterInfo> {
    debug!(cluster = cluster_name, "Describing cluster");

    let response = client
        .describe_cluster()
        .name(cluster_name)
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let cluster = response
        .cluster()
        .ok_or_else(|| ReconcileError::ClusterNotFound(cluster_name.to_string()))?;

    Ok(ClusterInfo {
        name: cluster.name().unwrap_or(cluster_name).to_string(),
        version: cluster.version().map(ToString::to_string),
        tags: cluster.tags().cloned().unwrap_or_default(),
    })
}

/// Start a control plane upgrade and return the update id.
pub async fn update_cluster_version(
    client: &Client,
    cluster_name: &str,
    target_version: &str,
) -> Result<String> {
    debug!(
        cluster = cluster_name,
        target_version, "Updating control plane version"
    );

    let response = client
        .update_cluster_version()
        .name(cluster_name)
        .version(target_version)
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let update_id = response
        .update()
        .and_then(|u| u.id())
        .map(ToString::to_string)
        .unwrap_or_default();

    debug!(cluster = cluster_name, update_id = %update_id, "Control plane update initiated");
    Ok(update_id)
}
