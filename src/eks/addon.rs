//! EKS Add-on operations.

use aws_sdk_eks::Client;
use aws_sdk_eks::types::{AddonPodIdentityAssociations, ResolveConflicts};
use tracing::{debug, info};

use crate::error::{ReconcileError, Result};
use crate::provider::{AddonAuthMetadata, AddonInfo, AddonUpdateRequest, IdentityAssociation};
use crate::version;

/// List all add-on names installed on a cluster.
pub async fn list_addons(client: &Client, cluster_name: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut request = client.list_addons().cluster_name(cluster_name);
        if let Some(token) = next_token.take() {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        names.extend(response.addons().iter().cloned());

        next_token = response.next_token().map(ToString::to_string);
        if next_token.is_none() {
            break;
        }
    }

    debug!(cluster = cluster_name, "Found {} add-ons", names.len());
    Ok(names)
}

/// Describe an add-on, resolving its pod identity associations.
pub async fn describe_addon(
    client: &Client,
    cluster_name: &str,
    addon_name: &str,
) -> Result<AddonInfo> {
    debug!(cluster = cluster_name, addon = addon_name, "Describing add-on");

    let response = client
        .describe_addon()
        .cluster_name(cluster_name)
        .addon_name(addon_name)
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let addon = response.addon().ok_or_else(|| {
        ReconcileError::InvalidRequest(format!("add-on {addon_name} not found in {cluster_name}"))
    })?;

    let mut pod_identity_associations = Vec::new();
    for association_arn in addon.pod_identity_associations() {
        pod_identity_associations
            .push(describe_pod_identity_association(client, cluster_name, association_arn).await?);
    }

    Ok(AddonInfo {
        name: addon.addon_name().unwrap_or(addon_name).to_string(),
        version: addon.addon_version().unwrap_or_default().to_string(),
        auth: AddonAuthMetadata {
            pod_identity_associations,
            service_account_role_arn: addon.service_account_role_arn().map(ToString::to_string),
        },
    })
}

/// Resolve an association ARN (`.../a-xxxx`) to its service account and role.
async fn describe_pod_identity_association(
    client: &Client,
    cluster_name: &str,
    association_arn: &str,
) -> Result<IdentityAssociation> {
    let association_id = association_arn
        .rsplit('/')
        .next()
        .unwrap_or(association_arn);

    let response = client
        .describe_pod_identity_association()
        .cluster_name(cluster_name)
        .association_id(association_id)
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let association = response.association().ok_or_else(|| {
        ReconcileError::InvalidRequest(format!(
            "pod identity association {association_id} not found"
        ))
    })?;

    match (association.service_account(), association.role_arn()) {
        (Some(service_account), Some(role_arn)) => Ok(IdentityAssociation {
            service_account: service_account.to_string(),
            role_arn: role_arn.to_string(),
        }),
        _ => Err(ReconcileError::InvalidRequest(format!(
            "pod identity association {association_id} has no service account or role"
        ))),
    }
}

/// Add-on versions compatible with a Kubernetes version, newest first.
pub async fn get_compatible_versions(
    client: &Client,
    addon_name: &str,
    k8s_version: &str,
) -> Result<Vec<String>> {
    debug!(
        addon = addon_name,
        k8s_version, "Getting compatible add-on versions"
    );

    let mut versions = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut request = client
            .describe_addon_versions()
            .addon_name(addon_name)
            .kubernetes_version(k8s_version);
        if let Some(token) = next_token.take() {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        for addon in response.addons() {
            versions.extend(
                addon
                    .addon_versions()
                    .iter()
                    .filter_map(|v| v.addon_version())
                    .map(ToString::to_string),
            );
        }

        next_token = response.next_token().map(ToString::to_string);
        if next_token.is_none() {
            break;
        }
    }

    version::sort_newest_first(&mut versions);
    Ok(versions)
}

/// Update an add-on, carrying its authentication binding forward.
pub async fn update_addon(client: &Client, request: &AddonUpdateRequest) -> Result<String> {
    info!(
        cluster = %request.cluster_name,
        addon = %request.addon_name,
        target_version = %request.addon_version,
        "Updating add-on"
    );

    let mut call = client
        .update_addon()
        .cluster_name(&request.cluster_name)
        .addon_name(&request.addon_name)
        .addon_version(&request.addon_version)
        .resolve_conflicts(ResolveConflicts::Overwrite);

    if let Some(associations) = &request.pod_identity_associations {
        for association in associations {
            let entry = AddonPodIdentityAssociations::builder()
                .service_account(&association.service_account)
                .role_arn(&association.role_arn)
                .build()
                .map_err(|e| ReconcileError::InvalidRequest(e.to_string()))?;
            call = call.pod_identity_associations(entry);
        }
    }
    if let Some(role_arn) = &request.service_account_role_arn {
        call = call.service_account_role_arn(role_arn);
    }

    let response = call
        .send()
        .await
        .map_err(|e| ReconcileError::aws(module_path!(), e))?;

    let update_id = response
        .update()
        .and_then(|u| u.id())
        .map(ToString::to_string)
        .unwrap_or_default();

    debug!(addon = %request.addon_name, update_id = %update_id, "Add-on update initiated");
    Ok(update_id)
}
