//! Managed node group reconciliation.
//!
//! Node groups must run the cluster's exact Kubernetes version.

use tracing::{info, warn};

use crate::eligibility::{self, Decision};
use crate::error::Result;
use crate::outcome::{NodeGroupOutcome, NodeGroupStatus};
use crate::reconciler::Context;

/// Reconcile all managed node groups. Only a listing failure is returned as an error.
pub async fn reconcile(
    ctx: &Context<'_>,
    cluster_name: &str,
    cluster_version: &str,
) -> Result<Vec<NodeGroupOutcome>> {
    let provider = ctx.provider;
    let names = ctx
        .retry
        .run("list_nodegroups", || provider.list_nodegroups(cluster_name))
        .await?;

    let mut outcomes = Vec::with_capacity(names.len());
    for nodegroup_name in &names {
        let outcome = reconcile_nodegroup(ctx, cluster_name, nodegroup_name, cluster_version).await;
        if outcome.status == NodeGroupStatus::Failed {
            warn!(
                cluster = cluster_name,
                nodegroup = %nodegroup_name,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Node group reconciliation failed"
            );
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

async fn reconcile_nodegroup(
    ctx: &Context<'_>,
    cluster_name: &str,
    nodegroup_name: &str,
    cluster_version: &str,
) -> NodeGroupOutcome {
    let provider = ctx.provider;

    let nodegroup = match ctx
        .retry
        .run("describe_nodegroup", || {
            provider.describe_nodegroup(cluster_name, nodegroup_name)
        })
        .await
    {
        Ok(nodegroup) => nodegroup,
        Err(e) => return NodeGroupOutcome::failed(nodegroup_name, e.to_string()),
    };

    let mut outcome = NodeGroupOutcome::new(nodegroup_name, NodeGroupStatus::UpToDate);
    outcome.current_version.clone_from(&nodegroup.version);
    outcome.ami_release.clone_from(&nodegroup.release_version);

    match eligibility::evaluate_nodegroup(&nodegroup, cluster_version) {
        Decision::Skipped { reason } => {
            info!(
                cluster = cluster_name,
                nodegroup = nodegroup_name,
                reason = %reason,
                "Node group skipped"
            );
            outcome.status = NodeGroupStatus::Skipped;
            outcome.error = Some(reason.to_string());
        }
        Decision::Eligible { target } if ctx.auto_upgrade.nodegroups => {
            let result = ctx
                .retry
                .run("request_nodegroup_version_change", || {
                    provider.request_nodegroup_version_change(cluster_name, nodegroup_name, &target)
                })
                .await;
            match result {
                Ok(update_id) => {
                    info!(
                        cluster = cluster_name,
                        nodegroup = nodegroup_name,
                        from = nodegroup.current_version(),
                        to = %target,
                        update_id = %update_id,
                        "Node group update initiated"
                    );
                    outcome.status = NodeGroupStatus::Updating;
                    outcome.update_id = Some(update_id);
                }
                Err(e) => {
                    outcome.status = NodeGroupStatus::Failed;
                    outcome.error = Some(e.to_string());
                }
            }
            outcome.target_version = Some(target);
        }
        Decision::Eligible { target } => {
            info!(
                cluster = cluster_name,
                nodegroup = nodegroup_name,
                from = nodegroup.current_version(),
                to = %target,
                "Node group update available"
            );
            outcome.status = NodeGroupStatus::UpdateAvailable;
            outcome.target_version = Some(target);
        }
        Decision::UpToDate | Decision::Blocked { .. } => {}
    }

    outcome
}
