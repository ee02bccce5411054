//! Control plane decision: up to date, blocked, available or upgrading.

use tracing::info;

use crate::eligibility::{self, BlockReason, Decision};
use crate::error::Result;
use crate::outcome::{ClusterOutcome, ClusterStatus};
use crate::provider::ClusterInfo;
use crate::reconciler::Context;
use crate::version;

/// Decide the cluster-level outcome. An error here aborts the rest of the cluster.
pub async fn reconcile(
    ctx: &Context<'_>,
    cluster: &ClusterInfo,
    available: &[String],
    latest_available: Option<&str>,
) -> Result<ClusterOutcome> {
    let name = cluster.name.as_str();
    let current = cluster.version.clone();

    let next = current
        .as_deref()
        .and_then(|v| version::next_step(v, available));
    let (Some(current_version), Some(_)) = (current.as_deref(), next) else {
        info!(cluster = name, "Cluster is up to date");
        let mut outcome = ClusterOutcome::new(name, ClusterStatus::UpToDate, current);
        outcome.latest_available = latest_available.map(ToString::to_string);
        return Ok(outcome);
    };

    let provider = ctx.provider;
    let checks = ctx
        .retry
        .run("list_upgrade_insights", || provider.list_upgrade_insights(name))
        .await?;

    match eligibility::evaluate_cluster(current_version, available, &checks) {
        Decision::Blocked { target, reason } => {
            let mut outcome = ClusterOutcome::new(name, ClusterStatus::Blocked, current);
            outcome.target_version = Some(target);
            if let BlockReason::FailingReadinessChecks { names, .. } = reason {
                info!(
                    cluster = name,
                    failing = names.len(),
                    "Cluster upgrade blocked by readiness checks"
                );
                outcome.failing_checks = names;
            }
            Ok(outcome)
        }
        Decision::Eligible { target } if ctx.auto_upgrade.clusters => {
            let update_id = ctx
                .retry
                .run("request_cluster_version_change", || {
                    provider.request_cluster_version_change(name, &target)
                })
                .await?;
            info!(
                cluster = name,
                from = current_version,
                to = %target,
                update_id = %update_id,
                "Cluster upgrade initiated"
            );
            let mut outcome = ClusterOutcome::new(name, ClusterStatus::Upgrading, current);
            outcome.target_version = Some(target);
            outcome.update_id = Some(update_id);
            Ok(outcome)
        }
        Decision::Eligible { target } => {
            info!(
                cluster = name,
                from = current_version,
                to = %target,
                "Cluster upgrade available"
            );
            let mut outcome = ClusterOutcome::new(name, ClusterStatus::Available, current);
            outcome.target_version = Some(target);
            Ok(outcome)
        }
        Decision::UpToDate | Decision::Skipped { .. } => {
            let mut outcome = ClusterOutcome::new(name, ClusterStatus::UpToDate, current);
            outcome.latest_available = latest_available.map(ToString::to_string);
            Ok(outcome)
        }
    }
}
