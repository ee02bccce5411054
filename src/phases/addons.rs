//! Add-on reconciliation.
//!
//! Every add-on is evaluated independently; one failure never aborts the rest.

use tracing::{info, warn};

use crate::auth::{AuthBinding, AuthKind};
use crate::eligibility::{self, Decision};
use crate::error::Result;
use crate::outcome::{AddonOutcome, AddonStatus};
use crate::provider::AddonUpdateRequest;
use crate::reconciler::Context;

/// Reconcile all add-ons against the cluster's current Kubernetes version.
///
/// Only a failure to list add-ons is returned as an error.
pub async fn reconcile(
    ctx: &Context<'_>,
    cluster_name: &str,
    k8s_version: &str,
) -> Result<Vec<AddonOutcome>> {
    let provider = ctx.provider;
    let names = ctx
        .retry
        .run("list_addons", || provider.list_addons(cluster_name))
        .await?;

    let mut outcomes = Vec::with_capacity(names.len());
    for addon_name in &names {
        let outcome = reconcile_addon(ctx, cluster_name, addon_name, k8s_version).await;
        if let Some(error) = &outcome.error {
            warn!(
                cluster = cluster_name,
                addon = %addon_name,
                error = %error,
                "Add-on reconciliation failed"
            );
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

async fn reconcile_addon(
    ctx: &Context<'_>,
    cluster_name: &str,
    addon_name: &str,
    k8s_version: &str,
) -> AddonOutcome {
    let provider = ctx.provider;

    let addon = match ctx
        .retry
        .run("describe_addon", || provider.describe_addon(cluster_name, addon_name))
        .await
    {
        Ok(addon) => addon,
        Err(e) => {
            return AddonOutcome::failed(addon_name, "unknown", AuthKind::None, e.to_string());
        }
    };

    let binding = AuthBinding::extract(&addon);
    let auth = binding.kind();

    let versions = match ctx
        .retry
        .run("list_compatible_addon_versions", || {
            provider.list_compatible_addon_versions(cluster_name, addon_name, k8s_version)
        })
        .await
    {
        Ok(versions) => versions,
        Err(e) => return AddonOutcome::failed(addon_name, &addon.version, auth, e.to_string()),
    };

    let latest = versions.first().map(String::as_str);
    let target = match eligibility::evaluate_addon(&addon.version, latest) {
        Decision::Eligible { target } => target,
        _ => return AddonOutcome::new(addon_name, AddonStatus::UpToDate, &addon.version, auth),
    };

    if !ctx.auto_upgrade.addons {
        info!(
            cluster = cluster_name,
            addon = addon_name,
            from = %addon.version,
            to = %target,
            "Add-on update available"
        );
        return AddonOutcome::new(addon_name, AddonStatus::UpdateAvailable, &addon.version, auth)
            .with_target(&target);
    }

    let mut request = AddonUpdateRequest::new(cluster_name, addon_name, &target);
    binding.apply(&mut request);

    match ctx
        .retry
        .run("request_addon_update", || provider.request_addon_update(&request))
        .await
    {
        Ok(update_id) => {
            info!(
                cluster = cluster_name,
                addon = addon_name,
                from = %addon.version,
                to = %target,
                auth = %auth,
                update_id = %update_id,
                "Add-on update initiated"
            );
            let mut outcome =
                AddonOutcome::new(addon_name, AddonStatus::Updated, &addon.version, auth)
                    .with_target(&target);
            outcome.update_id = Some(update_id);
            outcome
        }
        Err(e) => AddonOutcome::failed(addon_name, &addon.version, auth, e.to_string())
            .with_target(&target),
    }
}
