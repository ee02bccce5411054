//! One stateless reconciliation pass over every cluster in the region.

use tracing::{debug, error, info, warn};

use crate::config::AutoUpgrade;
use crate::filter::EnvironmentFilter;
use crate::notify::Notifier;
use crate::outcome::{ClusterOutcome, ClusterReport, RunSummary};
use crate::phases;
use crate::provider::Provider;
use crate::report;
use crate::retry::RetryExecutor;

/// Shared state handed to every phase.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub provider: &'a dyn Provider,
    pub retry: RetryExecutor,
    pub auto_upgrade: AutoUpgrade,
}

pub struct Reconciler<'a> {
    ctx: Context<'a>,
    notifier: &'a dyn Notifier,
    filter: EnvironmentFilter,
}

impl<'a> Reconciler<'a> {
    pub const fn new(
        ctx: Context<'a>,
        notifier: &'a dyn Notifier,
        filter: EnvironmentFilter,
    ) -> Self {
        Self {
            ctx,
            notifier,
            filter,
        }
    }

    /// Reconcile every matching cluster sequentially and notify once per cluster.
    ///
    /// Never fails: a listing failure is recorded in [`RunSummary::error`].
    pub async fn run(&self) -> RunSummary {
        let provider = self.ctx.provider;

        let clusters = match self
            .ctx
            .retry
            .run("list_clusters", || provider.list_clusters())
            .await
        {
            Ok(clusters) => clusters,
            Err(e) => {
                error!(error = %e, "Failed to list clusters");
                return RunSummary {
                    processed_clusters: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let available = match self
            .ctx
            .retry
            .run("list_available_versions", || provider.list_available_versions())
            .await
        {
            Ok(versions) => versions,
            Err(e) => {
                error!(error = %e, "Failed to list available cluster versions");
                return RunSummary {
                    processed_clusters: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        info!(
            clusters = clusters.len(),
            latest_available = available.first().map_or("unknown", String::as_str),
            "Starting reconciliation pass"
        );

        let mut processed = Vec::new();
        for name in &clusters {
            let Some(report) = self.reconcile_cluster(name, &available).await else {
                continue;
            };
            self.notify(&report).await;
            processed.push(report);
        }

        info!(processed = processed.len(), "Reconciliation pass completed");
        RunSummary {
            processed_clusters: processed,
            error: None,
        }
    }

    /// Returns `None` when the cluster does not match the environment filter.
    pub async fn reconcile_cluster(
        &self,
        name: &str,
        available: &[String],
    ) -> Option<ClusterReport> {
        let provider = self.ctx.provider;

        let info = match self
            .ctx
            .retry
            .run("describe_cluster", || provider.describe_cluster(name))
            .await
        {
            Ok(info) => info,
            Err(e) => {
                warn!(cluster = name, error = %e, "Failed to describe cluster");
                return Some(ClusterReport::new(ClusterOutcome::error(
                    name,
                    None,
                    e.to_string(),
                )));
            }
        };

        if !self.filter.matches(&info.name, &info.tags) {
            debug!(cluster = name, "Cluster does not match target environments");
            return None;
        }

        let latest_available = available.first().map(String::as_str);
        let result =
            phases::cluster::reconcile(&self.ctx, &info, available, latest_available).await;
        let cluster = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(cluster = name, error = %e, "Cluster reconciliation failed");
                return Some(ClusterReport::new(ClusterOutcome::error(
                    name,
                    info.version.clone(),
                    e.to_string(),
                )));
            }
        };

        let mut report = ClusterReport::new(cluster);

        // Sub-resources are checked against the version the cluster reports now,
        // even if an upgrade was just requested.
        let Some(k8s_version) = info.version.as_deref() else {
            warn!(
                cluster = name,
                "Cluster reports no version, skipping add-ons and node groups"
            );
            return Some(report);
        };

        match phases::addons::reconcile(&self.ctx, name, k8s_version).await {
            Ok(addons) => report.addons = addons,
            Err(e) => {
                warn!(cluster = name, error = %e, "Failed to list add-ons");
                report.addon_listing_error = Some(e.to_string());
            }
        }

        match phases::nodegroups::reconcile(&self.ctx, name, k8s_version).await {
            Ok(nodegroups) => report.nodegroups = nodegroups,
            Err(e) => {
                warn!(cluster = name, error = %e, "Failed to list node groups");
                report.nodegroup_listing_error = Some(e.to_string());
            }
        }

        Some(report)
    }

    async fn notify(&self, report: &ClusterReport) {
        let summary = report::summarize(report);
        let subject = summary.subject_line();
        let body = report::render_body(report, &summary);

        if let Err(e) = self.notifier.send(&subject, &body).await {
            warn!(
                cluster = report.name(),
                notifier = self.notifier.name(),
                error = %e,
                "Failed to send notification"
            );
        }
    }
}
