//! EKS Cluster Insights operations.

use aws_sdk_eks::Client;
use aws_sdk_eks::types::{Category, InsightsFilter};
use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::provider::ReadinessCheck;

/// List upgrade-readiness insights for a cluster.
///
/// Other insight categories never gate an upgrade and are filtered server-side.
pub async fn list_upgrade_insights(
    client: &Client,
    cluster_name: &str,
) -> Result<Vec<ReadinessCheck>> {
    let filter = InsightsFilter::builder()
        .categories(Category::UpgradeReadiness)
        .build();

    let mut checks = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let mut request = client
            .list_insights()
            .cluster_name(cluster_name)
            .filter(filter.clone());
        if let Some(token) = next_token.take() {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        for insight in response.insights() {
            let status = insight
                .insight_status()
                .and_then(|s| s.status())
                .map_or_else(|| "UNKNOWN".to_string(), |s| s.as_str().to_string());

            checks.push(ReadinessCheck {
                name: insight
                    .name()
                    .or_else(|| insight.id())
                    .unwrap_or("unnamed insight")
                    .to_string(),
                status,
            });
        }

        next_token = response.next_token().map(ToString::to_string);
        if next_token.is_none() {
            break;
        }
    }

    debug!(
        cluster = cluster_name,
        total = checks.len(),
        failing = checks.iter().filter(|c| !c.is_passing()).count(),
        "Fetched upgrade readiness insights"
    );
    Ok(checks)
}
