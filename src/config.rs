//! Command line and environment configuration.

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use secrecy::SecretString;

use crate::error::{ReconcileError, Result};
use crate::filter::EnvironmentFilter;
use crate::retry::RetryExecutor;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "evr",
    version,
    long_version = crate::LONG_VERSION,
    about = "Reconcile EKS cluster, add-on and node group versions"
)]
pub struct Config {
    /// SNS topic receiving one summary per cluster
    #[arg(long, env = "SNS_TOPIC_ARN")]
    pub sns_topic_arn: Option<String>,

    /// Slack Incoming Webhook URL receiving one summary per cluster
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    /// Comma-separated substrings matched against cluster names and Environment tags (`*` = all)
    #[arg(long, env = "TARGET_ENVIRONMENTS", default_value = "dev,development")]
    pub target_environments: String,

    /// Apply eligible upgrades instead of only reporting them
    #[arg(long, env = "ENABLE_AUTO_UPGRADE", default_value = "false", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub enable_auto_upgrade: bool,

    /// Override auto-upgrade for cluster control planes
    #[arg(long, env = "CLUSTER_AUTO_UPGRADE", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub cluster_auto_upgrade: Option<bool>,

    /// Override auto-upgrade for add-ons
    #[arg(long, env = "ADDON_AUTO_UPGRADE", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub addon_auto_upgrade: Option<bool>,

    /// Override auto-upgrade for managed node groups
    #[arg(long, env = "NODEGROUP_AUTO_UPGRADE", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub nodegroup_auto_upgrade: Option<bool>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// IAM role to assume for cross-account access
    #[arg(long, env = "ASSUME_ROLE_ARN")]
    pub assume_role_arn: Option<String>,

    /// Attempts per provider call when throttled
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Backoff base delay in milliseconds (doubles per attempt)
    #[arg(long, env = "RETRY_BASE_DELAY_MS", default_value = "1000")]
    pub retry_base_delay_ms: u64,

    /// Log format: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Which resource kinds are upgraded rather than only reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoUpgrade {
    pub clusters: bool,
    pub addons: bool,
    pub nodegroups: bool,
}

impl AutoUpgrade {
    pub const fn all(enabled: bool) -> Self {
        Self {
            clusters: enabled,
            addons: enabled,
            nodegroups: enabled,
        }
    }

    /// Per-kind overrides fall back to the global toggle.
    pub fn resolve(
        global: bool,
        clusters: Option<bool>,
        addons: Option<bool>,
        nodegroups: Option<bool>,
    ) -> Self {
        Self {
            clusters: clusters.unwrap_or(global),
            addons: addons.unwrap_or(global),
            nodegroups: nodegroups.unwrap_or(global),
        }
    }
}

/// Validated runtime settings.
#[derive(Debug)]
pub struct Settings {
    pub sns_topic_arn: Option<String>,
    pub slack_webhook_url: Option<SecretString>,
    pub filter: EnvironmentFilter,
    pub auto_upgrade: AutoUpgrade,
    pub region: Option<String>,
    pub assume_role_arn: Option<String>,
    pub retry: RetryExecutor,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate into [`Settings`]. A notification destination is mandatory.
    pub fn into_settings(self) -> Result<Settings> {
        let sns_topic_arn = non_empty(self.sns_topic_arn);
        let slack_webhook_url = non_empty(self.slack_webhook_url);

        if sns_topic_arn.is_none() && slack_webhook_url.is_none() {
            return Err(ReconcileError::ConfigurationMissing(
                "SNS_TOPIC_ARN or SLACK_WEBHOOK_URL must be set".to_string(),
            ));
        }

        Ok(Settings {
            sns_topic_arn,
            slack_webhook_url: slack_webhook_url.map(SecretString::from),
            filter: EnvironmentFilter::parse(&self.target_environments),
            auto_upgrade: AutoUpgrade::resolve(
                self.enable_auto_upgrade,
                self.cluster_auto_upgrade,
                self.addon_auto_upgrade,
                self.nodegroup_auto_upgrade,
            ),
            region: non_empty(self.region),
            assume_role_arn: non_empty(self.assume_role_arn),
            retry: RetryExecutor::new(
                self.max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
        })
    }
}

impl Settings {
    pub fn display(&self, actual_region: &str) {
        let filter_info = if self.filter.is_match_all() {
            "ALL clusters".to_string()
        } else {
            self.filter.targets().join(",")
        };

        tracing::info!(
            region = actual_region,
            target_environments = %filter_info,
            cluster_auto_upgrade = self.auto_upgrade.clusters,
            addon_auto_upgrade = self.auto_upgrade.addons,
            nodegroup_auto_upgrade = self.auto_upgrade.nodegroups,
            sns = self.sns_topic_arn.is_some(),
            slack = self.slack_webhook_url.is_some(),
            max_attempts = self.retry.max_attempts(),
            assume_role = self.assume_role_arn.as_deref().unwrap_or("none"),
            "Configuration initialized"
        );

        if self.auto_upgrade == AutoUpgrade::all(false) {
            tracing::warn!("Auto-upgrade disabled - eligible upgrades are only reported");
        }
    }
}
