//! AWS client factory with optional cross-account AssumeRole support.

use anyhow::{Context, Result};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use tracing::{debug, info};

const SESSION_NAME: &str = "eks-version-reconciler";

/// Caller identity returned by STS.
#[derive(Debug, Clone)]
pub struct AwsIdentity {
    pub account_id: String,
    pub arn: String,
}

/// AWS service clients sharing one credential chain.
#[derive(Clone)]
pub struct AwsClients {
    pub eks: aws_sdk_eks::Client,
    pub sns: aws_sdk_sns::Client,
    pub sts: aws_sdk_sts::Client,
    pub region: String,
}

impl AwsClients {
    /// Create clients from the default credential chain.
    ///
    /// `region` falls back to the chain's region when unset. When
    /// `assume_role_arn` is given, STS AssumeRole credentials are used instead.
    pub async fn new(region: Option<&str>, assume_role_arn: Option<&str>) -> Result<Self> {
        let base = load_base_config(region).await;
        let config = match assume_role_arn {
            Some(role_arn) => assume_role_config(&base, role_arn).await?,
            None => base,
        };

        let region = config
            .region()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        debug!(region = %region, "AWS clients created");

        Ok(Self {
            eks: aws_sdk_eks::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
            region,
        })
    }

    /// Verify credentials by calling STS GetCallerIdentity.
    pub async fn verify_identity(&self) -> Result<AwsIdentity> {
        let resp = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .context("STS GetCallerIdentity failed")?;

        Ok(AwsIdentity {
            account_id: resp.account().unwrap_or("unknown").to_string(),
            arn: resp.arn().unwrap_or("unknown").to_string(),
        })
    }
}

/// SDK-level retries are disabled; throttling is retried by `RetryExecutor` only.
fn config_loader() -> ConfigLoader {
    aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled())
}

async fn load_base_config(region: Option<&str>) -> SdkConfig {
    let mut loader = config_loader();
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

async fn assume_role_config(base: &SdkConfig, role_arn: &str) -> Result<SdkConfig> {
    info!(role_arn, "Assuming role for cross-account access");

    let sts = aws_sdk_sts::Client::new(base);
    let assumed = sts
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(SESSION_NAME)
        .send()
        .await
        .with_context(|| format!("Failed to assume role {role_arn}"))?;

    let creds = assumed
        .credentials()
        .with_context(|| format!("AssumeRole returned no credentials for {role_arn}"))?;

    let mut loader = config_loader().credentials_provider(
        aws_sdk_sts::config::Credentials::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            Some(creds.session_token().to_string()),
            None,
            "evr-assume-role",
        ),
    );
    if let Some(region) = base.region() {
        loader = loader.region(region.clone());
    }

    debug!(role_arn, "Successfully assumed role");
    Ok(loader.load().await)
}
