//! evr - EKS version reconciler entry point.
//!
//! Runs one reconciliation pass and prints the run summary as JSON.

use anyhow::{Context as _, Result};
use tracing::{error, info, warn};

use eks_version_reconciler::aws::AwsClients;
use eks_version_reconciler::config::{Config, Settings};
use eks_version_reconciler::eks::EksProvider;
use eks_version_reconciler::notify::NotifierSet;
use eks_version_reconciler::reconciler::{Context, Reconciler};
use eks_version_reconciler::{BUILD_DATE, COMMIT, VERSION, logging};

#[tokio::main]
async fn main() {
    let config = Config::from_args();
    logging::init(&config.log_format, &config.log_level);

    info!(
        "Starting evr v{} (commit: {}, build: {})",
        VERSION, COMMIT, BUILD_DATE
    );

    let settings = match config.into_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(settings).await {
        error!("Reconciliation failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<()> {
    let aws = AwsClients::new(
        settings.region.as_deref(),
        settings.assume_role_arn.as_deref(),
    )
    .await?;
    settings.display(&aws.region);

    match aws.verify_identity().await {
        Ok(identity) => info!(
            account_id = %identity.account_id,
            arn = %identity.arn,
            "AWS identity verified"
        ),
        Err(e) => warn!(error = %e, "Could not verify AWS identity"),
    }

    let provider = EksProvider::new(aws.eks.clone());
    let notifier = NotifierSet::from_settings(&settings, aws.sns.clone());
    let ctx = Context {
        provider: &provider,
        retry: settings.retry,
        auto_upgrade: settings.auto_upgrade,
    };

    let summary = Reconciler::new(ctx, &notifier, settings.filter.clone())
        .run()
        .await;

    let json =
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
    println!("{json}");
    Ok(())
}
