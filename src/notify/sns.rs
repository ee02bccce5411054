//! Amazon SNS topic notifications.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::Notifier;
use crate::error::ReconcileError;

/// SNS rejects subjects of 100 characters or more.
pub const MAX_SUBJECT_LEN: usize = 99;

pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub const fn new(client: aws_sdk_sns::Client, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }
}

/// Trim a subject to the SNS limit, keeping it on one line.
pub fn sanitize_subject(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(MAX_SUBJECT_LEN)
        .collect()
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        debug!(topic_arn = %self.topic_arn, "Publishing SNS message");

        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(sanitize_subject(subject))
            .message(body)
            .send()
            .await
            .map_err(|e| ReconcileError::aws(module_path!(), e))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "sns"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_subject_truncates() {
        let long = format!("EKS Upgrade Summary - {} - 1 Failed", "c".repeat(120));
        let subject = sanitize_subject(&long);
        assert_eq!(subject.chars().count(), MAX_SUBJECT_LEN);
        assert!(subject.starts_with("EKS Upgrade Summary - ccc"));
    }

    #[test]
    fn test_sanitize_subject_strips_newlines() {
        assert_eq!(sanitize_subject("a\nb\tc"), "a b c");
        assert_eq!(
            sanitize_subject("EKS Upgrade Summary - dev - All Up-to-Date"),
            "EKS Upgrade Summary - dev - All Up-to-Date"
        );
    }
}
