//! Notification delivery for per-cluster summaries.

pub mod slack;
pub mod sns;

pub use slack::SlackNotifier;
pub use sns::SnsNotifier;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::config::Settings;

/// A destination for summary messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
    fn name(&self) -> &str;
}

/// Fans out every message to each configured backend.
#[derive(Default)]
pub struct NotifierSet {
    backends: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new(backends: Vec<Box<dyn Notifier>>) -> Self {
        Self { backends }
    }

    /// Build the backends named in `settings`.
    pub fn from_settings(settings: &Settings, sns_client: aws_sdk_sns::Client) -> Self {
        let mut backends: Vec<Box<dyn Notifier>> = Vec::new();

        if let Some(topic_arn) = &settings.sns_topic_arn {
            info!(topic_arn = %topic_arn, "SNS notifications enabled");
            backends.push(Box::new(SnsNotifier::new(sns_client, topic_arn.clone())));
        }
        if let Some(webhook_url) = &settings.slack_webhook_url {
            info!("Slack notifications enabled");
            backends.push(Box::new(SlackNotifier::new(SecretString::from(
                webhook_url.expose_secret().to_owned(),
            ))));
        }

        Self::new(backends)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Deliver to every backend. Failures are logged and never propagated.
    pub async fn deliver(&self, subject: &str, body: &str) {
        for backend in &self.backends {
            match backend.send(subject, body).await {
                Ok(()) => info!(notifier = backend.name(), subject, "Notification sent"),
                Err(e) => warn!(
                    notifier = backend.name(),
                    subject,
                    error = %e,
                    "Failed to send notification"
                ),
            }
        }
    }
}

#[async_trait]
impl Notifier for NotifierSet {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        self.deliver(subject, body).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "fanout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, subject: &str, _body: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("destination unreachable");
            }
            self.sent.lock().unwrap().push(subject.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_failing_backend_does_not_stop_others() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let set = NotifierSet::new(vec![
            Box::new(Recording {
                sent: sent.clone(),
                fail: true,
            }),
            Box::new(Recording {
                sent: sent.clone(),
                fail: false,
            }),
        ]);

        assert!(set.send("subject", "body").await.is_ok());
        assert_eq!(*sent.lock().unwrap(), vec!["subject".to_string()]);
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_set_is_noop() {
        let set = NotifierSet::default();
        assert!(set.is_empty());
        assert!(set.send("s", "b").await.is_ok());
    }
}
