//! Slack notification support via Incoming Webhooks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use super::Notifier;

/// Slack caps header blocks at 150 characters.
const MAX_HEADER_LEN: usize = 150;
/// Section text is capped at 3000 characters; leave room for the code fence.
const MAX_SECTION_LEN: usize = 2900;

/// Slack webhook client.
pub struct SlackNotifier {
    webhook_url: SecretString,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: SecretString) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let payload = build_blocks_payload(subject, body);
        let resp = self
            .client
            .post(self.webhook_url.expose_secret())
            .json(&payload)
            .send()
            .await
            .context("Failed to send Slack webhook request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Slack webhook returned status {status}");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "slack"
    }
}

/// Split `text` into pieces of at most `max` characters, preferring line breaks.
fn chunk_lines(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line_len = line.chars().count();
        if !current.is_empty() && current.chars().count() + line_len + 1 > max {
            chunks.push(std::mem::take(&mut current));
        }
        if line_len > max {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Build a Slack Block Kit payload: header, one code section per body chunk.
fn build_blocks_payload(subject: &str, body: &str) -> Value {
    let header: String = subject.chars().take(MAX_HEADER_LEN).collect();
    let mut blocks: Vec<Value> = Vec::new();

    blocks.push(json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": header,
            "emoji": true
        }
    }));

    for chunk in chunk_lines(body, MAX_SECTION_LEN) {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("```{chunk}```")
            }
        }));
    }

    blocks.push(json!({"type": "divider"}));

    // Fallback text for clients that don't support blocks
    json!({
        "text": subject,
        "blocks": blocks
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_blocks_payload_structure() {
        let payload = build_blocks_payload(
            "EKS Upgrade Summary - dev - All Up-to-Date",
            "Cluster: dev\nCluster Status: up_to_date",
        );
        let blocks = payload["blocks"].as_array().unwrap();

        // header, section, divider
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(
            blocks[0]["text"]["text"],
            "EKS Upgrade Summary - dev - All Up-to-Date"
        );
        assert_eq!(blocks[1]["type"], "section");
        assert_eq!(
            blocks[1]["text"]["text"],
            "```Cluster: dev\nCluster Status: up_to_date```"
        );
        assert_eq!(blocks[2]["type"], "divider");
        assert_eq!(
            payload["text"],
            "EKS Upgrade Summary - dev - All Up-to-Date"
        );
    }

    #[test]
    fn test_build_blocks_payload_empty_body() {
        let payload = build_blocks_payload("H", "");
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["type"], "divider");
    }

    #[test]
    fn test_chunk_lines_respects_limit() {
        let body = (0..100)
            .map(|i| format!("  addon-{i} (v1.0.0-eksbuild.1) - None"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunk_lines(&body, 200);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 200));
        assert_eq!(chunks.join("\n"), body);
    }

    #[test]
    fn test_chunk_lines_splits_long_line() {
        let chunks = chunk_lines(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "xxxxx");
    }

    #[tokio::test]
    async fn test_send_posts_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/T000/B000/XXX"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/services/T000/B000/XXX", server.uri());
        let notifier = SlackNotifier::new(SecretString::from(url));
        notifier.send("subject", "body").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new(SecretString::from(server.uri()));
        let err = notifier.send("subject", "body").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
