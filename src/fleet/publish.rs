use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::Config;

/// Delivery of action messages to robots over the fleet message bus. Delivery
/// is at-least-once; robots are expected to tolerate duplicates.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
}

/// Publishes through the bus's HTTP data plane: `POST {base}/topics/{topic}?qos=1`.
pub struct HttpPublisher {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpPublisher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Bus endpoint and optional token from `config`.
    pub fn from_config(config: &Config) -> Self {
        let publisher = Self::new(config.publish_url());
        match config.publish_token() {
            Some(token) => {
                publisher.with_token(SecretString::from(token.expose_secret().to_string()))
            }
            None => publisher,
        }
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/topics/{}?qos=1", self.base_url, topic)
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let mut request = self
            .client
            .post(self.topic_url(topic))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_string());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        request
            .send()
            .await
            .with_context(|| format!("failed to reach message bus for topic {}", topic))?
            .error_for_status()
            .with_context(|| format!("message bus rejected publish to {}", topic))?;

        tracing::debug!(topic, "published message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_url_keeps_qos_one() {
        let publisher = HttpPublisher::new("http://bus.local:8080/");
        assert_eq!(
            publisher.topic_url("robot_3/topic"),
            "http://bus.local:8080/topics/robot_3/topic?qos=1"
        );
    }

    #[test]
    fn token_comes_from_config() {
        let config = Config::builder()
            .with_publish_url("http://bus.local:8080")
            .with_publish_token("bus-token")
            .build();
        let publisher = HttpPublisher::from_config(&config);
        assert_eq!(publisher.base_url, "http://bus.local:8080");
        assert_eq!(publisher.token.as_ref().map(|t| t.expose_secret()), Some("bus-token"));

        let anonymous = HttpPublisher::from_config(&Config::new());
        assert!(anonymous.token.is_none());
    }
}
