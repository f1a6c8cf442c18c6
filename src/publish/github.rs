//! GitHub issues

use crate::config::PublishConfig;
use crate::publish::{IssuePublisher, IssueRef};
use crate::PublishError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const CLIENT_NAME: &str = concat!("sumi-audit/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [&'a str],
}

#[derive(Deserialize)]
struct CreatedIssue {
    number: u64,
    html_url: String,
}

/// Creates issues through the GitHub REST API
pub struct GitHubPublisher {
    client: Client,
    endpoint: String,
    token: String,
}

impl GitHubPublisher {
    /// Builds a publisher from configuration
    ///
    /// # Returns
    ///
    /// `Err(PublishError::NotConfigured)` unless publishing is enabled and
    /// both a token and a repository are set.
    pub fn from_config(config: &PublishConfig) -> Result<Self, PublishError> {
        if !config.is_configured() {
            return Err(PublishError::NotConfigured);
        }
        let (Some(token), Some(repository)) = (
            config.github_token.as_deref(),
            config.github_repository.as_deref(),
        ) else {
            return Err(PublishError::NotConfigured);
        };

        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!(
                "{}/repos/{}/issues",
                config.api_url.trim_end_matches('/'),
                repository.trim_matches('/')
            ),
            token: token.to_string(),
        })
    }

    /// The issues endpoint this publisher posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IssuePublisher for GitHubPublisher {
    async fn publish(
        &self,
        title: &str,
        body: &str,
        labels: &[&str],
    ) -> Result<IssueRef, PublishError> {
        tracing::debug!("Creating issue '{}' at {}", title, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_NAME)
            .json(&NewIssue {
                title,
                body,
                labels,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedIssue = response.json().await?;
        tracing::info!("Created issue #{}: {}", created.number, created.html_url);

        Ok(IssueRef {
            number: created.number,
            url: created.html_url,
        })
    }
}
