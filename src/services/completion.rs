//! HTTP client for the text-completion service.
//!
//! Wire contract: `POST {endpoint}/completions` with a bearer key and a
//! JSON body `{ "prompt": …, "deployment": … }`. The response body is
//! parsed as JSON and returned unchanged; the summarization activity
//! decides whether it is usable.

use crate::error::ActivityError;
use crate::services::CompletionService;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

const SERVICE: &str = "completion";

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    deployment: &'a str,
}

pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    key: String,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            http: reqwest::Client::new(),
            endpoint,
            key: key.into(),
        }
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        deployment: &str,
    ) -> Result<serde_json::Value, ActivityError> {
        let url = format!("{}/completions", self.endpoint);
        debug!(deployment, prompt_len = prompt.len(), "completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.key)
            .json(&CompletionRequest { prompt, deployment })
            .send()
            .await
            .map_err(|e| ActivityError::Service {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ActivityError::Service {
                service: SERVICE,
                detail: format!("HTTP {status}: {body}"),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ActivityError::MalformedResponse {
                service: SERVICE,
                detail: e.to_string(),
            })
    }
}
