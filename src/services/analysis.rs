//! HTTP client for the document-analysis service.
//!
//! Wire contract: `POST {endpoint}/analyze?locale={locale}` with the raw
//! document bytes as the body and the subscription key in an `x-api-key`
//! header. The service answers with JSON in the shape of
//! [`AnalysisResult`](super::AnalysisResult): ordered pages, each an
//! ordered list of `{ "content": … }` lines.

use crate::error::ActivityError;
use crate::services::{AnalysisResult, AnalysisService};
use async_trait::async_trait;
use tracing::debug;

const SERVICE: &str = "analysis";

pub struct HttpAnalysisClient {
    http: reqwest::Client,
    endpoint: String,
    key: String,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: trim_trailing_slash(endpoint.into()),
            key: key.into(),
        }
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, document: &[u8], locale: &str) -> Result<AnalysisResult, ActivityError> {
        let url = format!("{}/analyze", self.endpoint);
        debug!(bytes = document.len(), locale, "analysis request");

        let response = self
            .http
            .post(&url)
            .query(&[("locale", locale)])
            .header("x-api-key", &self.key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(document.to_vec())
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
            .json::<AnalysisResult>()
            .await
            .map_err(|e| ActivityError::MalformedResponse {
                service: SERVICE,
                detail: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client = HttpAnalysisClient::new("https://analysis.example.com///", "key");
        assert_eq!(client.endpoint, "https://analysis.example.com");
    }

    #[test]
    fn result_deserializes_with_missing_lines() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"pages":[{},{"lines":[{"content":"Hi"}]}]}"#).unwrap();
        assert_eq!(result.pages.len(), 2);
        assert!(result.pages[0].lines.is_empty());
        assert_eq!(result.pages[1].lines[0].content, "Hi");
    }
}
