//! Summarization activity: fixed prompt in, structured summary out.
//!
//! The completion service's JSON response is returned **unchanged** — the
//! activity only verifies that a textual `content` field is present, since
//! that is the one field persistence will write. Everything else the
//! deployment chose to include travels along untouched.

use crate::error::ActivityError;
use crate::prompts::summary_prompt;
use crate::services::CompletionService;
use serde_json::Value;
use tracing::{debug, info};

/// Summarize `text` through the configured deployment.
pub async fn summarize_text(
    completion: &dyn CompletionService,
    deployment: &str,
    text: &str,
) -> Result<Value, ActivityError> {
    info!(deployment, chars = text.len(), "summarizing extracted text");

    let prompt = summary_prompt(text);
    let response = completion.complete(&prompt, deployment).await?;

    match response.get("content").and_then(Value::as_str) {
        Some(content) => {
            debug!(summary_chars = content.len(), "summary received");
            Ok(response)
        }
        None => Err(ActivityError::MissingContent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    struct EchoCompletion {
        response: Value,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionService for EchoCompletion {
        async fn complete(
            &self,
            prompt: &str,
            _deployment: &str,
        ) -> Result<Value, ActivityError> {
            self.prompts.lock().await.push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn response_with_content_is_returned_unchanged() {
        let service = EchoCompletion {
            response: json!({"content": "a summary", "model": "summaries-v1", "tokens": 12}),
            prompts: Mutex::new(Vec::new()),
        };

        let summary = summarize_text(&service, "summaries-v1", "Hello World")
            .await
            .unwrap();
        assert_eq!(summary["content"], "a summary");
        assert_eq!(summary["tokens"], 12);

        let prompts = service.prompts.lock().await;
        assert_eq!(
            prompts[0],
            "Can you explain what the following text is about? Hello World"
        );
    }

    #[tokio::test]
    async fn missing_content_field_is_a_failure() {
        let service = EchoCompletion {
            response: json!({"summary": "wrong field name"}),
            prompts: Mutex::new(Vec::new()),
        };

        let err = summarize_text(&service, "summaries-v1", "text")
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::MissingContent));
    }

    #[tokio::test]
    async fn non_string_content_is_a_failure() {
        let service = EchoCompletion {
            response: json!({"content": 7}),
            prompts: Mutex::new(Vec::new()),
        };

        let err = summarize_text(&service, "summaries-v1", "text")
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::MissingContent));
    }

    #[tokio::test]
    async fn empty_text_still_submits_the_template() {
        let service = EchoCompletion {
            response: json!({"content": ""}),
            prompts: Mutex::new(Vec::new()),
        };

        summarize_text(&service, "summaries-v1", "").await.unwrap();
        let prompts = service.prompts.lock().await;
        assert_eq!(
            prompts[0],
            "Can you explain what the following text is about? "
        );
    }
}
