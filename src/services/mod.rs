//! External service contracts.
//!
//! The pipeline delegates its two hard problems — document layout analysis
//! and summarization — to managed services behind narrow request/response
//! contracts. Activities depend only on the traits here; the HTTP clients
//! in [`analysis`] and [`completion`] are the production implementations,
//! and tests substitute in-process stubs.
//!
//! * [`AnalysisService`] — raw document bytes + locale in, ordered pages of
//!   ordered text lines out.
//! * [`CompletionService`] — a filled prompt plus a named model deployment
//!   in, a structured JSON response out. The JSON is returned unchanged;
//!   the summarization activity only checks that a textual `content` field
//!   is present.

use crate::error::ActivityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod completion;

pub use analysis::HttpAnalysisClient;
pub use completion::HttpCompletionClient;

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedLine {
    pub content: String,
}

/// One page, lines in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedPage {
    #[serde(default)]
    pub lines: Vec<AnalyzedLine>,
}

/// Full analysis result, pages in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub pages: Vec<AnalyzedPage>,
}

/// Document-analysis service: layout analysis over raw document bytes.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, document: &[u8], locale: &str) -> Result<AnalysisResult, ActivityError>;
}

/// Text-completion service addressed by model deployment name.
///
/// Returns the service's response parsed as JSON but otherwise untouched,
/// so callers see exactly what the deployment produced.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        deployment: &str,
    ) -> Result<serde_json::Value, ActivityError>;
}
