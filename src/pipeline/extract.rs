//! Extraction activity: fetch the uploaded document and run layout analysis.
//!
//! Output is the recognized text as one contiguous string — page order,
//! then line order within each page, with **no separators inserted**
//! between lines. Downstream summarization treats the text as a single
//! blob, so joining bytes exactly as the analysis service ordered them is
//! the whole contract. A document with zero recognized lines yields an
//! empty string, which is still a successful extraction.

use crate::error::ActivityError;
use crate::services::AnalysisService;
use crate::store::BlobStore;
use tracing::{debug, info};

/// Locale hint passed to the analysis service.
pub const DOCUMENT_LOCALE: &str = "en-US";

/// Fetch `identifier` from `container` and return its recognized text.
pub async fn extract_text(
    store: &dyn BlobStore,
    analysis: &dyn AnalysisService,
    container: &str,
    identifier: &str,
) -> Result<String, ActivityError> {
    if identifier.is_empty() {
        return Err(ActivityError::InvalidInput {
            detail: "empty document identifier".into(),
        });
    }

    info!(container, identifier, "extracting document text");
    let document = store.get(container, identifier).await?;
    let result = analysis.analyze(&document, DOCUMENT_LOCALE).await?;

    let mut full_text = String::new();
    for page in &result.pages {
        for line in &page.lines {
            full_text.push_str(&line.content);
        }
    }

    debug!(
        identifier,
        pages = result.pages.len(),
        chars = full_text.len(),
        "extraction complete"
    );
    Ok(full_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AnalysisResult, AnalyzedLine, AnalyzedPage};
    use crate::store::MemoryBlobStore;
    use async_trait::async_trait;

    struct FixedAnalysis(AnalysisResult);

    #[async_trait]
    impl AnalysisService for FixedAnalysis {
        async fn analyze(
            &self,
            _document: &[u8],
            _locale: &str,
        ) -> Result<AnalysisResult, ActivityError> {
            Ok(self.0.clone())
        }
    }

    fn page(lines: &[&str]) -> AnalyzedPage {
        AnalyzedPage {
            lines: lines
                .iter()
                .map(|l| AnalyzedLine {
                    content: l.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn concatenates_pages_then_lines_without_separators() {
        let store = MemoryBlobStore::new();
        store.put("input", "doc.pdf", b"%PDF").await.unwrap();
        let analysis = FixedAnalysis(AnalysisResult {
            pages: vec![page(&["Hello ", "World"]), page(&["!", "?"])],
        });

        let text = extract_text(&store, &analysis, "input", "doc.pdf")
            .await
            .unwrap();
        assert_eq!(text, "Hello World!?");
    }

    #[tokio::test]
    async fn zero_lines_yield_empty_string() {
        let store = MemoryBlobStore::new();
        store.put("input", "blank.pdf", b"%PDF").await.unwrap();
        let analysis = FixedAnalysis(AnalysisResult { pages: vec![] });

        let text = extract_text(&store, &analysis, "input", "blank.pdf")
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn missing_object_propagates_as_activity_failure() {
        let store = MemoryBlobStore::new();
        let analysis = FixedAnalysis(AnalysisResult::default());

        let err = extract_text(&store, &analysis, "input", "ghost.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected() {
        let store = MemoryBlobStore::new();
        let analysis = FixedAnalysis(AnalysisResult::default());

        let err = extract_text(&store, &analysis, "input", "").await.unwrap_err();
        assert!(matches!(err, ActivityError::InvalidInput { .. }));
    }
}
