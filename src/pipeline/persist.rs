//! Persistence activity: write the summary text to the output container.
//!
//! The destination name concatenates the source identifier with a
//! call-time timestamp, then replaces every literal `.` in that combined
//! string with `-` before appending the fixed `.txt` extension. The
//! replacement keeps the name free of extension-like dots: the only `.`
//! in a destination name is the one in front of `txt`.
//!
//! The clock read happens here, inside the activity, never in the
//! orchestrator — replay sees the recorded name, not a fresh timestamp.

use crate::error::ActivityError;
use crate::store::BlobStore;
use serde_json::Value;
use tracing::info;

/// Timestamp layout matching the source deployment's filenames,
/// e.g. `2026-08-25 14:03:07.123456`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Build the destination filename from an identifier and a timestamp.
pub fn destination_name(identifier: &str, timestamp: &str) -> String {
    let combined = format!("{identifier}-{timestamp}");
    format!("{}.txt", combined.replace('.', "-"))
}

/// Write `summary`'s `content` field under a derived name; returns the name.
pub async fn write_summary(
    store: &dyn BlobStore,
    container: &str,
    identifier: &str,
    summary: &Value,
) -> Result<String, ActivityError> {
    let content = summary
        .get("content")
        .and_then(Value::as_str)
        .ok_or(ActivityError::MissingContent)?;

    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let name = destination_name(identifier, &timestamp);

    store.put(container, &name, content.as_bytes()).await?;
    info!(container, name, bytes = content.len(), "summary persisted");
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;
    use serde_json::json;

    #[test]
    fn dots_become_hyphens_except_the_extension() {
        let name = destination_name("report.pdf", "2026-08-25 14:03:07.123456");
        assert_eq!(name, "report-pdf-2026-08-25 14:03:07-123456.txt");

        let dots: Vec<_> = name.match_indices('.').collect();
        assert_eq!(dots.len(), 1);
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn nested_identifier_keeps_its_path_segments() {
        let name = destination_name("reports/q3.pdf", "2026-01-01 00:00:00.000000");
        assert!(name.starts_with("reports/q3-pdf-"));
        assert!(name.ends_with(".txt"));
    }

    #[tokio::test]
    async fn writes_content_and_returns_name() {
        let store = MemoryBlobStore::new();
        let summary = json!({"content": "It is about greetings.", "model": "m"});

        let name = write_summary(&store, "output", "report.pdf", &summary)
            .await
            .unwrap();
        assert!(name.starts_with("report-pdf-"));
        assert_eq!(
            store.get("output", &name).await.unwrap(),
            b"It is about greetings."
        );
    }

    #[tokio::test]
    async fn summary_without_content_fails() {
        let store = MemoryBlobStore::new();
        let summary = json!({"text": "no content field"});

        let err = write_summary(&store, "output", "report.pdf", &summary)
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::MissingContent));
    }
}
