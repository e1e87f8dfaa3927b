//! Trigger handlers: ingestion (new-blob) and warmup (timer).
//!
//! The ingestion trigger is deliberately thin — derive an identifier from
//! the blob path and hand it to the orchestration layer, fire-and-forget.
//! The warmup trigger exists only to exercise the process's
//! initialization path on a schedule (every five minutes in the source
//! deployment, `0 */5 * * * *`): it performs no data operation and never
//! propagates a failure.

use tracing::{debug, info};

/// Derive the workflow identifier from a blob path.
///
/// The identifier is everything after the top-level container segment, so
/// nested uploads keep their inner path: `input/reports/q3.pdf` →
/// `reports/q3.pdf`. A path with no container segment, or nothing after
/// it, carries no identifier.
pub fn blob_identifier(path: &str) -> Option<&str> {
    path.split_once('/')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
}

/// Handle a new-blob event; returns the derived identifier.
///
/// Logs and drops paths that carry no identifier — the hosting loop's
/// dead-letter handling (out of scope here) owns anything beyond that.
pub fn ingest(path: &str, size: u64) -> Option<&str> {
    info!(path, size, "blob trigger fired");
    match blob_identifier(path) {
        Some(identifier) => Some(identifier),
        None => {
            debug!(path, "blob path carries no identifier; ignoring");
            None
        }
    }
}

/// Periodic no-op keeping the process warm.
pub async fn warmup() {
    debug!("warmup tick");
}
