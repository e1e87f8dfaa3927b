//! Error types for the docsumm library.
//!
//! Two distinct error types reflect two distinct failure scopes:
//!
//! * [`PipelineError`] — **Fatal for the instance or the process**: bad
//!   configuration, an unbound event or activity discovered at startup,
//!   corrupt history, or a step whose retries are exhausted. Returned from
//!   the host and orchestrator entry points.
//!
//! * [`ActivityError`] — **Per-step**: one activity call failed (object
//!   missing, service unreachable, malformed response). Consumed by the
//!   retry wrapper, which re-attempts the call up to the policy's maximum
//!   attempt count before the failure is promoted into
//!   [`PipelineError::StepFailed`].
//!
//! The retry wrapper deliberately treats every [`ActivityError`] variant the
//! same way — configuration errors included. The variants still carry enough
//! structure for callers and log readers to tell the classes apart.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the host, orchestrator, and configuration layers.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// A required environment variable is not set.
    #[error("missing required environment variable '{name}'")]
    MissingEnv { name: String },

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Startup validation errors ─────────────────────────────────────────
    /// An event source has no handler bound in the dispatch table.
    #[error("no handler bound for event source '{event_source}'")]
    UnboundEvent { event_source: &'static str },

    /// The orchestrator references an activity name with no registration.
    #[error("no activity registered under name '{name}'")]
    UnboundActivity { name: String },

    // ── Instance errors ───────────────────────────────────────────────────
    /// An activity failed on every attempt the retry policy allowed.
    ///
    /// Carries the last error observed; earlier attempts are visible only
    /// in the logs.
    #[error("step '{step}' failed after {attempts} attempts: {source}")]
    StepFailed {
        step: &'static str,
        attempts: u32,
        #[source]
        source: ActivityError,
    },

    /// A recorded history entry does not match the step the orchestrator
    /// was about to execute. Replaying against it would diverge.
    #[error("history for instance '{instance}' is corrupt: {detail}")]
    CorruptHistory { instance: String, detail: String },

    /// The history file could not be read or appended to.
    #[error("history I/O failed for '{path}': {source}")]
    HistoryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The orchestrator produced a step output of an unexpected shape.
    /// Indicates a bug in an activity registration, not bad input data.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A single activity call's failure, as seen by the retry wrapper.
///
/// The wrapper does not branch on the variant: every failure is retried up
/// to the policy's maximum attempt count.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// The named object does not exist in the container.
    #[error("object '{name}' not found in container '{container}'")]
    ObjectNotFound { container: String, name: String },

    /// The blob store failed for a reason other than a missing object.
    #[error("store error: {detail}")]
    Store { detail: String },

    /// An external service call failed (unreachable, throttled, non-2xx).
    #[error("{service} service error: {detail}")]
    Service {
        service: &'static str,
        detail: String,
    },

    /// The service answered but the body could not be parsed as expected.
    #[error("malformed {service} response: {detail}")]
    MalformedResponse {
        service: &'static str,
        detail: String,
    },

    /// The completion response has no textual `content` field.
    #[error("completion response is missing a textual 'content' field")]
    MissingContent,

    /// A credential or endpoint needed by the activity is absent or unusable.
    #[error("configuration error: {detail}")]
    Configuration { detail: String },

    /// The activity input had the wrong shape.
    #[error("invalid activity input: {detail}")]
    InvalidInput { detail: String },
}
