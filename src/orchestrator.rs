//! Deterministic workflow orchestrator.
//!
//! One [`WorkflowInstance`] exists per triggering upload. The orchestrator
//! drives it through three activities in fixed order — extract, summarize,
//! persist — threading each step's output into the next step's input and
//! wrapping every call with the shared [`RetryPolicy`].
//!
//! ## Determinism
//!
//! The orchestrator itself performs no I/O, reads no clock, and draws no
//! randomness; every effect goes through a named activity whose outcome is
//! recorded in the instance's [`History`]. Re-running an instance against
//! its history therefore reproduces identical decisions: recorded steps
//! are replayed from the log and execution resumes at the first unlogged
//! step.
//!
//! ## Failure
//!
//! A step whose retries are exhausted moves the instance to
//! [`WorkflowState::Failed`] and surfaces the last error. There is no
//! partial-completion recovery beyond what history replay provides.

use crate::dispatch::ActivityRegistry;
use crate::error::PipelineError;
use crate::history::{input_hash, History, HistoryEntry};
use crate::retry::{call_with_retry, RetryPolicy};
use crate::services::{AnalysisService, CompletionService};
use crate::store::BlobStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Activity names, in execution order.
pub const STEP_EXTRACT: &str = "extract";
pub const STEP_SUMMARIZE: &str = "summarize";
pub const STEP_PERSIST: &str = "persist";

/// Every step the orchestrator calls; used for registry validation.
pub const WORKFLOW_STEPS: [&str; 3] = [STEP_EXTRACT, STEP_SUMMARIZE, STEP_PERSIST];

/// Where an instance currently is in its fixed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Extracting,
    Summarizing,
    Persisting,
    Completed,
    Failed,
}

/// One run of the pipeline for one uploaded file.
#[derive(Debug)]
pub struct WorkflowInstance {
    /// Correlation id for logs; not part of any activity input.
    pub id: Uuid,
    /// The uploaded object's identifier within the input container.
    pub identifier: String,
    pub state: WorkflowState,
}

impl WorkflowInstance {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: identifier.into(),
            state: WorkflowState::Extracting,
        }
    }
}

/// Injected external-effect handles shared by the activities.
///
/// Activities receive these as capabilities; nothing in the crate reaches
/// for a global client.
#[derive(Clone)]
pub struct Capabilities {
    pub store: Arc<dyn BlobStore>,
    pub analysis: Arc<dyn AnalysisService>,
    pub completion: Arc<dyn CompletionService>,
}

/// Run `instance` to completion, replaying any recorded history first.
///
/// Returns the destination name the persistence step produced.
pub async fn run_instance(
    instance: &mut WorkflowInstance,
    registry: &ActivityRegistry,
    policy: &RetryPolicy,
    history: &mut History,
) -> Result<String, PipelineError> {
    info!(
        instance = %instance.id,
        identifier = %instance.identifier,
        recorded = history.len(),
        "workflow instance started"
    );
    let mut cursor = 0usize;

    instance.state = WorkflowState::Extracting;
    let extracted = run_step(
        instance,
        registry,
        policy,
        history,
        &mut cursor,
        STEP_EXTRACT,
        Value::String(instance.identifier.clone()),
    )
    .await?;
    let text = expect_string(STEP_EXTRACT, &extracted)?;

    instance.state = WorkflowState::Summarizing;
    let summary = run_step(
        instance,
        registry,
        policy,
        history,
        &mut cursor,
        STEP_SUMMARIZE,
        Value::String(text),
    )
    .await?;

    instance.state = WorkflowState::Persisting;
    let persisted = run_step(
        instance,
        registry,
        policy,
        history,
        &mut cursor,
        STEP_PERSIST,
        json!({ "identifier": instance.identifier, "summary": summary }),
    )
    .await?;
    let destination = expect_string(STEP_PERSIST, &persisted)?;

    instance.state = WorkflowState::Completed;
    info!(
        instance = %instance.id,
        destination = %destination,
        "successfully uploaded summary"
    );
    Ok(destination)
}

/// Execute (or replay) one step at the current history position.
#[allow(clippy::too_many_arguments)]
async fn run_step(
    instance: &mut WorkflowInstance,
    registry: &ActivityRegistry,
    policy: &RetryPolicy,
    history: &mut History,
    cursor: &mut usize,
    step: &'static str,
    input: Value,
) -> Result<Value, PipelineError> {
    let hash = input_hash(&input);
    let position = *cursor;
    *cursor += 1;

    if let Some(entry) = history.entries().get(position) {
        if entry.step == step && entry.input_hash == hash {
            debug!(instance = %instance.id, step, position, "replaying recorded step");
            return Ok(entry.output.clone());
        }
        instance.state = WorkflowState::Failed;
        return Err(PipelineError::CorruptHistory {
            instance: instance.identifier.clone(),
            detail: format!(
                "entry {position} records step '{}' with hash {}, expected '{step}' with hash {hash}",
                entry.step, entry.input_hash
            ),
        });
    }

    let activity = registry
        .get(step)
        .ok_or_else(|| PipelineError::UnboundActivity {
            name: step.to_string(),
        })?
        .clone();

    match call_with_retry(policy, step, || activity(input.clone())).await {
        Ok(output) => {
            history
                .append(HistoryEntry {
                    step: step.to_string(),
                    input_hash: hash,
                    output: output.clone(),
                })
                .await?;
            Ok(output)
        }
        Err(e) => {
            instance.state = WorkflowState::Failed;
            error!(
                instance = %instance.id,
                step,
                error = %e,
                "workflow instance failed"
            );
            Err(PipelineError::StepFailed {
                step,
                attempts: policy.max_attempts.max(1),
                source: e,
            })
        }
    }
}

fn expect_string(step: &'static str, value: &Value) -> Result<String, PipelineError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Internal(format!("step '{step}' produced a non-string output")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ActivityRegistry;
    use crate::error::ActivityError;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn test_policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(1), 3)
    }

    /// Registry whose activities echo predictable values.
    fn echo_registry() -> ActivityRegistry {
        let mut registry = ActivityRegistry::new();
        registry.register(
            STEP_EXTRACT,
            Arc::new(|_| async { Ok(Value::String("text".into())) }.boxed()),
        );
        registry.register(
            STEP_SUMMARIZE,
            Arc::new(|_| async { Ok(json!({"content": "summary"})) }.boxed()),
        );
        registry.register(
            STEP_PERSIST,
            Arc::new(|input| {
                async move {
                    let id = input["identifier"].as_str().unwrap_or("?");
                    Ok(Value::String(format!("{id}-out.txt")))
                }
                .boxed()
            }),
        );
        registry
    }

    #[tokio::test]
    async fn happy_path_reaches_completed() {
        let registry = echo_registry();
        let mut instance = WorkflowInstance::new("report.pdf");
        let mut history = History::in_memory();

        let name = run_instance(&mut instance, &registry, &test_policy(), &mut history)
            .await
            .unwrap();
        assert_eq!(name, "report.pdf-out.txt");
        assert_eq!(instance.state, WorkflowState::Completed);

        let steps: Vec<_> = history.entries().iter().map(|e| e.step.as_str()).collect();
        assert_eq!(steps, ["extract", "summarize", "persist"]);
    }

    #[tokio::test]
    async fn exhausted_step_fails_the_instance_with_last_error() {
        let mut registry = echo_registry();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        registry.register(
            STEP_SUMMARIZE,
            Arc::new(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    Err(ActivityError::Service {
                        service: "completion",
                        detail: format!("boom {n}"),
                    })
                }
                .boxed()
            }),
        );

        let mut instance = WorkflowInstance::new("report.pdf");
        let mut history = History::in_memory();
        let err = run_instance(&mut instance, &registry, &test_policy(), &mut history)
            .await
            .unwrap_err();

        assert_eq!(instance.state, WorkflowState::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            PipelineError::StepFailed { step, attempts, source } => {
                assert_eq!(step, STEP_SUMMARIZE);
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("boom 2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Only the successful extract step was recorded.
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn recorded_steps_are_replayed_not_reexecuted() {
        let registry = echo_registry();
        let mut instance = WorkflowInstance::new("report.pdf");
        let mut history = History::in_memory();
        let first = run_instance(&mut instance, &registry, &test_policy(), &mut history)
            .await
            .unwrap();

        // Second run against the same history: activities that would now
        // fail are never consulted.
        let mut failing = ActivityRegistry::new();
        for step in WORKFLOW_STEPS {
            failing.register(
                step,
                Arc::new(|_| {
                    async {
                        Err(ActivityError::Service {
                            service: "analysis",
                            detail: "should not be called".into(),
                        })
                    }
                    .boxed()
                }),
            );
        }

        let mut replayed = WorkflowInstance::new("report.pdf");
        let second = run_instance(&mut replayed, &failing, &test_policy(), &mut history)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(replayed.state, WorkflowState::Completed);
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn mismatched_history_entry_is_corrupt() {
        let registry = echo_registry();
        let mut history = History::in_memory();
        history
            .append(HistoryEntry {
                step: "persist".into(),
                input_hash: "bogus".into(),
                output: Value::String("x".into()),
            })
            .await
            .unwrap();

        let mut instance = WorkflowInstance::new("report.pdf");
        let err = run_instance(&mut instance, &registry, &test_policy(), &mut history)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::CorruptHistory { .. }));
        assert_eq!(instance.state, WorkflowState::Failed);
    }
}
