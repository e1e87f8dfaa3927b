//! Pipeline activities.
//!
//! Each submodule implements exactly one activity of the workflow.
//! Keeping them separate makes each independently testable against stub
//! services and lets the orchestrator stay free of any external-effect
//! code.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──────▶ summarize ─────▶ persist
//! (store+layout)  (completion)     (store write)
//! identifier→text text→summary     {identifier,summary}→filename
//! ```
//!
//! 1. [`extract`]   — fetch the uploaded bytes, run layout analysis,
//!    concatenate recognized lines in document order
//! 2. [`summarize`] — fill the fixed prompt template and call the
//!    completion deployment; the structured response passes through
//! 3. [`persist`]   — derive the dot-free destination name and write the
//!    summary text to the output container
//!
//! [`registry`] adapts the typed activity functions into the JSON-in,
//! JSON-out [`ActivityRegistry`] the orchestrator calls through.

pub mod extract;
pub mod persist;
pub mod summarize;

use crate::config::PipelineConfig;
use crate::dispatch::{ActivityFn, ActivityRegistry};
use crate::error::ActivityError;
use crate::orchestrator::{Capabilities, STEP_EXTRACT, STEP_PERSIST, STEP_SUMMARIZE};
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;

/// Build the registry binding the three workflow activities to the given
/// capabilities and configuration.
pub fn registry(config: &PipelineConfig, caps: &Capabilities) -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    registry.register(STEP_EXTRACT, extract_activity(config, caps));
    registry.register(STEP_SUMMARIZE, summarize_activity(config, caps));
    registry.register(STEP_PERSIST, persist_activity(config, caps));
    registry
}

fn extract_activity(config: &PipelineConfig, caps: &Capabilities) -> ActivityFn {
    let store = Arc::clone(&caps.store);
    let analysis = Arc::clone(&caps.analysis);
    let container = config.input_container.clone();
    Arc::new(move |input: Value| {
        let store = Arc::clone(&store);
        let analysis = Arc::clone(&analysis);
        let container = container.clone();
        async move {
            let identifier = input.as_str().ok_or_else(|| ActivityError::InvalidInput {
                detail: "extract expects a string identifier".into(),
            })?;
            let text =
                extract::extract_text(store.as_ref(), analysis.as_ref(), &container, identifier)
                    .await?;
            Ok(Value::String(text))
        }
        .boxed()
    })
}

fn summarize_activity(config: &PipelineConfig, caps: &Capabilities) -> ActivityFn {
    let completion = Arc::clone(&caps.completion);
    let deployment = config.completion_deployment.clone();
    Arc::new(move |input: Value| {
        let completion = Arc::clone(&completion);
        let deployment = deployment.clone();
        async move {
            let text = input.as_str().ok_or_else(|| ActivityError::InvalidInput {
                detail: "summarize expects the extracted text as a string".into(),
            })?;
            summarize::summarize_text(completion.as_ref(), &deployment, text).await
        }
        .boxed()
    })
}

fn persist_activity(config: &PipelineConfig, caps: &Capabilities) -> ActivityFn {
    let store = Arc::clone(&caps.store);
    let container = config.output_container.clone();
    Arc::new(move |input: Value| {
        let store = Arc::clone(&store);
        let container = container.clone();
        async move {
            let identifier = input
                .get("identifier")
                .and_then(Value::as_str)
                .ok_or_else(|| ActivityError::InvalidInput {
                    detail: "persist expects an 'identifier' string".into(),
                })?;
            let summary = input.get("summary").ok_or_else(|| ActivityError::InvalidInput {
                detail: "persist expects a 'summary' object".into(),
            })?;
            let name =
                persist::write_summary(store.as_ref(), &container, identifier, summary).await?;
            Ok(Value::String(name))
        }
        .boxed()
    })
}
