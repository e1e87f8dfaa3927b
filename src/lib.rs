//! # docsumm
//!
//! Summarize uploaded documents through a durable, replayable pipeline.
//!
//! ## Why this crate?
//!
//! The original deployment of this pipeline lived inside a serverless
//! orchestration runtime: trigger bindings were attributes, replay was
//! runtime magic, and the storage client was a module-level global. This
//! crate keeps the pipeline's behaviour — including its deliberately
//! simple catch-all retry — but makes every moving part explicit: an
//! event dispatch table validated at startup, an append-only history log
//! that any editor can open, and capability handles injected into each
//! activity.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (input container)
//!  │
//!  ├─ 1. Ingest      derive the identifier, start one workflow instance
//!  ├─ 2. Extract     fetch bytes, external layout analysis → plain text
//!  ├─ 3. Summarize   fixed prompt → external completion deployment
//!  └─ 4. Persist     dot-free filename, write summary text (output container)
//! ```
//!
//! Each step is wrapped by a shared [`RetryPolicy`] (default: 5 s fixed
//! interval, 3 attempts) and recorded in the instance's [`History`], so an
//! interrupted instance resumes at its first unlogged step. A periodic
//! warmup tick keeps the process initialized between uploads.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsumm::{default_capabilities, Host, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::from_env()?;
//!     let caps = default_capabilities(&config);
//!     Host::new(config, caps)?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Embedders with their own storage or service clients implement
//! [`BlobStore`], [`AnalysisService`], or [`CompletionService`] and pass
//! their handles in [`Capabilities`] instead.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod host;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod services;
pub mod store;
pub mod triggers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use dispatch::{ActivityRegistry, Dispatcher, Event, EventSource};
pub use error::{ActivityError, PipelineError};
pub use history::{History, HistoryEntry};
pub use host::{default_capabilities, Host};
pub use orchestrator::{
    run_instance, Capabilities, WorkflowInstance, WorkflowState, WORKFLOW_STEPS,
};
pub use retry::RetryPolicy;
pub use services::{AnalysisService, CompletionService};
pub use store::{BlobStore, FsBlobStore, MemoryBlobStore};
