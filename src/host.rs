//! Polling host: wires triggers, dispatch table, and orchestrations.
//!
//! The host is the process-level glue the serverless runtime used to
//! provide. It owns the event dispatch table, lists the input container on
//! an interval, and turns each newly observed object into exactly one
//! workflow instance (fire-and-forget). Objects already present at
//! startup are ingested once as backlog; because instances replay their
//! history, re-ingesting a completed upload re-issues no service calls
//! and reproduces the recorded destination name.
//!
//! Event flow:
//!
//! ```text
//! poll tick ──▶ new-blob ──▶ orchestration-start ──▶ spawned instance
//! warm tick ──▶ timer  ────▶ warmup no-op
//! ```
//!
//! Handlers re-enter the table through an internal channel rather than
//! calling each other directly, so every hop is a dispatched event and
//! the table validated at startup is the whole wiring.

use crate::config::PipelineConfig;
use crate::dispatch::{Dispatcher, Event, EventSource};
use crate::error::PipelineError;
use crate::history::History;
use crate::orchestrator::{run_instance, Capabilities, WorkflowInstance, WORKFLOW_STEPS};
use crate::pipeline;
use crate::services::{HttpAnalysisClient, HttpCompletionClient};
use crate::store::FsBlobStore;
use crate::triggers;
use crate::dispatch::ActivityRegistry;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Capabilities backed by the filesystem store and the HTTP service
/// clients the configuration names.
pub fn default_capabilities(config: &PipelineConfig) -> Capabilities {
    Capabilities {
        store: Arc::new(FsBlobStore::new(config.storage_root.clone())),
        analysis: Arc::new(HttpAnalysisClient::new(
            config.analysis_endpoint.clone(),
            config.analysis_key.clone(),
        )),
        completion: Arc::new(HttpCompletionClient::new(
            config.completion_endpoint.clone(),
            config.completion_key.clone(),
        )),
    }
}

/// The running process: dispatch table, poll loop, and warmup timer.
pub struct Host {
    config: Arc<PipelineConfig>,
    caps: Capabilities,
    registry: Arc<ActivityRegistry>,
    dispatcher: Arc<Dispatcher>,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
}

impl Host {
    /// Build and validate the full dispatch wiring.
    ///
    /// Fails fast if any event source or workflow activity is unbound.
    pub fn new(config: PipelineConfig, caps: Capabilities) -> Result<Self, PipelineError> {
        let config = Arc::new(config);
        let registry = Arc::new(pipeline::registry(&config, &caps));
        registry.validate(&WORKFLOW_STEPS)?;

        let (events_tx, events_rx) = mpsc::channel(64);
        let mut dispatcher = Dispatcher::new();

        dispatcher.bind(
            EventSource::Timer,
            Arc::new(|_event| {
                async {
                    triggers::warmup().await;
                    Ok(())
                }
                .boxed()
            }),
        );

        let tx = events_tx.clone();
        dispatcher.bind(
            EventSource::BlobCreated,
            Arc::new(move |event| {
                let tx = tx.clone();
                async move {
                    if let Event::BlobCreated { path, size } = event {
                        if let Some(identifier) = triggers::ingest(&path, size) {
                            let start = Event::OrchestrationStart {
                                identifier: identifier.to_string(),
                            };
                            if tx.send(start).await.is_err() {
                                warn!(path, "host is shutting down; upload not ingested");
                            }
                        }
                    }
                    Ok(())
                }
                .boxed()
            }),
        );

        let orchestration_config = Arc::clone(&config);
        let orchestration_registry = Arc::clone(&registry);
        dispatcher.bind(
            EventSource::OrchestrationStart,
            Arc::new(move |event| {
                let config = Arc::clone(&orchestration_config);
                let registry = Arc::clone(&orchestration_registry);
                async move {
                    if let Event::OrchestrationStart { identifier } = event {
                        tokio::spawn(async move {
                            match run_orchestration(&config, &registry, &identifier).await {
                                Ok(destination) => {
                                    info!(identifier, destination, "workflow instance completed")
                                }
                                Err(e) => {
                                    error!(identifier, error = %e, "workflow instance failed")
                                }
                            }
                        });
                    }
                    Ok(())
                }
                .boxed()
            }),
        );

        dispatcher.validate()?;

        Ok(Self {
            config,
            caps,
            registry,
            dispatcher: Arc::new(dispatcher),
            events_tx,
            events_rx,
        })
    }

    /// Run one workflow instance for `identifier` and wait for it.
    ///
    /// The CLI's one-shot mode; the polling loop is not involved.
    pub async fn process(&self, identifier: &str) -> Result<String, PipelineError> {
        run_orchestration(&self.config, &self.registry, identifier).await
    }

    /// Serve until the process is stopped: poll the input container,
    /// tick the warmup timer, and dispatch every event that results.
    pub async fn run(mut self) -> Result<(), PipelineError> {
        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut warm = tokio::time::interval(self.config.warmup_interval);
        warm.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut seen: HashSet<String> = HashSet::new();
        info!(
            container = %self.config.input_container,
            poll_secs = self.config.poll_interval.as_secs(),
            "host started"
        );

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    self.scan_input(&mut seen).await;
                }
                _ = warm.tick() => {
                    self.spawn_dispatch(Event::Timer);
                }
                Some(event) = self.events_rx.recv() => {
                    self.spawn_dispatch(event);
                }
            }
        }
    }

    /// List the input container and raise a new-blob event for every
    /// object not seen before in this host's lifetime.
    async fn scan_input(&self, seen: &mut HashSet<String>) {
        let container = &self.config.input_container;
        let blobs = match self.caps.store.list(container).await {
            Ok(blobs) => blobs,
            Err(e) => {
                warn!(container = %container, error = %e, "input container listing failed");
                return;
            }
        };

        for blob in blobs {
            if !seen.insert(blob.name.clone()) {
                continue;
            }
            self.spawn_dispatch(Event::BlobCreated {
                path: format!("{container}/{}", blob.name),
                size: blob.size,
            });
        }
    }

    /// Dispatch on a spawned task so a slow handler never stalls the loop.
    fn spawn_dispatch(&self, event: Event) {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let source = event.source().as_str();
            if let Err(e) = dispatcher.dispatch(event).await {
                error!(source, error = %e, "event handler failed");
            }
        });
    }
}

/// Load (or create) the instance history and run the workflow.
async fn run_orchestration(
    config: &PipelineConfig,
    registry: &ActivityRegistry,
    identifier: &str,
) -> Result<String, PipelineError> {
    let policy = config.retry_policy();
    let history_path = config.state_dir().join(history_file_name(identifier));
    let mut history = History::load(history_path).await?;
    let mut instance = WorkflowInstance::new(identifier);
    run_instance(&mut instance, registry, &policy, &mut history).await
}

/// Identifiers may contain `/`; flatten them into a single file name.
fn history_file_name(identifier: &str) -> String {
    format!("{}.jsonl", identifier.replace(['/', '\\'], "_"))
}
