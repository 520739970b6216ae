//! Workflow runner: executes a document's nodes in dependency order.
//!
//! The runner is the bridge between the document and the external job
//! submission service. For each executable node it collects inputs from the
//! results of its incoming edges, submits the job through the
//! [`JobSubmitter`] seam, and drains the returned update stream through the
//! [`ExecutionTracker`] strictly in arrival order. One job is in flight at a
//! time, so per-node status updates can never interleave out of order.
//!
//! Cancellation is cooperative: a [`CancelHandle`] flips a `watch` flag the
//! runner checks between stream updates. The tracker's epoch mechanism takes
//! care of any messages the dead stream still manages to deliver.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::document::GraphDocument;
use crate::edge::max_incoming;
use crate::execution::{ExecutionEvent, ExecutionTracker, JobUpdate, LogEmitter, RunStatus};
use crate::node::CanvasNode;
use crate::types::NodeKind;

/// Stream of updates emitted by one submitted job.
pub type JobStream = BoxStream<'static, JobUpdate>;

/// Error reported by a job submission service when a job cannot start.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SubmitError {
    pub message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Seam to the external job submission service.
///
/// Given a node and the inputs collected from its incoming edges, returns a
/// stream of progress/result updates. Timeout policy belongs to the
/// implementor, not to this core.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(
        &self,
        node: &CanvasNode,
        inputs: FxHashMap<String, Value>,
    ) -> Result<JobStream, SubmitError>;
}

/// Errors that abort a run before any node executes.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The document's edges form a directed cycle.
    #[error("workflow contains a cycle")]
    CycleDetected,
}

/// Outcome of one workflow run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Result payload per succeeded node id.
    pub results: FxHashMap<String, Value>,
    /// Error message per failed node id.
    pub errors: FxHashMap<String, String>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Whether the run was cancelled before completing.
    pub cancelled: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.errors.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "results={} errors={} cancelled={} duration_ms={}",
            self.results.len(),
            self.errors.len(),
            self.cancelled,
            self.duration.as_millis()
        )
    }
}

/// Cancels an in-progress run.
#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Compute a topological execution order over the document's nodes.
///
/// Kahn's algorithm; a leftover node means the edges close a cycle.
pub fn execution_order(document: &GraphDocument) -> Result<Vec<String>, RunnerError> {
    let mut in_degree: FxHashMap<&str, usize> = FxHashMap::default();
    let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for node in &document.nodes {
        in_degree.insert(node.id.as_str(), 0);
        adjacency.insert(node.id.as_str(), Vec::new());
    }
    for edge in &document.edges {
        if let Some(targets) = adjacency.get_mut(edge.source.as_str()) {
            targets.push(edge.target.as_str());
        }
        if let Some(degree) = in_degree.get_mut(edge.target.as_str()) {
            *degree += 1;
        }
    }

    // Seed with roots in document order for deterministic output.
    let mut queue: Vec<&str> = document
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut order = Vec::with_capacity(document.nodes.len());
    let mut cursor = 0;
    while cursor < queue.len() {
        let current = queue[cursor];
        cursor += 1;
        order.push(current.to_string());
        if let Some(targets) = adjacency.get(current) {
            for target in targets {
                let degree = in_degree
                    .get_mut(target)
                    .expect("edge target registered above");
                *degree -= 1;
                if *degree == 0 {
                    queue.push(target);
                }
            }
        }
    }

    if order.len() != document.nodes.len() {
        return Err(RunnerError::CycleDetected);
    }
    Ok(order)
}

/// Collect a node's inputs from upstream results, keyed by target port.
///
/// Aggregation follows the port's capacity, not the shape of the incoming
/// values: multi-capacity ports (combine inputs) always wrap each upstream
/// result in an outer JSON array in edge order, so an upstream result that
/// is itself an array keeps its boundary. Single-capacity ports hold the
/// bare value.
fn collect_inputs(
    document: &GraphDocument,
    node_id: &str,
    results: &FxHashMap<String, Value>,
) -> FxHashMap<String, Value> {
    let mut inputs: FxHashMap<String, Value> = FxHashMap::default();
    let Some(node) = document.node(node_id) else {
        return inputs;
    };
    for edge in document.incoming_edges(node_id) {
        let Some(result) = results.get(&edge.source) else {
            continue;
        };
        match max_incoming(node, &edge.target_port) {
            Some(1) => {
                inputs.insert(edge.target_port.clone(), result.clone());
            }
            _ => {
                let slot = inputs
                    .entry(edge.target_port.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = slot {
                    items.push(result.clone());
                }
            }
        }
    }
    inputs
}

/// Drives a document through the job submission service.
pub struct WorkflowRunner {
    tracker: std::sync::Arc<ExecutionTracker>,
    cancel: watch::Receiver<bool>,
    emitter: Option<LogEmitter>,
}

impl WorkflowRunner {
    /// Create a runner over a shared tracker, returning the cancel handle.
    pub fn new(tracker: std::sync::Arc<ExecutionTracker>) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                tracker,
                cancel: rx,
                emitter: None,
            },
            CancelHandle { tx },
        )
    }

    /// Attach an execution log emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: LogEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Execute every node of the document in dependency order.
    ///
    /// A node failure is recorded in the report and the run continues;
    /// downstream nodes simply see no input from the failed source. Only a
    /// cyclic document aborts the run up front.
    pub async fn run(
        &mut self,
        document: &GraphDocument,
        submitter: &dyn JobSubmitter,
    ) -> Result<RunReport, RunnerError> {
        let started = Instant::now();
        let order = execution_order(document)?;
        let mut report = RunReport::default();
        let mut cancel = self.cancel.clone();
        // A dropped CancelHandle closes the channel; that means "can never
        // cancel", not "cancelled".
        let mut cancel_live = true;

        tracing::info!(nodes = order.len(), "workflow run started");

        'nodes: for node_id in &order {
            if *cancel.borrow() {
                report.cancelled = true;
                break;
            }
            let Some(node) = document.node(node_id) else {
                continue;
            };
            // Comments are annotations, not data flow.
            if node.kind() == NodeKind::Comment {
                continue;
            }

            let inputs = collect_inputs(document, node_id, &report.results);
            let ticket = self.tracker.begin_job(node_id);
            self.emit(ExecutionEvent::node_info(node_id, "job queued"));

            let mut stream = match submitter.submit(node, inputs).await {
                Ok(stream) => stream,
                Err(err) => {
                    self.tracker
                        .apply(&ticket, JobUpdate::Failed(err.message.clone()));
                    self.emit(ExecutionEvent::node_error(node_id, err.message.clone()));
                    report.errors.insert(node_id.clone(), err.message);
                    continue;
                }
            };

            loop {
                tokio::select! {
                    changed = cancel.changed(), if cancel_live => {
                        match changed {
                            Ok(()) if *cancel.borrow() => {
                                self.tracker.cancel(node_id);
                                self.emit(ExecutionEvent::node_warn(node_id, "job cancelled"));
                                report.cancelled = true;
                                break 'nodes;
                            }
                            Ok(()) => {}
                            Err(_) => cancel_live = false,
                        }
                    }
                    update = stream.next() => match update {
                        None => break,
                        Some(update) => {
                            self.tracker.apply(&ticket, update);
                        }
                    }
                }
            }

            let state = self.tracker.state(node_id);
            match state.status {
                RunStatus::Succeeded => {
                    if let Some(result) = self.tracker.result(node_id) {
                        report.results.insert(node_id.clone(), result);
                    }
                    self.emit(ExecutionEvent::node_info(node_id, "job succeeded"));
                }
                RunStatus::Failed => {
                    let message = state.error.unwrap_or_else(|| "job failed".to_string());
                    self.emit(ExecutionEvent::node_error(node_id, message.clone()));
                    report.errors.insert(node_id.clone(), message);
                }
                other => {
                    // Stream ended without settling; treat as a failure.
                    let message = format!("job stream ended while {other}");
                    self.tracker
                        .apply(&ticket, JobUpdate::Failed(message.clone()));
                    self.emit(ExecutionEvent::node_error(node_id, message.clone()));
                    report.errors.insert(node_id.clone(), message);
                }
            }
        }

        report.duration = started.elapsed();
        tracing::info!(%report, "workflow run finished");
        self.emit(ExecutionEvent::info(format!("run finished: {report}")));
        Ok(report)
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(event);
        }
    }
}
