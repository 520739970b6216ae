mod common;

use std::sync::{Arc, Mutex};

use common::*;
use nodecanvas::document::GraphDocument;
use nodecanvas::edge::Edge;
use nodecanvas::execution::{ExecutionTracker, JobUpdate, RunStatus};
use nodecanvas::node::CanvasNode;
use nodecanvas::runner::{
    execution_order, JobStream, JobSubmitter, RunnerError, SubmitError, WorkflowRunner,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{json, Value};

/// Scripted stand-in for the job submission service.
///
/// Succeeding nodes stream one progress tick then a result tagged with the
/// node id; nodes listed in `fail` stream a failure; nodes listed in
/// `refuse` reject the submission outright. Every call is recorded so tests
/// can assert on ordering and collected inputs.
#[derive(Default)]
struct ScriptedSubmitter {
    fail: FxHashSet<String>,
    refuse: FxHashSet<String>,
    results: FxHashMap<String, Value>,
    calls: Mutex<Vec<(String, FxHashMap<String, Value>)>>,
}

impl ScriptedSubmitter {
    fn submitted_order(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn inputs_for(&self, node_id: &str) -> FxHashMap<String, Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, inputs)| inputs.clone())
            .expect("node was submitted")
    }
}

#[async_trait::async_trait]
impl JobSubmitter for ScriptedSubmitter {
    async fn submit(
        &self,
        node: &CanvasNode,
        inputs: FxHashMap<String, Value>,
    ) -> Result<JobStream, SubmitError> {
        let id = node.id.clone();
        self.calls.lock().unwrap().push((id.clone(), inputs));
        if self.refuse.contains(&id) {
            return Err(SubmitError::new(format!("refused {id}")));
        }
        let failing = self.fail.contains(&id);
        let result = self
            .results
            .get(&id)
            .cloned()
            .unwrap_or_else(|| json!({ "from": id }));
        let stream = async_stream::stream! {
            yield JobUpdate::Progress(0.5);
            if failing {
                yield JobUpdate::Failed(format!("simulated failure on {id}"));
            } else {
                yield JobUpdate::Completed(result);
            }
        };
        Ok(Box::pin(stream))
    }
}

fn chain() -> GraphDocument {
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    doc.add_node(text_prompt("b"));
    doc.add_node(image_output("c"));
    doc.add_node(comment("note"));
    doc.connect("a", "output", "b", "input").unwrap();
    doc.connect("b", "output", "c", "input").unwrap();
    doc
}

#[test]
fn execution_order_is_topological_and_deterministic() {
    let doc = chain();
    let order = execution_order(&doc).unwrap();
    assert_eq!(order, vec!["a", "note", "b", "c"]);
}

#[test]
fn execution_order_rejects_cycles() {
    // Bypass connect validation to build an illegal document directly.
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    doc.add_node(text_prompt("b"));
    doc.edges.push(Edge::new("e1", "a", "output", "b", "input"));
    doc.edges.push(Edge::new("e2", "b", "output", "a", "input"));
    assert!(matches!(
        execution_order(&doc),
        Err(RunnerError::CycleDetected)
    ));
}

#[tokio::test]
async fn run_walks_the_chain_and_threads_results_downstream() {
    let doc = chain();
    let tracker = Arc::new(ExecutionTracker::new());
    let submitter = ScriptedSubmitter::default();
    let (mut runner, _handle) = WorkflowRunner::new(tracker.clone());

    let report = runner.run(&doc, &submitter).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.results.len(), 3);
    // Comments never reach the submission service.
    assert_eq!(submitter.submitted_order(), vec!["a", "b", "c"]);
    // b's input port carries a's result.
    assert_eq!(submitter.inputs_for("b")["input"], json!({ "from": "a" }));
    assert_eq!(tracker.state("c").status, RunStatus::Succeeded);
}

#[tokio::test]
async fn combine_port_aggregates_upstream_results_in_edge_order() {
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    doc.add_node(text_prompt("b"));
    doc.add_node(combine("mix"));
    doc.connect("a", "output", "mix", "inputs").unwrap();
    doc.connect("b", "output", "mix", "inputs").unwrap();

    let tracker = Arc::new(ExecutionTracker::new());
    let submitter = ScriptedSubmitter::default();
    let (mut runner, _handle) = WorkflowRunner::new(tracker);

    runner.run(&doc, &submitter).await.unwrap();

    assert_eq!(
        submitter.inputs_for("mix")["inputs"],
        json!([{ "from": "a" }, { "from": "b" }])
    );
}

#[tokio::test]
async fn array_results_keep_their_boundary_on_combine_ports() {
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    doc.add_node(text_prompt("b"));
    doc.add_node(combine("mix"));
    doc.connect("a", "output", "mix", "inputs").unwrap();
    doc.connect("b", "output", "mix", "inputs").unwrap();

    let tracker = Arc::new(ExecutionTracker::new());
    let mut submitter = ScriptedSubmitter::default();
    submitter.results.insert("a".into(), json!([1, 2]));
    submitter.results.insert("b".into(), json!(3));
    let (mut runner, _handle) = WorkflowRunner::new(tracker);

    runner.run(&doc, &submitter).await.unwrap();

    // The upstream array stays nested instead of flattening into [1, 2, 3].
    assert_eq!(submitter.inputs_for("mix")["inputs"], json!([[1, 2], 3]));
}

#[tokio::test]
async fn single_capacity_port_receives_the_bare_value() {
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    doc.add_node(image_output("b"));
    doc.connect("a", "output", "b", "input").unwrap();

    let tracker = Arc::new(ExecutionTracker::new());
    let mut submitter = ScriptedSubmitter::default();
    submitter.results.insert("a".into(), json!([1, 2]));
    let (mut runner, _handle) = WorkflowRunner::new(tracker);

    runner.run(&doc, &submitter).await.unwrap();

    assert_eq!(submitter.inputs_for("b")["input"], json!([1, 2]));
}

#[tokio::test]
async fn failed_node_is_recorded_and_the_run_continues() {
    let doc = chain();
    let tracker = Arc::new(ExecutionTracker::new());
    let mut submitter = ScriptedSubmitter::default();
    submitter.fail.insert("b".into());
    let (mut runner, _handle) = WorkflowRunner::new(tracker.clone());

    let report = runner.run(&doc, &submitter).await.unwrap();

    assert!(!report.succeeded());
    assert_eq!(
        report.errors.get("b").map(String::as_str),
        Some("simulated failure on b")
    );
    assert_eq!(tracker.state("b").status, RunStatus::Failed);
    // c still runs, just without input from the failed upstream.
    assert!(submitter.inputs_for("c").is_empty());
    assert!(report.results.contains_key("c"));
}

#[tokio::test]
async fn refused_submission_marks_the_node_failed() {
    let doc = connected_pair();
    let tracker = Arc::new(ExecutionTracker::new());
    let mut submitter = ScriptedSubmitter::default();
    submitter.refuse.insert("a".into());
    let (mut runner, _handle) = WorkflowRunner::new(tracker.clone());

    let report = runner.run(&doc, &submitter).await.unwrap();

    assert_eq!(
        tracker.state("a").error.as_deref(),
        Some("refused a")
    );
    assert!(report.errors.contains_key("a"));
    // Downstream still runs.
    assert!(report.results.contains_key("b"));
}

/// Submitter that cancels the run from inside a chosen node's submission and
/// hands back a stream that never ends.
struct CancellingSubmitter {
    inner: ScriptedSubmitter,
    cancel_on: String,
    handle: nodecanvas::runner::CancelHandle,
}

#[async_trait::async_trait]
impl JobSubmitter for CancellingSubmitter {
    async fn submit(
        &self,
        node: &CanvasNode,
        inputs: FxHashMap<String, Value>,
    ) -> Result<JobStream, SubmitError> {
        if node.id == self.cancel_on {
            self.inner
                .calls
                .lock()
                .unwrap()
                .push((node.id.clone(), inputs));
            self.handle.cancel();
            return Ok(Box::pin(futures_util::stream::pending()));
        }
        self.inner.submit(node, inputs).await
    }
}

#[tokio::test]
async fn cancellation_stops_the_run_mid_stream() {
    let doc = chain();
    let tracker = Arc::new(ExecutionTracker::new());
    let (mut runner, handle) = WorkflowRunner::new(tracker.clone());
    let submitter = CancellingSubmitter {
        inner: ScriptedSubmitter::default(),
        cancel_on: "b".into(),
        handle,
    };

    let report = runner.run(&doc, &submitter).await.unwrap();

    assert!(report.cancelled);
    assert!(!report.succeeded());
    // a finished before the cancel; b was reset; c never submitted.
    assert!(report.results.contains_key("a"));
    assert_eq!(tracker.state("b").status, RunStatus::Idle);
    assert_eq!(submitter.inner.submitted_order(), vec!["a", "b"]);
}

#[tokio::test]
async fn pre_cancelled_run_submits_nothing() {
    let doc = chain();
    let tracker = Arc::new(ExecutionTracker::new());
    let submitter = ScriptedSubmitter::default();
    let (mut runner, handle) = WorkflowRunner::new(tracker);
    handle.cancel();

    let report = runner.run(&doc, &submitter).await.unwrap();

    assert!(report.cancelled);
    assert!(submitter.submitted_order().is_empty());
}

/// Submitter whose stream ends without a terminal update.
struct TruncatingSubmitter;

#[async_trait::async_trait]
impl JobSubmitter for TruncatingSubmitter {
    async fn submit(
        &self,
        _node: &CanvasNode,
        _inputs: FxHashMap<String, Value>,
    ) -> Result<JobStream, SubmitError> {
        Ok(Box::pin(async_stream::stream! {
            yield JobUpdate::Progress(0.3);
        }))
    }
}

#[tokio::test]
async fn truncated_stream_counts_as_failure() {
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    let tracker = Arc::new(ExecutionTracker::new());
    let (mut runner, _handle) = WorkflowRunner::new(tracker.clone());

    let report = runner.run(&doc, &TruncatingSubmitter).await.unwrap();

    let state = tracker.state("a");
    assert_eq!(state.status, RunStatus::Failed);
    assert_eq!(
        report.errors.get("a").map(String::as_str),
        Some("job stream ended while running")
    );
}
