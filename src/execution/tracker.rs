//! Execution tracker: per-node run state with stale-stream protection.
//!
//! [`ExecutionTracker`] owns one slot per node id, each holding the node's
//! [`NodeRunState`], its current job epoch, and a `watch` channel. Renderers
//! subscribe per node, so a high-frequency progress tick wakes only the one
//! node that produced it instead of the whole graph.
//!
//! Staleness is handled with epochs: [`begin_job`](ExecutionTracker::begin_job)
//! bumps the node's epoch and hands back a [`JobTicket`] bound to it. Updates
//! are applied through the ticket and discarded (with a debug log) when the
//! epoch has moved on, whether because the job was cancelled or because a
//! re-submission superseded it. Late-arriving messages from a dead stream can
//! therefore never touch a node that has moved on.

use std::sync::Mutex;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::watch;

use super::status::{NodeRunState, RunStatus};

/// Handle binding a job to the epoch it was started under.
///
/// Cheap to clone; carried by whichever task is draining the job's stream.
#[derive(Clone, Debug)]
pub struct JobTicket {
    node_id: String,
    epoch: u64,
}

impl JobTicket {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// One update from a job's event stream, applied in arrival order.
#[derive(Clone, Debug)]
pub enum JobUpdate {
    /// Progress fraction; clamped to `[0, 1]` on application.
    Progress(f32),
    /// The job finished with a result payload.
    Completed(Value),
    /// The job failed with a message.
    Failed(String),
}

struct NodeSlot {
    epoch: u64,
    result: Option<Value>,
    tx: watch::Sender<NodeRunState>,
}

impl NodeSlot {
    fn new() -> Self {
        let (tx, _) = watch::channel(NodeRunState::default());
        Self {
            epoch: 0,
            result: None,
            tx,
        }
    }
}

/// Transient per-node execution state, keyed by node id.
///
/// Interior mutability over the slot map lets the tracker be shared as
/// `Arc<ExecutionTracker>` between the runner task and UI observers.
#[derive(Default)]
pub struct ExecutionTracker {
    slots: Mutex<FxHashMap<String, NodeSlot>>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a job for a node: supersedes any in-flight stream, enters
    /// `Queued`, and returns the ticket updates must be applied through.
    pub fn begin_job(&self, node_id: &str) -> JobTicket {
        let mut slots = self.slots.lock().expect("tracker poisoned");
        let slot = slots
            .entry(node_id.to_string())
            .or_insert_with(NodeSlot::new);
        slot.epoch += 1;
        slot.result = None;
        // send_replace applies even with no live subscriber; plain send would
        // silently drop the update.
        slot.tx.send_replace(NodeRunState::queued());
        JobTicket {
            node_id: node_id.to_string(),
            epoch: slot.epoch,
        }
    }

    /// Apply a stream update through its ticket.
    ///
    /// Returns `false` when the update was discarded: the ticket's epoch was
    /// superseded (cancel or re-submission), or the slot is already terminal.
    /// Discards are logged for diagnostics only.
    pub fn apply(&self, ticket: &JobTicket, update: JobUpdate) -> bool {
        let mut slots = self.slots.lock().expect("tracker poisoned");
        let Some(slot) = slots.get_mut(&ticket.node_id) else {
            tracing::debug!(node_id = %ticket.node_id, "update for unknown node discarded");
            return false;
        };
        if slot.epoch != ticket.epoch {
            tracing::debug!(
                node_id = %ticket.node_id,
                ticket_epoch = ticket.epoch,
                current_epoch = slot.epoch,
                "stale stream update discarded"
            );
            return false;
        }

        let current = slot.tx.borrow().clone();
        if current.status.is_terminal() {
            tracing::debug!(
                node_id = %ticket.node_id,
                status = %current.status,
                "update for settled job discarded"
            );
            return false;
        }
        let next = match update {
            JobUpdate::Progress(fraction) => {
                let status = match current.status {
                    RunStatus::Queued => RunStatus::Running,
                    RunStatus::Running => RunStatus::Running,
                    other => {
                        tracing::debug!(
                            node_id = %ticket.node_id,
                            status = %other,
                            "progress update outside an active job discarded"
                        );
                        return false;
                    }
                };
                NodeRunState {
                    status,
                    progress: fraction.clamp(0.0, 1.0),
                    error: None,
                }
            }
            JobUpdate::Completed(result) => {
                slot.result = Some(result);
                NodeRunState {
                    status: RunStatus::Succeeded,
                    progress: 1.0,
                    error: None,
                }
            }
            JobUpdate::Failed(message) => NodeRunState {
                status: RunStatus::Failed,
                progress: current.progress,
                error: Some(message),
            },
        };
        slot.tx.send_replace(next);
        true
    }

    /// Directly set a node's status, enforcing the state machine.
    ///
    /// Illegal transitions are discarded (debug-logged) and return `false`.
    pub fn set_status(
        &self,
        node_id: &str,
        status: RunStatus,
        progress: Option<f32>,
        error: Option<String>,
    ) -> bool {
        let mut slots = self.slots.lock().expect("tracker poisoned");
        let slot = slots
            .entry(node_id.to_string())
            .or_insert_with(NodeSlot::new);
        let current = slot.tx.borrow().clone();
        if current.status != status && !current.status.can_transition(status) {
            tracing::debug!(
                node_id,
                from = %current.status,
                to = %status,
                "illegal status transition discarded"
            );
            return false;
        }
        if status == RunStatus::Queued {
            slot.epoch += 1;
            slot.result = None;
        }
        slot.tx.send_replace(NodeRunState {
            status,
            progress: progress.map_or(current.progress, |p| p.clamp(0.0, 1.0)),
            error,
        });
        true
    }

    /// Reset a node to idle, invalidating any in-flight stream.
    pub fn clear_status(&self, node_id: &str) {
        let mut slots = self.slots.lock().expect("tracker poisoned");
        if let Some(slot) = slots.get_mut(node_id) {
            slot.epoch += 1;
            slot.result = None;
            slot.tx.send_replace(NodeRunState::default());
        }
    }

    /// Cancel the node's in-flight job.
    ///
    /// Bumps the epoch so every late-arriving message from the cancelled
    /// stream is discarded, and returns the node to idle.
    pub fn cancel(&self, node_id: &str) {
        let mut slots = self.slots.lock().expect("tracker poisoned");
        if let Some(slot) = slots.get_mut(node_id) {
            slot.epoch += 1;
            slot.result = None;
            slot.tx.send_replace(NodeRunState::default());
            tracing::debug!(node_id, "job cancelled");
        }
    }

    /// Subscribe to one node's run state.
    ///
    /// Creates the slot on demand so renderers can subscribe before the first
    /// job starts.
    pub fn subscribe(&self, node_id: &str) -> watch::Receiver<NodeRunState> {
        let mut slots = self.slots.lock().expect("tracker poisoned");
        slots
            .entry(node_id.to_string())
            .or_insert_with(NodeSlot::new)
            .tx
            .subscribe()
    }

    /// Current run state of a node; idle default for unknown nodes.
    pub fn state(&self, node_id: &str) -> NodeRunState {
        let slots = self.slots.lock().expect("tracker poisoned");
        slots
            .get(node_id)
            .map(|slot| slot.tx.borrow().clone())
            .unwrap_or_default()
    }

    /// Result payload of the node's last completed job, if any.
    pub fn result(&self, node_id: &str) -> Option<Value> {
        let slots = self.slots.lock().expect("tracker poisoned");
        slots.get(node_id).and_then(|slot| slot.result.clone())
    }
}
