//! Per-node run status: the state machine and observable record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a single node.
///
/// Legal transitions: `Idle -> Queued -> Running -> {Succeeded | Failed}`.
/// Terminal states leave only via an explicit clear (back to `Idle`) or a new
/// `Queued` transition when the node is re-run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// `Queued -> Failed` is permitted so submission failures surface without
    /// a synthetic `Running` hop. Transitions to `Idle` are not part of the
    /// machine; they happen only through an explicit clear.
    pub fn can_transition(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Idle, Queued)
                | (Queued, Running)
                | (Queued, Failed)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Succeeded, Queued)
                | (Failed, Queued)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Idle => "idle",
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Observable run state of one node: status, progress in `[0, 1]`, and an
/// optional error message. Transient state, never part of the persisted
/// document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRunState {
    pub status: RunStatus,
    pub progress: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeRunState {
    pub(crate) fn queued() -> Self {
        Self {
            status: RunStatus::Queued,
            progress: 0.0,
            error: None,
        }
    }
}
