//! Execution status overlay: transient per-node run state, stale-stream
//! protection, and the diagnostic event log.
//!
//! The overlay is kept separate from the document. Run state is never
//! persisted and never enters undo history.

pub mod event;
pub mod log;
pub mod status;
pub mod tracker;

pub use event::{EventLevel, ExecutionEvent};
pub use log::{EventSink, ExecutionLog, LogEmitter, MemorySink, StdOutSink};
pub use status::{NodeRunState, RunStatus};
pub use tracker::{ExecutionTracker, JobTicket, JobUpdate};
