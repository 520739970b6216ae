//! Linear undo/redo history over graph documents.
//!
//! [`History`] is the standard three-part state machine: a bounded `past`
//! stack, the live `present` document, and a `future` stack populated only by
//! undo. Snapshots are owned clones of the document, never live references,
//! so later mutation of the present cannot alias into recorded entries.
//!
//! Two mutation paths exist:
//!
//! - [`set_with_history`](History::set_with_history) records an entry when
//!   the update structurally changes the document, and clears `future`.
//! - [`present_mut`](History::present_mut) mutates the live document with no
//!   recording, for continuous interactions such as dragging. A drag gesture
//!   commits exactly one entry at gesture end via
//!   [`begin_gesture`](History::begin_gesture) /
//!   [`end_gesture`](History::end_gesture).
//!
//! Undoing or redoing past an empty stack is a silent no-op.

use std::collections::VecDeque;

use crate::document::GraphDocument;

/// Default maximum depth of the undo stack.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Bounded linear undo/redo history for a [`GraphDocument`].
#[derive(Clone, Debug)]
pub struct History {
    past: VecDeque<GraphDocument>,
    present: GraphDocument,
    future: Vec<GraphDocument>,
    limit: usize,
    gesture_baseline: Option<GraphDocument>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(GraphDocument::new(), DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create a history around an initial document with the given depth cap.
    ///
    /// A zero limit is treated as 1: a history that can never record an entry
    /// would make undo silently dead.
    pub fn new(present: GraphDocument, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
            limit: limit.max(1),
            gesture_baseline: None,
        }
    }

    /// The live document.
    pub fn present(&self) -> &GraphDocument {
        &self.present
    }

    /// Mutable access to the live document, bypassing history.
    ///
    /// Used for transient per-frame updates (drag positions). Anything that
    /// should be undoable goes through [`set_with_history`](Self::set_with_history)
    /// or a gesture instead.
    pub fn present_mut(&mut self) -> &mut GraphDocument {
        &mut self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Depth of the past stack. Exposed for capacity tests and diagnostics.
    pub fn depth(&self) -> usize {
        self.past.len()
    }

    /// Apply `updater` to the present document, recording a history entry if
    /// the result is structurally different.
    ///
    /// Structurally-equal results are a complete no-op: no entry is pushed
    /// and the `future` stack is left intact.
    pub fn set_with_history<F>(&mut self, updater: F)
    where
        F: FnOnce(&GraphDocument) -> GraphDocument,
    {
        let next = updater(&self.present);
        if next == self.present {
            return;
        }
        let previous = std::mem::replace(&mut self.present, next);
        self.push_past(previous);
        self.future.clear();
    }

    /// Step back one entry. No-op when the past stack is empty.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        true
    }

    /// Step forward one entry. No-op when the future stack is empty.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        true
    }

    /// Begin a continuous gesture (drag), storing the pre-gesture document.
    ///
    /// While a gesture is open the caller mutates the live document through
    /// [`present_mut`](Self::present_mut); intermediate frames are never
    /// recorded. Beginning a gesture while one is open keeps the original
    /// baseline so the whole span still commits as one entry.
    pub fn begin_gesture(&mut self) {
        if self.gesture_baseline.is_none() {
            self.gesture_baseline = Some(self.present.clone());
        }
    }

    /// End the gesture, committing at most one history entry.
    ///
    /// The stored baseline is spliced directly into the past stack; the live
    /// document is never reverted, so observers see no intermediate state.
    /// If nothing changed during the gesture, nothing is recorded.
    pub fn end_gesture(&mut self) -> bool {
        let Some(baseline) = self.gesture_baseline.take() else {
            return false;
        };
        if baseline == self.present {
            return false;
        }
        self.push_past(baseline);
        self.future.clear();
        true
    }

    /// Drop all recorded entries, keeping the present document.
    pub fn reset(&mut self) {
        self.past.clear();
        self.future.clear();
        self.gesture_baseline = None;
    }

    /// Replace the present document and drop all history, e.g. after loading
    /// a persisted workflow.
    pub fn replace(&mut self, present: GraphDocument) {
        self.present = present;
        self.reset();
    }

    fn push_past(&mut self, snapshot: GraphDocument) {
        if self.past.len() == self.limit {
            // FIFO eviction keeps long sessions bounded.
            self.past.pop_front();
        }
        self.past.push_back(snapshot);
    }
}
