//! Composer configuration.

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Tunables for a composer session.
///
/// Defaults resolve from the environment (`.env` files honored) so deployed
/// editors can tune limits without code changes.
#[derive(Clone, Debug)]
pub struct ComposerConfig {
    /// Maximum undo depth; oldest entries are evicted FIFO beyond this.
    pub history_limit: usize,
    /// Buffer capacity for the execution event channel.
    pub event_buffer_capacity: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            history_limit: Self::resolve_history_limit(None),
            event_buffer_capacity: Self::DEFAULT_EVENT_BUFFER_CAPACITY,
        }
    }
}

impl ComposerConfig {
    pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 1024;

    fn resolve_history_limit(provided: Option<usize>) -> usize {
        if let Some(limit) = provided {
            return limit;
        }
        dotenvy::dotenv().ok();
        std::env::var("NODECANVAS_HISTORY_LIMIT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    pub fn new(history_limit: Option<usize>) -> Self {
        Self {
            history_limit: Self::resolve_history_limit(history_limit),
            event_buffer_capacity: Self::DEFAULT_EVENT_BUFFER_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_event_buffer_capacity(mut self, capacity: usize) -> Self {
        self.event_buffer_capacity = capacity;
        self
    }
}
