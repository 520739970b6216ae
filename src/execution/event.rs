//! Structured execution events for the diagnostic log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an execution event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventLevel::Info => "info",
            EventLevel::Warn => "warn",
            EventLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// One timestamped entry in the execution log, optionally scoped to a node.
///
/// # Examples
///
/// ```rust
/// use nodecanvas::execution::ExecutionEvent;
///
/// let event = ExecutionEvent::node_info("prompt-1", "job queued");
/// assert_eq!(event.node_id.as_deref(), Some("prompt-1"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    #[serde(default = "Utc::now")]
    pub when: DateTime<Utc>,
    pub level: EventLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub message: String,
}

impl ExecutionEvent {
    fn new(level: EventLevel, node_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            when: Utc::now(),
            level,
            node_id,
            message: message.into(),
        }
    }

    /// Run-scoped informational event.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, None, message)
    }

    /// Node-scoped informational event.
    pub fn node_info(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, Some(node_id.into()), message)
    }

    /// Node-scoped warning.
    pub fn node_warn(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventLevel::Warn, Some(node_id.into()), message)
    }

    /// Node-scoped error.
    pub fn node_error(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventLevel::Error, Some(node_id.into()), message)
    }
}

impl fmt::Display for ExecutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_id {
            Some(node_id) => write!(
                f,
                "{} [{}] node={} {}",
                self.when.to_rfc3339(),
                self.level,
                node_id,
                self.message
            ),
            None => write!(
                f,
                "{} [{}] {}",
                self.when.to_rfc3339(),
                self.level,
                self.message
            ),
        }
    }
}
