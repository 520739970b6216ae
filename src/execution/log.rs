//! Execution event log: fan-out of [`ExecutionEvent`]s to pluggable sinks.
//!
//! Producers emit through a cheap cloneable [`LogEmitter`]; a background task
//! drains the channel and hands each event to every registered sink. The
//! listener is idempotent to start and shuts down cleanly, flushing whatever
//! is already queued.

use std::io::{self, Result as IoResult, Stdout, Write};
use std::sync::{Arc, Mutex};

use tokio::{sync::oneshot, task};

use super::event::ExecutionEvent;
use crate::config::ComposerConfig;

/// Output target consuming structured execution events.
pub trait EventSink: Send + Sync {
    fn handle(&mut self, event: &ExecutionEvent) -> IoResult<()>;
}

/// Line-oriented stdout sink.
pub struct StdOutSink {
    handle: Stdout,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self {
            handle: io::stdout(),
        }
    }
}

impl EventSink for StdOutSink {
    fn handle(&mut self, event: &ExecutionEvent) -> IoResult<()> {
        writeln!(self.handle, "{event}")?;
        self.handle.flush()
    }
}

/// In-memory sink for tests and UI log panels.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<ExecutionEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    pub fn snapshot(&self) -> Vec<ExecutionEvent> {
        self.entries.lock().expect("sink poisoned").clone()
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &ExecutionEvent) -> IoResult<()> {
        self.entries
            .lock()
            .expect("sink poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// Cloneable producer handle for the execution log.
#[derive(Clone)]
pub struct LogEmitter {
    tx: flume::Sender<ExecutionEvent>,
}

impl LogEmitter {
    /// Emit an event. A full or closed channel drops the event; the log is
    /// diagnostics, not a durability guarantee.
    pub fn emit(&self, event: ExecutionEvent) {
        if let Err(err) = self.tx.try_send(event) {
            tracing::debug!(%err, "execution event dropped");
        }
    }
}

/// Fan-out hub for execution events.
pub struct ExecutionLog {
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    channel: (flume::Sender<ExecutionEvent>, flume::Receiver<ExecutionEvent>),
    listener: Mutex<Option<ListenerState>>,
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::with_sink(StdOutSink::default())
    }
}

impl ExecutionLog {
    /// Create a log with a single sink and the default buffer capacity.
    pub fn with_sink<S: EventSink + 'static>(sink: S) -> Self {
        Self::with_sinks(vec![Box::new(sink)], ComposerConfig::DEFAULT_EVENT_BUFFER_CAPACITY)
    }

    /// Create a log with multiple sinks and an explicit buffer capacity.
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>, buffer_capacity: usize) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(sinks)),
            channel: flume::bounded(buffer_capacity),
            listener: Mutex::new(None),
        }
    }

    /// Dynamically add a sink (e.g. a per-session log panel).
    pub fn add_sink<S: EventSink + 'static>(&self, sink: S) {
        self.sinks.lock().expect("sinks poisoned").push(Box::new(sink));
    }

    /// Producer handle for emitting events.
    pub fn emitter(&self) -> LogEmitter {
        LogEmitter {
            tx: self.channel.0.clone(),
        }
    }

    /// Spawn the background task that drains events into the sinks.
    /// Idempotent: calling again while listening has no effect.
    pub fn listen(&self) {
        let mut guard = self.listener.lock().expect("listener poisoned");
        if guard.is_some() {
            return;
        }

        let receiver = self.channel.1.clone();
        let sinks = self.sinks.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = receiver.recv_async() => match recv {
                        Err(_) => break,
                        Ok(event) => {
                            let mut sinks_guard = sinks.lock().expect("sinks poisoned");
                            for sink in sinks_guard.iter_mut() {
                                if let Err(err) = sink.handle(&event) {
                                    tracing::warn!(%err, "execution log sink error");
                                }
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the background listener, draining events already queued.
    pub async fn stop(&self) {
        let state = {
            let mut guard = self.listener.lock().expect("listener poisoned");
            guard.take()
        };
        if let Some(state) = state {
            // Drain what is already buffered before signalling shutdown.
            while !self.channel.1.is_empty() {
                tokio::task::yield_now().await;
            }
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }
}

impl Drop for ExecutionLog {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(state) = guard.take() {
                let _ = state.shutdown_tx.send(());
                state.handle.abort();
            }
        }
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}
