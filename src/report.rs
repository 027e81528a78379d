use std::sync::{Arc, Mutex};

use tracing::error;

use crate::error::RuntimeError;

/// Sink for internal faults that must never reach the caller.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &RuntimeError);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &RuntimeError) {
        error!(error = %err, "collection runtime error");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _error: &RuntimeError) {}
}

/// Keeps reported errors in a shared buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferReporter {
    buffer: Arc<Mutex<Vec<RuntimeError>>>,
}

impl BufferReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors reported so far.
    pub fn errors(&self) -> Vec<RuntimeError> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ErrorReporter for BufferReporter {
    fn report(&self, error: &RuntimeError) {
        match self.buffer.lock() {
            Ok(mut buffer) => buffer.push(error.clone()),
            Err(poisoned) => poisoned.into_inner().push(error.clone()),
        }
    }
}
