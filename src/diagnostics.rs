//! Leveled diagnostic messages emitted by catalog components.
//!
//! Components receive a [`Diagnostics`] handle instead of logging through a
//! process-wide logger, so tests can capture exactly what an operation reported.
//! [`TracingDiagnostics`] is the production sink and forwards to `tracing`.

use std::sync::{Mutex, PoisonError};

use tracing::Level;

/// A sink for leveled diagnostic messages.
pub trait Diagnostics: Send + Sync {
    /// Records one message at the given level.
    fn emit(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::ERROR, message);
    }
}

/// Forwards every message to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "bibliophile", "{message}"),
            Level::WARN => tracing::warn!(target: "bibliophile", "{message}"),
            Level::INFO => tracing::info!(target: "bibliophile", "{message}"),
            Level::DEBUG => tracing::debug!(target: "bibliophile", "{message}"),
            Level::TRACE => tracing::trace!(target: "bibliophile", "{message}"),
        }
    }
}

/// One captured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Keeps every emitted message in memory.
#[derive(Debug, Default)]
pub struct CapturedDiagnostics {
    messages: Mutex<Vec<Diagnostic>>,
}

impl CapturedDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything emitted so far.
    #[must_use]
    pub fn messages(&self) -> Vec<Diagnostic> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the messages emitted at exactly `level`.
    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|diagnostic| diagnostic.level == level)
            .map(|diagnostic| diagnostic.message)
            .collect()
    }
}

impl Diagnostics for CapturedDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Diagnostic {
                level,
                message: message.to_string(),
            });
    }
}
