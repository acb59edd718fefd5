//! Operator log sink.
//!
//! Components report operator-facing messages through a [`LogSink`]. Each
//! message is emitted as a tracing event and broadcast to whoever subscribed
//! (a log window, a journal writer). When nobody is subscribed, error
//! messages are pushed through a synchronous fallback alert so the operator
//! still sees them.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Default broadcast capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One operator message.
#[derive(Debug, Clone, Serialize)]
pub struct LogMessage {
    /// Component that raised the message.
    pub source: &'static str,
    pub severity: Severity,
    pub message: String,
    /// Unix milliseconds.
    pub timestamp_ms: i64,
}

/// Synchronous alert path used when an error has no subscriber.
pub type AlertFallback = Arc<dyn Fn(&LogMessage) + Send + Sync>;

/// Fire-and-forget operator log sink.
///
/// Cheap to clone; clones share the same subscribers and fallback.
#[derive(Clone)]
pub struct LogSink {
    source: &'static str,
    tx: broadcast::Sender<LogMessage>,
    fallback: AlertFallback,
}

impl LogSink {
    /// Create a sink for a component, alerting on stderr when unobserved.
    pub fn new(source: &'static str) -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self {
            source,
            tx,
            fallback: Arc::new(stderr_alert),
        }
    }

    /// Replace the fallback alert path.
    #[must_use]
    pub fn with_fallback(mut self, fallback: AlertFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// A sink for another component sharing subscribers and fallback.
    #[must_use]
    pub fn for_source(&self, source: &'static str) -> Self {
        Self {
            source,
            tx: self.tx.clone(),
            fallback: self.fallback.clone(),
        }
    }

    /// Subscribe to operator messages.
    pub fn subscribe(&self) -> broadcast::Receiver<LogMessage> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send a message. Never blocks and never fails.
    pub fn send(&self, message: impl Into<String>, severity: Severity) {
        let msg = LogMessage {
            source: self.source,
            severity,
            message: message.into(),
            timestamp_ms: Utc::now().timestamp_millis(),
        };

        match msg.severity {
            Severity::Debug => debug!(source = msg.source, "{}", msg.message),
            Severity::Info => info!(source = msg.source, "{}", msg.message),
            Severity::Warning => warn!(source = msg.source, "{}", msg.message),
            Severity::Error => error!(source = msg.source, "{}", msg.message),
        }

        // send() only fails when there are no receivers.
        if let Err(broadcast::error::SendError(msg)) = self.tx.send(msg) {
            if msg.severity == Severity::Error {
                (self.fallback)(&msg);
            }
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(message, Severity::Info);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.send(message, Severity::Warning);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(message, Severity::Error);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("source", &self.source)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

fn stderr_alert(msg: &LogMessage) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(
        stderr,
        "[{}] {} {}: {}",
        msg.timestamp_ms, msg.severity, msg.source, msg.message
    );
}
