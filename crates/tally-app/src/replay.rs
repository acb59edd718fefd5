//! JSON-lines replay connection.
//!
//! Plays back a recorded session file so the aggregator can run without a
//! venue. Each non-empty line holds one `ServerEvent`; lines that fail to
//! parse are logged and skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tally_bus::{BusResult, EventHub, ServerEvent, TradingConnection};
use tally_core::{Order, ServerKind};

use crate::config::ConnectionConfig;
use crate::error::{AppError, AppResult};

/// Connection replaying events from a file.
pub struct ReplayConnection {
    id: String,
    kind: ServerKind,
    events_path: PathBuf,
    pacing: Duration,
    hub: EventHub<ServerEvent>,
    cancel_requests: Mutex<Vec<u64>>,
}

impl ReplayConnection {
    pub fn new(id: impl Into<String>, kind: ServerKind, events_path: impl AsRef<Path>) -> Self {
        Self {
            id: id.into(),
            kind,
            events_path: events_path.as_ref().to_path_buf(),
            pacing: Duration::ZERO,
            hub: EventHub::new(),
            cancel_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.id.clone(), config.kind, &config.events).with_pacing(config.pacing())
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// User numbers of the orders a cancel was requested for.
    pub fn cancel_requests(&self) -> Vec<u64> {
        self.cancel_requests.lock().clone()
    }

    /// Parse the event file.
    pub async fn load(&self) -> AppResult<Vec<ServerEvent>> {
        let content = tokio::fs::read_to_string(&self.events_path)
            .await
            .map_err(|e| AppError::Replay {
                file: self.events_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut events = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ServerEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    connection = %self.id,
                    line = idx + 1,
                    error = %e,
                    "Skipping unreadable replay line"
                ),
            }
        }
        Ok(events)
    }

    /// Fire every event in the file, pausing `pacing` between events.
    ///
    /// Stops early when `shutdown` is cancelled. Returns the number of
    /// events fired.
    pub async fn replay(&self, shutdown: CancellationToken) -> AppResult<usize> {
        let events = self.load().await?;
        info!(connection = %self.id, events = events.len(), "Replay started");

        let mut fired = 0;
        for event in &events {
            if shutdown.is_cancelled() {
                break;
            }
            self.hub.emit(event);
            fired += 1;

            if !self.pacing.is_zero() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.pacing) => {}
                }
            }
        }

        info!(connection = %self.id, fired, "Replay finished");
        Ok(fired)
    }
}

impl TradingConnection for ReplayConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ServerKind {
        self.kind
    }

    fn events(&self) -> &EventHub<ServerEvent> {
        &self.hub
    }

    fn cancel_order(&self, order: &Order) -> BusResult<()> {
        info!(
            connection = %self.id,
            number_user = order.number_user,
            number_market = %order.number_market,
            "Cancel requested"
        );
        self.cancel_requests.lock().push(order.number_user);
        Ok(())
    }
}

impl std::fmt::Debug for ReplayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayConnection")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("events_path", &self.events_path)
            .finish()
    }
}
