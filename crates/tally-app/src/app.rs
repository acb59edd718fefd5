//! Application wiring and main loop.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tally_bus::{ConnectionRef, ConnectionRegistry, StateFeed, TradingConnection};
use tally_painter::{AffineRenderer, RefreshScheduler, UiThread};
use tally_state::{CloseAllReport, CloseOutcome, OrderStore, PortfolioStore};
use tally_telemetry::{LogSink, Metrics};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::log_renderer::LogRenderer;
use crate::replay::ReplayConnection;

/// Main application.
pub struct Application {
    config: AppConfig,
    portfolios: Arc<PortfolioStore>,
    orders: Arc<OrderStore>,
    registry: Arc<ConnectionRegistry>,
    feed: Arc<StateFeed>,
    log: LogSink,
    shutdown: CancellationToken,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        let portfolios = Arc::new(PortfolioStore::new());
        let orders = Arc::new(OrderStore::new());
        let log = LogSink::new("tally");
        let feed = Arc::new(StateFeed::new(
            portfolios.clone(),
            orders.clone(),
            log.for_source("feed"),
        ));

        Self {
            config,
            portfolios,
            orders,
            registry: Arc::new(ConnectionRegistry::new()),
            feed,
            log,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn portfolios(&self) -> &Arc<PortfolioStore> {
        &self.portfolios
    }

    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register an additional connection; the feed attaches it automatically
    /// while the application runs.
    pub fn register(&self, connection: ConnectionRef) -> AppResult<()> {
        self.registry.add(connection)?;
        Ok(())
    }

    /// Cancel every active order.
    pub fn close_all(&self) -> CloseAllReport {
        self.orders.close_all(self.registry.as_ref())
    }

    /// Cancel one order by its user number.
    pub fn close_order(&self, number_user: u64) -> Option<CloseOutcome> {
        self.orders
            .close_by_user_number(number_user, self.registry.as_ref())
    }

    /// Current metrics in the Prometheus text format.
    pub fn metrics_report(&self) -> AppResult<String> {
        Ok(Metrics::render()?)
    }

    fn build_scheduler(&self, ui: &Arc<UiThread>) -> RefreshScheduler {
        let painter_log = self.log.for_source("painter");
        let renderer = AffineRenderer::new(
            Arc::new(LogRenderer::new(self.portfolios.clone())),
            ui.clone(),
        );
        RefreshScheduler::new(
            self.config.painter.clone(),
            self.portfolios.clone(),
            self.orders.clone(),
            Arc::new(renderer),
            painter_log,
        )
    }

    /// Run until Ctrl+C or until the shutdown token is cancelled.
    pub async fn run(&self) -> AppResult<()> {
        info!(
            connections = self.config.connections.len(),
            refresh_interval_ms = self.config.painter.refresh_interval_ms,
            "Starting aggregator"
        );

        let watch = self.feed.watch_registry(&self.registry);

        let mut connections = Vec::with_capacity(self.config.connections.len());
        for connection_config in &self.config.connections {
            let connection = Arc::new(ReplayConnection::from_config(connection_config));
            self.register(connection.clone())?;
            connections.push(connection);
        }

        let ui = Arc::new(UiThread::spawn("tally-ui")?);
        let scheduler_handle = self.build_scheduler(&ui).spawn(self.shutdown.clone());

        let mut replays = JoinSet::new();
        for connection in connections {
            let token = self.shutdown.clone();
            replays.spawn(async move {
                let result = connection.replay(token).await;
                (connection.id().to_string(), result)
            });
        }

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = self.shutdown.cancelled() => break,
                Some(joined) = replays.join_next(), if !replays.is_empty() => {
                    match joined {
                        Ok((id, Ok(fired))) => info!(connection = %id, fired, "Replay connection drained"),
                        Ok((id, Err(e))) => self.log.error(format!("Replay connection {id} failed: {e}")),
                        Err(e) => error!(error = %e, "Replay task aborted"),
                    }
                }
            }
        }

        // Teardown
        self.shutdown.cancel();
        if let Err(e) = scheduler_handle.await {
            warn!(error = %e, "Refresh scheduler task failed");
        }
        replays.shutdown().await;

        if self.config.cancel_on_exit {
            let report = self.close_all();
            info!(
                sent = report.sent,
                no_connection = report.no_connection,
                failed = report.failed,
                "Working orders cancelled on exit"
            );
        }

        drop(watch);
        self.feed.detach_all();
        match self.metrics_report() {
            Ok(report) => debug!(metrics = %report, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
        info!(
            portfolios = self.portfolios.len(),
            orders = self.orders.len(),
            "Aggregator stopped"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("feed", &self.feed)
            .finish()
    }
}
