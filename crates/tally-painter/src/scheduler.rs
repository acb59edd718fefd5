//! Dirty-flag driven refresh loop.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use tally_state::{DirtyFlag, OrderStore, PortfolioStore};
use tally_telemetry::{LogSink, Metrics};

use crate::config::PainterConfig;
use crate::error::RenderResult;
use crate::render::RenderTarget;

/// Runtime switch for painting (start/stop paint).
///
/// While stopped, ticks publish nothing and leave the dirty flags set, so
/// the first tick after restarting paints the latest state.
#[derive(Debug, Clone)]
pub struct PaintSwitch {
    painting: Arc<AtomicBool>,
}

impl PaintSwitch {
    fn new(painting: bool) -> Self {
        Self {
            painting: Arc::new(AtomicBool::new(painting)),
        }
    }

    pub fn start(&self) {
        if !self.painting.swap(true, Ordering::SeqCst) {
            info!("Painting started");
        }
    }

    pub fn stop(&self) {
        if self.painting.swap(false, Ordering::SeqCst) {
            info!("Painting stopped");
        }
    }

    pub fn is_painting(&self) -> bool {
        self.painting.load(Ordering::SeqCst)
    }
}

/// Views published by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub orders_published: bool,
    pub portfolios_published: bool,
}

/// Periodically publishes store snapshots to a render target.
///
/// Each tick checks the order view first, then the portfolio view. A view is
/// published only when its store is dirty; the flag is taken before the
/// snapshot is read, so a mutation racing with the publish re-marks it and
/// is painted on the next tick. A failed or panicking publish re-marks the
/// flag and never stops the loop.
pub struct RefreshScheduler {
    portfolios: Arc<PortfolioStore>,
    orders: Arc<OrderStore>,
    target: Arc<dyn RenderTarget>,
    config: PainterConfig,
    switch: PaintSwitch,
    log: LogSink,
}

impl RefreshScheduler {
    pub fn new(
        config: PainterConfig,
        portfolios: Arc<PortfolioStore>,
        orders: Arc<OrderStore>,
        target: Arc<dyn RenderTarget>,
        log: LogSink,
    ) -> Self {
        Self {
            portfolios,
            orders,
            target,
            switch: PaintSwitch::new(config.start_painting),
            config,
            log,
        }
    }

    /// Handle for starting and stopping painting at runtime.
    pub fn paint_switch(&self) -> PaintSwitch {
        self.switch.clone()
    }

    pub fn interval(&self) -> Duration {
        self.config.refresh_interval()
    }

    /// Run one refresh cycle.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        if !self.switch.is_painting() {
            return report;
        }

        if self.config.paint_orders {
            report.orders_published =
                self.publish_if_dirty("orders", self.orders.dirty(), || {
                    self.target.publish_orders(self.orders.snapshot())
                });
        }

        if self.config.paint_portfolios {
            report.portfolios_published =
                self.publish_if_dirty("portfolios", self.portfolios.dirty(), || {
                    self.target.publish_portfolios(self.portfolios.snapshot())
                });
        }

        report
    }

    fn publish_if_dirty<F>(&self, view: &'static str, dirty: &DirtyFlag, publish: F) -> bool
    where
        F: FnOnce() -> RenderResult<()>,
    {
        if !dirty.take() {
            return false;
        }

        match catch_unwind(AssertUnwindSafe(publish)) {
            Ok(Ok(())) => {
                trace!(view, "Snapshot published");
                Metrics::snapshot_published(view);
                true
            }
            Ok(Err(e)) => {
                dirty.mark();
                Metrics::publish_failed(view);
                self.log.error(format!("Failed to paint {view}: {e}"));
                false
            }
            Err(_) => {
                dirty.mark();
                Metrics::publish_failed(view);
                self.log.error(format!("Render target panicked while painting {view}"));
                false
            }
        }
    }

    /// Tick every interval until `shutdown` is cancelled.
    ///
    /// Ticks run on the blocking pool: a render target may wait for another
    /// thread to finish painting.
    pub async fn run(self, shutdown: CancellationToken) {
        let period = self.interval();
        info!(interval_ms = period.as_millis() as u64, "Refresh scheduler started");

        let scheduler = Arc::new(self);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; paint one period after start.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let s = scheduler.clone();
                    match tokio::task::spawn_blocking(move || s.tick()).await {
                        Ok(report) if report != TickReport::default() => {
                            debug!(?report, "Refresh tick");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Refresh tick aborted"),
                    }
                }
            }
        }

        info!("Refresh scheduler stopped");
    }

    /// Start the loop on the runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("config", &self.config)
            .field("painting", &self.switch.is_painting())
            .finish()
    }
}
