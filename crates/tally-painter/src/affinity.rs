//! UI-thread affinity for render targets.
//!
//! Many widget toolkits may only be touched from the thread that created
//! them. [`AffineRenderer`] checks whether the caller already runs on the
//! UI context and, if not, hands the publish to it and waits for the result.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{sync_channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use tally_core::{Order, Portfolio};

use crate::error::{RenderError, RenderResult};
use crate::render::RenderTarget;

/// Jobs waiting for the UI thread. One slot per view plus headroom.
const UI_QUEUE_CAPACITY: usize = 4;

/// How long a caller waits for the UI thread to finish a publish.
const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Unit of work queued onto the UI context.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Execution context that owns the widgets.
pub trait UiDispatcher: Send + Sync {
    /// Returns true if the caller already runs on the UI context.
    fn check_access(&self) -> bool;

    /// Queue a job onto the UI context. Fails when the queue is full or closed.
    fn invoke(&self, job: UiJob) -> RenderResult<()>;
}

/// Dedicated UI thread draining a bounded job queue.
///
/// Dropping the handle closes the queue and joins the thread after it has
/// run the jobs already queued.
pub struct UiThread {
    tx: Option<mpsc::Sender<UiJob>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn spawn(name: &str) -> RenderResult<Self> {
        let (tx, mut rx) = mpsc::channel::<UiJob>(UI_QUEUE_CAPACITY);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        warn!("UI job panicked");
                    }
                }
                debug!("UI thread stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }
}

impl UiDispatcher for UiThread {
    fn check_access(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn invoke(&self, job: UiJob) -> RenderResult<()> {
        let tx = self.tx.as_ref().ok_or(RenderError::DispatcherClosed)?;
        tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => RenderError::DispatcherBusy,
            TrySendError::Closed(_) => RenderError::DispatcherClosed,
        })
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            // Joining ourselves would deadlock.
            if thread::current().id() != self.thread_id {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for UiThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiThread")
            .field("thread_id", &self.thread_id)
            .field("open", &self.tx.is_some())
            .finish()
    }
}

/// Render target wrapper that always publishes on the UI context.
///
/// Publishes from the UI context run inline. Publishes from anywhere else
/// are queued and the caller blocks until the UI thread reports the result,
/// so a failure on the UI side reaches the caller like an inline one. A full
/// queue, a timeout or a panicking target are reported as errors too.
pub struct AffineRenderer<R> {
    inner: Arc<R>,
    dispatcher: Arc<dyn UiDispatcher>,
    timeout: Duration,
}

impl<R: RenderTarget + 'static> AffineRenderer<R> {
    pub fn new(inner: Arc<R>, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self {
            inner,
            dispatcher,
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run_on_ui<F>(&self, view: &'static str, publish: F) -> RenderResult<()>
    where
        F: FnOnce(&R) -> RenderResult<()> + Send + 'static,
    {
        if self.dispatcher.check_access() {
            return publish(&self.inner);
        }

        let inner = self.inner.clone();
        let (done_tx, done_rx) = sync_channel(1);
        self.dispatcher.invoke(Box::new(move || {
            let _ = done_tx.send(publish(&inner));
        }))?;

        match done_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(RenderError::Timeout(self.timeout)),
            // Sender dropped without a result: the job panicked.
            Err(RecvTimeoutError::Disconnected) => Err(RenderError::Dropped(view)),
        }
    }
}

impl<R: RenderTarget + 'static> RenderTarget for AffineRenderer<R> {
    fn publish_portfolios(&self, portfolios: Vec<Portfolio>) -> RenderResult<()> {
        self.run_on_ui("portfolios", move |target| {
            target.publish_portfolios(portfolios)
        })
    }

    fn publish_orders(&self, orders: Vec<Order>) -> RenderResult<()> {
        self.run_on_ui("orders", move |target| target.publish_orders(orders))
    }
}
