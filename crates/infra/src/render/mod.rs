//! Render worker: consumes build orders and reports results back.
//!
//! The rendering engine itself is external and sits behind [`Renderer`]. The
//! worker only sequences the write-back: `build_started`, run the renderer,
//! `build_completed`.

use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use printmaps_core::BuildReport;

use crate::lifecycle::{BuildReporter, InternalError};
use crate::orders::{BuildOrder, OrderReceiver, QueueError};
use crate::store::RecordStore;

/// Map rendering engine.
pub trait Renderer: Send + Sync {
    /// Render one order. Failures are part of the report, not an error.
    fn render(&self, order: &BuildOrder) -> BuildReport;
}

impl<F> Renderer for F
where
    F: Fn(&BuildOrder) -> BuildReport + Send + Sync,
{
    fn render(&self, order: &BuildOrder) -> BuildReport {
        self(order)
    }
}

/// Render worker configuration.
#[derive(Debug, Clone)]
pub struct RenderWorkerConfig {
    /// How long to wait for an order before checking for shutdown
    pub poll_interval: Duration,
    /// Name for logging and the worker thread
    pub name: String,
}

impl Default for RenderWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "render-worker".to_string(),
        }
    }
}

impl RenderWorkerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Worker runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RenderStats {
    pub orders_received: u64,
    pub builds_succeeded: u64,
    pub builds_failed: u64,
    pub report_failures: u64,
    /// Orders superseded by a resubmission before their write-back landed
    pub stale_orders: u64,
    pub uptime_secs: u64,
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct RenderWorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<RenderStats>>,
}

impl RenderWorkerHandle {
    /// Request graceful shutdown and wait for the current order to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub struct RenderWorker<S, R> {
    reporter: BuildReporter<S>,
    renderer: R,
}

impl<S, R> RenderWorker<S, R>
where
    S: RecordStore + 'static,
    R: Renderer + 'static,
{
    pub fn new(reporter: BuildReporter<S>, renderer: R) -> Self {
        Self { reporter, renderer }
    }

    /// Process a single order synchronously.
    pub fn process(&self, order: &BuildOrder) -> Result<BuildReport, InternalError> {
        self.reporter.build_started(order)?;
        let report = self.renderer.render(order);
        self.reporter.build_completed(order, report.clone())?;
        Ok(report)
    }

    /// Spawn the worker in a background thread.
    pub fn spawn(
        self,
        orders: OrderReceiver,
        config: RenderWorkerConfig,
    ) -> std::io::Result<RenderWorkerHandle>
    where
        S: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(RenderStats::default()));
        let stats_clone = stats.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || worker_loop(self, orders, config, shutdown_rx, stats_clone))?;

        Ok(RenderWorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

fn worker_loop<S, R>(
    worker: RenderWorker<S, R>,
    orders: OrderReceiver,
    config: RenderWorkerConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<RenderStats>>,
) where
    S: RecordStore + 'static,
    R: Renderer + 'static,
{
    info!(worker = %config.name, "render worker started");
    let start_time = Instant::now();

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        stats.lock().unwrap_or_else(PoisonError::into_inner).uptime_secs =
            start_time.elapsed().as_secs();

        let order = match orders.recv_timeout(config.poll_interval) {
            Ok(Some(order)) => order,
            Ok(None) => continue,
            Err(QueueError::Closed) => {
                debug!(worker = %config.name, "order queue closed");
                break;
            }
            Err(e) => {
                error!(worker = %config.name, error = %e, "failed to receive order");
                continue;
            }
        };

        debug!(worker = %config.name, job_id = %order.id, "received build order");
        let result = worker.process(&order);

        let mut s = stats.lock().unwrap_or_else(PoisonError::into_inner);
        s.orders_received += 1;
        match result {
            Ok(report) if report.successful => s.builds_succeeded += 1,
            Ok(_) => s.builds_failed += 1,
            Err(InternalError::StaleOrder { .. }) => {
                s.stale_orders += 1;
                debug!(worker = %config.name, job_id = %order.id, "skipped superseded order");
            }
            Err(e) => {
                s.report_failures += 1;
                error!(worker = %config.name, job_id = %order.id, error = %e, "build write-back failed");
            }
        }
    }

    info!(worker = %config.name, "render worker stopped");
}
