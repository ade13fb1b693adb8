//! Persisted visit counter.
//!
//! In-memory counting is always authoritative; the backing file is a
//! lagging snapshot. A single background task owns every physical write,
//! which both serializes writes and debounces bursts of increments into
//! one disk operation.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::core::config::CounterConfig;
use crate::core::errors::CounterError;

pub mod lifecycle;
pub mod store;

struct FlushRequest {
    force: bool,
    ack: Option<oneshot::Sender<()>>,
}

/// State shared between the counter handle and the writer task.
struct CounterShared {
    count: Mutex<u64>,
    /// True while a non-forced flush request is queued; collapses bursts.
    pending: AtomicBool,
    path: PathBuf,
}

/// Thread-safe visit counter with debounced asynchronous persistence.
///
/// `increment` and `current` are plain synchronous calls and never touch
/// the disk; the writer task picks up scheduled flushes on its own time.
/// Construct one per process via [`lifecycle::CounterLifecycle`] (or
/// [`VisitCounter::open`] directly) and call [`VisitCounter::close`] from
/// the shutdown path so the final increments land on disk.
pub struct VisitCounter {
    shared: Arc<CounterShared>,
    tx: Mutex<Option<mpsc::UnboundedSender<FlushRequest>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    shutdown_timeout: Duration,
}

impl VisitCounter {
    /// Loads the persisted count from `path` and starts the writer task.
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl Into<PathBuf>, config: &CounterConfig) -> Arc<Self> {
        let path = path.into();
        let initial = store::load(&path);

        // Write the record up front so a fresh deployment finds the file
        // in its data directory immediately.
        if let Err(e) = store::save(&path, initial) {
            warn!("could not initialize backing file {}: {}", path.display(), e);
        }

        let shared = Arc::new(CounterShared {
            count: Mutex::new(initial),
            pending: AtomicBool::new(false),
            path,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(shared.clone(), rx, config.debounce_interval()));

        info!(count = initial, "visit counter loaded from {}", shared.path.display());
        Arc::new(Self {
            shared,
            tx: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Path of the backing file this counter persists to.
    pub fn backing_file(&self) -> &Path {
        &self.shared.path
    }

    /// Adds one visit and returns the new total. Never blocks on I/O; a
    /// write-back is scheduled for the background writer instead.
    pub fn increment(&self) -> u64 {
        let value = {
            let mut count = self.shared.count.lock();
            *count += 1;
            *count
        };
        self.schedule_flush();
        value
    }

    /// Current in-memory total. Reflects every completed `increment`,
    /// whether or not it has been persisted yet.
    pub fn current(&self) -> u64 {
        *self.shared.count.lock()
    }

    /// Resets the count to zero and forces a write-back, waiting (bounded)
    /// for the write attempt to finish.
    pub async fn reset(&self) -> Result<(), CounterError> {
        {
            let mut count = self.shared.count.lock();
            *count = 0;
        }
        info!("visit count reset to 0");
        self.force_flush().await
    }

    /// Forces a final flush and stops the writer task. Idempotent; invoked
    /// deterministically by the server shutdown path. Failures are logged,
    /// never raised, so shutdown always completes.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.force_flush().await {
            warn!("final visit count flush failed: {}", e);
        }

        let tx = self.tx.lock().take();
        drop(tx);

        let handle = self.writer.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.shutdown_timeout, handle).await {
                Ok(Ok(())) => debug!("counter writer task stopped"),
                Ok(Err(e)) => warn!("counter writer task failed: {}", e),
                Err(_) => warn!("counter writer task did not stop within the shutdown window"),
            }
        }
    }

    /// Queues a debounced flush. At most one non-forced request sits in the
    /// channel at a time; the in-memory count stays correct even when the
    /// writer is already gone.
    fn schedule_flush(&self) {
        if self.shared.pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let sent = match self.tx.lock().as_ref() {
            Some(tx) => tx.send(FlushRequest { force: false, ack: None }).is_ok(),
            None => false,
        };
        if !sent {
            self.shared.pending.store(false, Ordering::SeqCst);
            debug!("writer unavailable, visit count kept in memory only");
        }
    }

    /// Queues a forced flush (bypasses debounce and the pending check) and
    /// awaits its acknowledgement with a bounded wait.
    async fn force_flush(&self) -> Result<(), CounterError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        {
            let guard = self.tx.lock();
            let tx = guard.as_ref().ok_or(CounterError::ChannelClosed)?;
            tx.send(FlushRequest { force: true, ack: Some(ack_tx) })
                .map_err(|_| CounterError::ChannelClosed)?;
        }
        match tokio::time::timeout(self.shutdown_timeout, ack_rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(CounterError::ChannelClosed),
            Err(_) => Err(CounterError::TimeoutError(
                "forced flush acknowledgement".to_string(),
            )),
        }
    }
}

/// The single owner of physical writes. Consumes flush requests, sleeps
/// out the debounce window for non-forced ones (coalescing whatever else
/// arrives meanwhile), samples the count and rewrites the backing file.
/// Write errors are logged and the next request simply retries.
async fn write_loop(
    shared: Arc<CounterShared>,
    mut rx: mpsc::UnboundedReceiver<FlushRequest>,
    debounce: Duration,
) {
    // open() wrote the file just before spawning us
    let mut last_write = Instant::now();

    while let Some(FlushRequest { force, ack }) = rx.recv().await {
        let mut acks = Vec::new();
        if let Some(ack) = ack {
            acks.push(ack);
        }

        if !force {
            let deadline = last_write + debounce;
            'wait: while Instant::now() < deadline {
                tokio::select! {
                    _ = sleep_until(deadline) => break 'wait,
                    next = rx.recv() => match next {
                        Some(req) => {
                            let cut_short = req.force;
                            if let Some(ack) = req.ack {
                                acks.push(ack);
                            }
                            if cut_short {
                                break 'wait;
                            }
                        }
                        None => break 'wait,
                    }
                }
            }
        }

        // Clear pending before sampling so an increment landing after the
        // sample schedules its own flush.
        shared.pending.store(false, Ordering::SeqCst);
        let value = *shared.count.lock();

        // Disk I/O goes to the blocking pool so an unresponsive filesystem
        // never stalls other tasks on this worker.
        let path = shared.path.clone();
        match tokio::task::spawn_blocking(move || store::save(&path, value)).await {
            Ok(Ok(())) => {
                last_write = Instant::now();
                debug!(count = value, "visit count persisted");
            }
            Ok(Err(e)) => warn!("failed to persist visit count: {}", e),
            Err(e) => warn!("visit count persist task failed to run: {}", e),
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
}
