//! Counter lifecycle: one counter per process, bound to a caller-supplied
//! path at startup, closed deterministically at shutdown.

use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::CounterConfig;
use crate::core::errors::CounterError;
use crate::counter::VisitCounter;

/// Owns the process-wide [`VisitCounter`]. Construction is decoupled from
/// module load so no backing file appears before the hosting layer has
/// decided on a data directory.
pub struct CounterLifecycle {
    cell: OnceCell<Arc<VisitCounter>>,
    config: CounterConfig,
}

impl CounterLifecycle {
    pub fn new(config: CounterConfig) -> Self {
        Self { cell: OnceCell::new(), config }
    }

    /// Idempotent initialization: the first call fixes the backing path for
    /// the process lifetime; later calls return the existing counter.
    pub fn init(&self, path: impl Into<PathBuf>) -> Arc<VisitCounter> {
        let path = path.into();
        if let Some(existing) = self.cell.get() {
            if existing.backing_file() != path {
                warn!(
                    "visit counter already bound to {}; ignoring {}",
                    existing.backing_file().display(),
                    path.display()
                );
            }
            return existing.clone();
        }
        self.cell
            .get_or_init(|| VisitCounter::open(path, &self.config))
            .clone()
    }

    /// Fail-fast accessor: using the counter before `init` is a
    /// configuration error and is surfaced loudly, never silently zero.
    pub fn counter(&self) -> Result<&Arc<VisitCounter>, CounterError> {
        self.cell.get().ok_or(CounterError::NotInitialized)
    }

    /// Forces the final flush and stops the writer. Safe to call whether or
    /// not `init` ever ran; the process always gets to exit.
    pub async fn shutdown(&self) {
        match self.cell.get() {
            Some(counter) => {
                info!("flushing visit counter before exit");
                counter.close().await;
            }
            None => info!("visit counter never initialized, nothing to flush"),
        }
    }
}
