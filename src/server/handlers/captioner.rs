//! Module implementing the worker pool that does the image captioning.
//! This is used by the /caption request handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use memecap::{CaptionError, CaptionOutput, Engine, ImageSource};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task;
use tokio::time::timeout;


/// Renders captions onto images in background threads.
pub struct Captioner {
    engine: Engine,
    permits: Arc<Semaphore>,
    thread_count: usize,
    // Zero means no timeout.
    task_timeout: Duration,
    stats: Stats,
}

impl Captioner {
    /// Create the `Captioner`.
    ///
    /// At most `thread_count` images will be captioned at the same time;
    /// if it's zero, the number of CPUs is used.
    pub fn new(engine: Engine, thread_count: usize, task_timeout: Duration) -> Self {
        let thread_count = if thread_count > 0 {
            thread_count
        } else {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        };
        trace!("Allowing {} concurrent caption task(s)", thread_count);
        if task_timeout.is_zero() {
            trace!("Caption request timeout disabled");
        } else {
            trace!("Setting caption request timeout to {} secs", task_timeout.as_secs());
        }

        Captioner{
            engine,
            permits: Arc::new(Semaphore::new(thread_count)),
            thread_count,
            task_timeout,
            stats: Stats::default(),
        }
    }
}

// Accessors.
impl Captioner {
    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Snapshot of the rendering statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot{
            threads: self.thread_count,
            busy: self.thread_count.saturating_sub(self.permits.available_permits()),
            rendered: self.stats.rendered.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            timed_out: self.stats.timed_out.load(Ordering::Relaxed),
        }
    }
}

// Rendering code.
impl Captioner {
    /// Caption the image from given source with given text.
    /// The rendering is done in a separate, blocking thread.
    pub async fn render(&self, source: ImageSource, text: String) -> Result<CaptionOutput, RenderError> {
        let permit = self.permits.clone().acquire_owned().await
            .map_err(|_| RenderError::Unavailable)?;

        let source_repr = format!("{:?}", source);
        let engine = self.engine.clone();
        let handle = task::spawn_blocking(move || {
            let _permit = permit;
            engine.caption(source, &text)
        });

        // A timed out task still runs to completion (holding its permit),
        // as blocking threads cannot be interrupted.
        let joined = if self.task_timeout.is_zero() {
            handle.await
        } else {
            match timeout(self.task_timeout, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Captioning {} timed out after {} secs",
                        source_repr, self.task_timeout.as_secs());
                    self.stats.timed_out.fetch_add(1, Ordering::Relaxed);
                    return Err(RenderError::Timeout);
                }
            }
        };

        match joined {
            Ok(Ok(out)) => {
                debug!("Successfully captioned {} as {:?}, final result size: {} bytes",
                    source_repr, out.format(), out.len());
                self.stats.rendered.fetch_add(1, Ordering::Relaxed);
                Ok(out)
            }
            Ok(Err(e)) => {
                error!("Failed to caption {}: {}", source_repr, e);
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(RenderError::Caption(e))
            }
            Err(e) => {
                error!("Caption task for {} did not finish: {}", source_repr, e);
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(RenderError::Unavailable)
            }
        }
    }
}


/// Error that can occur during the image captioning process.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error during the captioning process.
    #[error(transparent)]
    Caption(#[from] CaptionError),
    /// Timeout while performing the caption request.
    #[error("captioning took too long")]
    Timeout,
    /// Captioning service temporarily unavailable.
    #[error("captioning service unavailable")]
    Unavailable,
}


#[derive(Default)]
struct Stats {
    rendered: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

/// Rendering statistics, as reported by /stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub threads: usize,
    pub busy: usize,
    pub rendered: u64,
    pub failed: u64,
    pub timed_out: u64,
}
