// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backlog dispatch.
//!
//! Tracks the single outstanding upload worker. The handle slot is the
//! entire concurrency story: a worker is spawned only when the slot is
//! empty, and the slot is cleared only when the task has terminated or
//! overrun its deadline and been aborted. Termination clears the slot
//! regardless of payload success; the ledger's on-disk state is the
//! sole source of truth for what was delivered.

use crate::ledger::{Ledger, LedgerError};
use crate::uplink::Uplink;
use crate::worker::{self, DrainStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Dispatches at most one upload worker at a time.
pub struct Dispatcher<U: Uplink + 'static> {
    uplink: Arc<U>,
    deadline: Duration,
    worker: Option<WorkerHandle>,
}

/// The single outstanding worker, polled non-blockingly each tick.
struct WorkerHandle {
    task: JoinHandle<DrainStats>,
    started: Instant,
}

impl<U: Uplink + 'static> Dispatcher<U> {
    /// Create a dispatcher. `deadline` bounds a worker's lifetime;
    /// one still running past it is aborted so a hung request cannot
    /// starve backlog draining forever.
    pub fn new(uplink: Arc<U>, deadline: Duration) -> Self {
        Self {
            uplink,
            deadline,
            worker: None,
        }
    }

    /// Whether a worker is currently outstanding.
    pub fn worker_active(&self) -> bool {
        self.worker.is_some()
    }

    /// One dispatch decision, called once per scheduler tick after a
    /// successful live delivery.
    ///
    /// Reaps a finished worker, then, if the slot is free: seals the
    /// current segment so buffered samples become pending, snapshots
    /// the backlog, and spawns a worker over it. With nothing pending
    /// the segment numbering is reset to zero.
    pub async fn tick(&mut self, ledger: &mut Ledger) -> Result<(), LedgerError> {
        self.reap().await;

        if self.worker.is_some() {
            return Ok(());
        }

        ledger.seal();

        let pending = ledger.pending()?;
        if pending.is_empty() {
            ledger.reset_if_empty()?;
            return Ok(());
        }

        tracing::info!("spawning upload worker for {} pending segment(s)", pending.len());
        let uplink = Arc::clone(&self.uplink);
        let task = tokio::spawn(async move { worker::drain(uplink.as_ref(), &pending).await });
        self.worker = Some(WorkerHandle {
            task,
            started: Instant::now(),
        });

        Ok(())
    }

    /// Non-blocking reap of a finished or overdue worker.
    async fn reap(&mut self) {
        let (finished, overdue) = match &self.worker {
            Some(handle) => (
                handle.task.is_finished(),
                handle.started.elapsed() >= self.deadline,
            ),
            None => return,
        };

        if finished {
            if let Some(handle) = self.worker.take() {
                // Already finished, so this await resolves immediately.
                match handle.task.await {
                    Ok(stats) => tracing::info!(
                        "upload worker finished: {} uploaded, {} remaining",
                        stats.uploaded,
                        stats.remaining
                    ),
                    Err(e) => tracing::warn!("upload worker crashed: {}", e),
                }
            }
        } else if overdue {
            if let Some(handle) = self.worker.take() {
                tracing::warn!(
                    "upload worker exceeded {:?} deadline, aborting",
                    self.deadline
                );
                handle.task.abort();
            }
        }
    }
}
