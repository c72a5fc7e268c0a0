// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The sampling loop.
//!
//! Each tick produces one sample and attempts live delivery. Failures
//! are appended to the ledger; successes give the dispatcher a chance
//! to drain the backlog. The next wake time advances from the previous
//! deadline against the monotonic clock, so in-loop work does not
//! accumulate drift; an overrun tick proceeds immediately without
//! bursting to catch up.

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::ledger::{Ledger, LedgerError};
use crate::sample::SampleSource;
use crate::uplink::Uplink;
use anyhow::Result;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};

/// Fixed-period sampling loop.
pub struct Scheduler<U: Uplink + 'static, S: SampleSource> {
    config: Config,
    source: S,
    uplink: Arc<U>,
    ledger: Ledger,
    dispatcher: Dispatcher<U>,
}

impl<U: Uplink + 'static, S: SampleSource> Scheduler<U, S> {
    /// Create a scheduler, opening the ledger directory.
    pub fn new(config: Config, source: S, uplink: Arc<U>) -> Result<Self, LedgerError> {
        let ledger = Ledger::open(&config.data_dir, config.rotate_threshold_bytes)?;
        let dispatcher = Dispatcher::new(Arc::clone(&uplink), config.worker_deadline);

        Ok(Self {
            config,
            source,
            uplink,
            ledger,
            dispatcher,
        })
    }

    /// Run until cancelled.
    ///
    /// Tick errors are logged and the loop continues: after startup,
    /// only configuration problems are fatal.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(
            "sampling every {:?}, buffering to {}",
            self.config.polling_period,
            self.config.data_dir.display()
        );

        let mut next_wake = Instant::now();
        loop {
            if let Err(e) = self.tick().await {
                tracing::error!("tick failed: {}", e);
            }

            next_wake += self.config.polling_period;
            let now = Instant::now();
            if next_wake < now {
                next_wake = now;
            }
            sleep_until(next_wake).await;
        }
    }

    /// One sampling iteration.
    pub async fn tick(&mut self) -> Result<()> {
        let sample = self.source.produce();
        let payload = sample.to_json()?;

        if self.uplink.post(&payload).await.is_accepted() {
            tracing::debug!("live delivery ok");
            self.dispatcher.tick(&mut self.ledger).await?;
        } else {
            tracing::debug!("live delivery failed, buffering sample");
            self.ledger.append(&payload)?;
        }

        Ok(())
    }

    /// The ledger backing this scheduler.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether an upload worker is currently outstanding.
    pub fn worker_active(&self) -> bool {
        self.dispatcher.worker_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::uplink::MockUplink;
    use std::time::Duration;
    use tempfile::tempdir;

    struct CountingSource {
        next: u64,
    }

    impl SampleSource for CountingSource {
        fn produce(&mut self) -> Sample {
            let n = self.next;
            self.next += 1;
            Sample::new(&[n.to_string()])
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::new("acct1", "node1", Duration::from_secs(5));
        config.data_dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_failed_tick_buffers_live_payload_verbatim() {
        let dir = tempdir().expect("tempdir");
        let uplink = Arc::new(MockUplink::failing());
        let mut scheduler = Scheduler::new(
            test_config(dir.path()),
            CountingSource { next: 0 },
            Arc::clone(&uplink),
        )
        .expect("scheduler");

        scheduler.tick().await.expect("tick");

        // The buffered record is byte-identical to the live attempt.
        let live = &uplink.requests()[0];
        let buffered = std::fs::read_to_string(dir.path().join("LOG_00000.dat")).expect("read");
        assert_eq!(buffered, format!("{}\n", live));
    }

    #[tokio::test]
    async fn test_successful_tick_leaves_ledger_untouched() {
        let dir = tempdir().expect("tempdir");
        let uplink = Arc::new(MockUplink::accepting());
        let mut scheduler = Scheduler::new(
            test_config(dir.path()),
            CountingSource { next: 0 },
            Arc::clone(&uplink),
        )
        .expect("scheduler");

        scheduler.tick().await.expect("tick");

        assert!(!dir.path().join("LOG_00000.dat").exists());
        assert!(!scheduler.worker_active());
        assert_eq!(uplink.request_count(), 1);
    }
}
