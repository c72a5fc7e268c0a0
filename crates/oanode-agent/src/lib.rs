// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OANode Telemetry Agent
//!
//! Periodically produces a measurement, attempts to deliver it to the
//! collector over HTTP, and buffers it on local disk when delivery fails.
//! Buffered samples are retransmitted in batches by a background worker
//! once the uplink recovers, preserving production order and deleting
//! each segment only after the collector acknowledges it.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (fixed-period loop)
//! +-- SampleSource  (one measurement per tick)
//! +-- Uplink        (live POST attempt)
//! +-- Ledger        (on-disk segment buffer for failed deliveries)
//! +-- Dispatcher    (at most one upload worker outstanding)
//!     +-- upload worker  (batched retransmission, oldest first)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use oanode_agent::{ClockSampleSource, Config, HttpUplink, Scheduler};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = Config::new("acct1", "node1", Duration::from_secs(5));
//! let uplink = Arc::new(HttpUplink::new(
//!     config.collector_url(),
//!     config.request_timeout,
//!     config.strict_status,
//! )?);
//! let scheduler = Scheduler::new(config, ClockSampleSource::default(), uplink)?;
//! scheduler.run().await?;
//! ```

pub mod config;
pub mod dispatcher;
pub mod ledger;
pub mod sample;
pub mod scheduler;
pub mod uplink;
pub mod worker;

pub use config::{Config, ConfigError};
pub use dispatcher::Dispatcher;
pub use ledger::{Ledger, LedgerError};
pub use sample::{ClockSampleSource, Sample, SampleSource};
pub use scheduler::Scheduler;
pub use uplink::{Delivery, HttpUplink, MockUplink, Uplink};
pub use worker::{drain, DrainStats};
