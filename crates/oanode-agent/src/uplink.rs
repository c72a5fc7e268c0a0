// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP uplink to the collector.
//!
//! A delivery attempt never returns an error: transport failures
//! (refused connection, DNS, timeout) collapse into [`Delivery::Failed`]
//! so the caller's only decision is buffer-or-dispatch.
//!
//! # Success signal
//!
//! The collector acknowledges a payload with a non-empty response body.
//! Any non-empty body counts as success, even one encoding a
//! server-side error; this is the collector's historical contract and
//! is preserved by default. Setting `strict_status` additionally
//! requires a 2xx status.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The collector returned a non-empty body (the ack signal).
    Accepted(String),
    /// Transport failure, empty body, or (in strict mode) error status.
    Failed,
}

impl Delivery {
    /// Whether this outcome counts as a confirmed delivery.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Delivery::Accepted(_))
    }
}

/// Transport seam between the agent and the collector.
#[async_trait]
pub trait Uplink: Send + Sync {
    /// POST one JSON payload to the collector.
    async fn post(&self, body: &str) -> Delivery;
}

/// reqwest-backed uplink.
///
/// Every request carries `Content-Type: application/json` and an exact
/// `Content-Length`, and is bounded by the configured timeout so
/// neither the live path nor the upload worker can stall indefinitely.
pub struct HttpUplink {
    client: reqwest::Client,
    url: String,
    strict_status: bool,
}

impl HttpUplink {
    /// Build an uplink for the given collector URL.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        strict_status: bool,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            strict_status,
        })
    }

    /// The collector URL this uplink posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Uplink for HttpUplink {
    async fn post(&self, body: &str) -> Delivery {
        let response = match self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("uplink POST failed: {}", e);
                return Delivery::Failed;
            }
        };

        let status = response.status();
        if self.strict_status && !status.is_success() {
            tracing::debug!("collector returned {}", status);
            return Delivery::Failed;
        }

        match response.text().await {
            Ok(text) if !text.is_empty() => Delivery::Accepted(text),
            Ok(_) => {
                tracing::debug!("collector returned empty body");
                Delivery::Failed
            }
            Err(e) => {
                tracing::debug!("uplink read failed: {}", e);
                Delivery::Failed
            }
        }
    }
}

// ============================================================================
// Mock uplink (for tests and dry runs)
// ============================================================================

/// Scripted uplink with no network.
///
/// Outcomes are popped from the script in order; once the script is
/// exhausted every attempt returns the default outcome. Request bodies
/// are recorded for inspection.
pub struct MockUplink {
    default: Delivery,
    script: Mutex<VecDeque<Delivery>>,
    requests: Mutex<Vec<String>>,
}

impl MockUplink {
    /// Create a mock returning `default` once its script is exhausted.
    pub fn new(default: Delivery) -> Self {
        Self {
            default,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock that acknowledges every request.
    pub fn accepting() -> Self {
        Self::new(Delivery::Accepted("ok".to_string()))
    }

    /// Mock that fails every request.
    pub fn failing() -> Self {
        Self::new(Delivery::Failed)
    }

    /// Queue one scripted outcome.
    pub fn enqueue(&self, outcome: Delivery) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Bodies of all requests made so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Uplink for MockUplink {
    async fn post(&self, body: &str) -> Delivery {
        self.requests.lock().unwrap().push(body.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}
