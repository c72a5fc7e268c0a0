// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Background backlog upload.
//!
//! A worker is handed a snapshot of pending segment paths at spawn
//! time and drains them oldest first. Each segment becomes one
//! `{"batch":[...]}` request; a segment is deleted only after the
//! collector acknowledges it, and the first refusal ends the run so
//! chronological order is preserved across retries.

use crate::ledger::Ledger;
use crate::uplink::Uplink;
use std::path::PathBuf;

/// Outcome of one backlog drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Segments confirmed delivered and deleted.
    pub uploaded: usize,
    /// Segments left for a later run.
    pub remaining: usize,
}

/// Upload a snapshot of pending segments, oldest first.
///
/// Always terminates: every request is bounded by the uplink's
/// timeout and a failure stops the run rather than retrying in place.
pub async fn drain<U: Uplink + ?Sized>(uplink: &U, segments: &[PathBuf]) -> DrainStats {
    let total = segments.len();
    let mut uploaded = 0;

    for segment in segments {
        let contents = match std::fs::read_to_string(segment) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("failed to read {}: {}", segment.display(), e);
                break;
            }
        };

        let body = batch_payload(&contents);
        if !uplink.post(&body).await.is_accepted() {
            tracing::info!(
                "collector refused {}; {} segment(s) deferred",
                segment.display(),
                total - uploaded
            );
            break;
        }

        if let Err(e) = Ledger::delete(segment) {
            tracing::warn!("failed to delete {}: {}", segment.display(), e);
            break;
        }
        tracing::debug!("uploaded and deleted {}", segment.display());
        uploaded += 1;
    }

    DrainStats {
        uploaded,
        remaining: total - uploaded,
    }
}

/// Reframe newline-delimited records into a single batch payload,
/// preserving each record byte for byte.
fn batch_payload(contents: &str) -> String {
    let records: Vec<&str> = contents.lines().filter(|l| !l.is_empty()).collect();
    format!("{{\"batch\":[{}]}}", records.join(","))
}
