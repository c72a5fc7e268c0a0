// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! On-disk segment ledger for undelivered samples.
//!
//! Samples that fail live delivery are appended as newline-delimited
//! JSON records to sequentially numbered segment files
//! (`LOG_00000.dat`, `LOG_00001.dat`, ...). Exactly one segment (the
//! highest-numbered) is writable at a time; all lower-numbered
//! segments are immutable and pending upload.
//!
//! # Concurrency partition
//!
//! The scheduler is the sole writer and touches only the current
//! segment; the upload worker is the sole reader/deleter and touches
//! only segments that were already pending when it was spawned. That
//! partition is the entire locking story.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEGMENT_PREFIX: &str = "LOG_";
const SEGMENT_SUFFIX: &str = ".dat";

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only segment store.
pub struct Ledger {
    dir: PathBuf,
    threshold: u64,
    current: u32,
}

impl Ledger {
    /// Open a ledger, creating `dir` if needed.
    ///
    /// Numbering resumes at the highest segment already on disk, or
    /// one past it when that segment has already outgrown the
    /// threshold, so a restart never reopens a full segment for
    /// writing.
    pub fn open(dir: impl Into<PathBuf>, threshold: u64) -> Result<Self, LedgerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let current = match scan_segments(&dir)?.last() {
            Some((seq, path)) => {
                if fs::metadata(path)?.len() > threshold {
                    seq + 1
                } else {
                    *seq
                }
            }
            None => 0,
        };

        Ok(Self {
            dir,
            threshold,
            current,
        })
    }

    /// Append one serialized record plus a newline to the current
    /// segment, creating it if absent. Rotates afterwards if the
    /// segment has grown past the threshold (a segment at exactly the
    /// threshold stays current).
    pub fn append(&mut self, record: &str) -> Result<(), LedgerError> {
        let path = self.current_path();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        file.write_all(record.as_bytes())?;
        file.write_all(b"\n")?;
        let size = file.metadata()?.len();
        drop(file);

        if size > self.threshold {
            self.rotate();
        }
        Ok(())
    }

    /// Advance to the next segment; the old one becomes pending.
    pub fn rotate(&mut self) {
        self.current += 1;
        tracing::debug!("rotated ledger to segment {:05}", self.current);
    }

    /// Seal the current segment ahead of a flush: if it holds any
    /// data, rotate so it becomes pending. Returns whether a rotation
    /// happened.
    pub fn seal(&mut self) -> bool {
        if self.current_path().exists() {
            self.rotate();
            true
        } else {
            false
        }
    }

    /// Pending (rotated-out) segment paths, oldest first by sequence
    /// number. Never includes the current segment.
    pub fn pending(&self) -> Result<Vec<PathBuf>, LedgerError> {
        Ok(scan_segments(&self.dir)?
            .into_iter()
            .filter(|(seq, _)| *seq != self.current)
            .map(|(_, path)| path)
            .collect())
    }

    /// Remove a delivered segment. Called by the upload worker only
    /// after the collector acknowledged the segment's full contents.
    pub fn delete(path: &Path) -> Result<(), LedgerError> {
        fs::remove_file(path)?;
        Ok(())
    }

    /// Reset numbering to zero once no segments remain on disk.
    pub fn reset_if_empty(&mut self) -> Result<(), LedgerError> {
        if scan_segments(&self.dir)?.is_empty() {
            self.current = 0;
        }
        Ok(())
    }

    /// Path of the currently writable segment (which may not exist yet).
    pub fn current_path(&self) -> PathBuf {
        self.segment_path(self.current)
    }

    /// Sequence number of the current segment.
    pub fn current_seq(&self) -> u32 {
        self.current
    }

    /// The ledger directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn segment_path(&self, seq: u32) -> PathBuf {
        self.dir
            .join(format!("{}{:05}{}", SEGMENT_PREFIX, seq, SEGMENT_SUFFIX))
    }
}

/// Segment files in `dir`, sorted by sequence number.
fn scan_segments(dir: &Path) -> Result<Vec<(u32, PathBuf)>, LedgerError> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if let Some(seq) = parse_segment_name(name) {
                segments.push((seq, entry.path()));
            }
        }
    }
    segments.sort_by_key(|(seq, _)| *seq);
    Ok(segments)
}

fn parse_segment_name(name: &str) -> Option<u32> {
    name.strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?
        .parse()
        .ok()
}
