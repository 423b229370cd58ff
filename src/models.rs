//! Core data models used throughout flyerdeck.
//!
//! These types represent the candidates, validated assets, and editions
//! that flow through the fetch, validation, and promotion pipeline, plus
//! the persisted document shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One acquisition result: a fetchable image location for a source.
///
/// `ordinal` is the 1-based position in acquisition order and defines
/// edition order. Completion order of concurrent fetches never does.
#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub source: String,
    pub ordinal: u32,
    pub url: String,
}

/// A candidate that survived the full validation filter chain.
///
/// The payload exists on disk at `local_path` (a staging name) until it
/// is promoted into the current namespace or discarded.
#[derive(Debug, Clone)]
pub struct ValidatedAsset {
    pub ordinal: u32,
    pub local_path: PathBuf,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
}

/// One ordered set of flyer-page images at a point in time.
///
/// The first element is page 1 of the flyer. Paths are relative and
/// `./`-prefixed, exactly as persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Edition {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Edition {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// The current and past editions for one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Flyers {
    #[serde(default)]
    pub current: Edition,
    #[serde(default)]
    pub past: Edition,
}

/// One source's persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRecord {
    pub name: String,
    #[serde(default)]
    pub flyers: Flyers,
}

impl SourceRecord {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            flyers: Flyers::default(),
        }
    }

    /// How many of the current edition's recorded paths are missing on
    /// disk. Non-zero means the record is degraded: archiving is
    /// suppressed until current is next refreshed.
    pub fn missing_current_files(&self, base: &Path) -> usize {
        self.flyers
            .current
            .images
            .iter()
            .filter(|recorded| !crate::naming::resolve_record_path(base, recorded).exists())
            .count()
    }
}

/// The persisted store: an ordered array of source records.
///
/// Loaded wholesale at run start, written wholesale at run end.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Document {
    pub records: Vec<SourceRecord>,
}

impl Document {
    pub fn record(&self, name: &str) -> Option<&SourceRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn record_mut(&mut self, name: &str) -> Option<&mut SourceRecord> {
        self.records.iter_mut().find(|r| r.name == name)
    }

    /// Fetch the record for `name`, appending an empty one if absent.
    pub fn record_or_insert(&mut self, name: &str) -> &mut SourceRecord {
        if let Some(pos) = self.records.iter().position(|r| r.name == name) {
            &mut self.records[pos]
        } else {
            self.records.push(SourceRecord::empty(name));
            self.records.last_mut().unwrap()
        }
    }
}

/// Change detector verdict for one source's candidate edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Unchanged,
    Changed,
}

/// Final per-source outcome reported in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// No update available or content identical; record untouched.
    Unchanged,
    /// A new edition was promoted to current.
    Updated { pages: usize },
    /// Acquisition, or the promotion rename step, failed.
    Failed { reason: String },
}
