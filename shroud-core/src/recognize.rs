//! recognize.rs - The boundary interface to an external entity recognizer.
//!
//! The core never detects named entities itself; it consumes spans produced
//! by a recognizer (typically an NER model hosted elsewhere) run against the
//! exact text the core hands it. The trait keeps that boundary narrow and
//! lets tests substitute deterministic stubs.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A detected entity region: half-open **character** offsets `[start, end)`
/// into exactly the text passed to `detect`, plus the recognizer's category
/// label (e.g. `PERSON`, `ORGANIZATION`, or the short NER forms `PER`/`ORG`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self { start, end, label: label.into() }
    }
}

/// A pluggable named-entity recognizer.
///
/// The core treats this as a blocking, synchronous boundary call: it does not
/// schedule, retry, or parallelize it. Retry and timeout policy belong to the
/// implementation.
pub trait Recognizer: Send + Sync {
    /// Returns entity spans with character offsets into `text`.
    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// A recognizer that never finds anything. Useful when no NER backend is
/// available; pattern redaction still runs in full.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecognizer;

impl Recognizer for NoopRecognizer {
    fn detect(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        Ok(Vec::new())
    }
}
