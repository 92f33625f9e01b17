//! redactor.rs - The full redaction pipeline, and one-shot helpers.
//!
//! Wires the pattern passes, the recognizer boundary, the span merger and
//! the polarity finalization into the flow the library exists for:
//!
//! raw text -> pattern passes -> recognizer (on the pattern-redacted
//! snapshot) -> span merger -> redacted text + vault -> classifier (on the
//! redacted text) -> final vault.
//!
//! All state (counters, vault) is created fresh per call, so concurrent
//! redactions of different transcripts are independent.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::config::PatternConfig;
use crate::merger::EntitySpanMerger;
use crate::polarity::{finalize_vault, Classifier, PolarityMap};
use crate::recognize::Recognizer;
use crate::tokenizer::PatternTokenizer;
use crate::vault::{RedactionResult, VaultBuilder};

/// The redaction pipeline for one ruleset.
///
/// Reusable across calls and threads; every call runs with its own counters
/// and vault.
#[derive(Debug)]
pub struct Redactor {
    tokenizer: PatternTokenizer,
    merger: EntitySpanMerger,
}

impl Redactor {
    pub fn new(config: &PatternConfig) -> Result<Self> {
        Ok(Self {
            tokenizer: PatternTokenizer::new(config)?,
            merger: EntitySpanMerger::new(),
        })
    }

    pub fn with_default_rules() -> Result<Self> {
        let config = PatternConfig::load_default_rules()?;
        Self::new(&config)
    }

    /// Runs pattern passes, then merges the recognizer's entity spans.
    ///
    /// The recognizer is called exactly once, on the pattern-redacted
    /// snapshot; its offsets are only valid against that snapshot, which is
    /// why pattern passes complete before entity redaction begins. A hard
    /// recognizer failure propagates (the caller owns substitution/retry
    /// policy); individually malformed spans are dropped by the merger.
    pub fn redact(&self, text: &str, recognizer: &dyn Recognizer) -> Result<RedactionResult> {
        let mut builder = VaultBuilder::new();

        let pattern_redacted = self.tokenizer.tokenize_into(text, &mut builder);

        let entities = recognizer
            .detect(&pattern_redacted)
            .context("Entity recognizer failed")?;
        debug!("Recognizer returned {} entity span(s).", entities.len());

        let redacted_text = self.merger.merge_into(&pattern_redacted, &entities, &mut builder);

        Ok(RedactionResult {
            redacted_text,
            vault: builder.into_vault(),
        })
    }

    /// Full run including polarity finalization.
    ///
    /// A failing classifier is tolerated as "no polarity known": redaction
    /// output is still valid and complete, only the annotation is skipped.
    pub fn redact_and_finalize(
        &self,
        text: &str,
        recognizer: &dyn Recognizer,
        classifier: &dyn Classifier,
    ) -> Result<RedactionResult> {
        let result = self.redact(text, recognizer)?;

        let polarity = match classifier.classify(&result.redacted_text) {
            Ok(map) => map,
            Err(e) => {
                warn!("Classifier unavailable, skipping polarity annotation: {:#}", e);
                PolarityMap::new()
            }
        };

        let vault = finalize_vault(&result.vault, &polarity);
        Ok(RedactionResult {
            redacted_text: result.redacted_text,
            vault,
        })
    }
}

/// One-shot redaction of a transcript with the embedded default ruleset.
pub fn redact_transcript(text: &str, recognizer: &dyn Recognizer) -> Result<RedactionResult> {
    Redactor::with_default_rules()?.redact(text, recognizer)
}

/// One-shot redaction plus polarity finalization with the default ruleset.
pub fn redact_transcript_and_finalize(
    text: &str,
    recognizer: &dyn Recognizer,
    classifier: &dyn Classifier,
) -> Result<RedactionResult> {
    Redactor::with_default_rules()?.redact_and_finalize(text, recognizer, classifier)
}
