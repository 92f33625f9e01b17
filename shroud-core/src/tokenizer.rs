//! tokenizer.rs - Ordered regex category passes over raw text.
//!
//! The `PatternTokenizer` applies each compiled rule as a full pass over the
//! cumulative output of the previous pass, replacing every match with a
//! freshly minted `[LABEL_N]` token and recording the original in the vault.
//!
//! Pass order is the config's listed order. The default ruleset runs MONEY,
//! DATE, RATE, then DETAIL: DETAIL's generic digit-group pattern only sees
//! digits the earlier passes did not consume, and none of the default
//! patterns can match inside an already-minted token (tokens carry at most a
//! short counter digit run and no currency/date/rate context), so re-running
//! the tokenizer on its own output yields no new matches.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::debug;
use regex::Captures;
use std::sync::Arc;

use crate::compiler::{get_or_compile_patterns, CompiledPatterns};
use crate::config::PatternConfig;
use crate::vault::{RedactionResult, VaultBuilder};

/// Applies ordered regex category passes, minting tokens into a vault.
#[derive(Debug)]
pub struct PatternTokenizer {
    compiled: Arc<CompiledPatterns>,
}

impl PatternTokenizer {
    /// Builds a tokenizer for the given config, compiling (or reusing cached)
    /// patterns.
    pub fn new(config: &PatternConfig) -> Result<Self> {
        let compiled = get_or_compile_patterns(config)
            .context("Failed to compile pattern rules for PatternTokenizer")?;
        Ok(Self { compiled })
    }

    /// Builds a tokenizer over the embedded default category rules.
    pub fn with_default_rules() -> Result<Self> {
        let config = PatternConfig::load_default_rules()?;
        Self::new(&config)
    }

    /// Runs all pattern passes over `text`, minting tokens into `builder`.
    ///
    /// Returns the redacted text; originals land in the builder's vault.
    /// Unmatched text is left verbatim, and there are no error conditions:
    /// every pass is a total function over its input.
    pub fn tokenize_into(&self, text: &str, builder: &mut VaultBuilder) -> String {
        let mut redacted = text.to_string();
        for pattern in &self.compiled.patterns {
            let before = builder.counter(&pattern.token_label);
            redacted = pattern
                .regex
                .replace_all(&redacted, |caps: &Captures| {
                    // caps[0] is the whole match; mint replaces it wholesale.
                    builder.mint(&pattern.token_label, &caps[0])
                })
                .into_owned();
            let minted = builder.counter(&pattern.token_label) - before;
            if minted > 0 {
                debug!("Pass '{}' minted {} {} token(s).", pattern.name, minted, pattern.token_label);
            }
        }
        redacted
    }

    /// One-shot tokenization with a fresh vault.
    pub fn tokenize(&self, text: &str) -> RedactionResult {
        let mut builder = VaultBuilder::new();
        let redacted_text = self.tokenize_into(text, &mut builder);
        RedactionResult {
            redacted_text,
            vault: builder.into_vault(),
        }
    }
}
