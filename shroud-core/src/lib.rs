// shroud-core/src/lib.rs
//! # Shroud Core Library
//!
//! `shroud-core` provides the fundamental, platform-independent logic for
//! redacting personally identifiable and financial information from
//! free-form transcribed text. Each sensitive span is replaced with a
//! stable, typed placeholder token (`[MONEY_1]`, `[NAME_2]`, ...) while a
//! reversible "vault" retains the token-to-original mapping, so a downstream
//! process can reason about the text (or annotate token polarity) without
//! ever seeing the original values.
//!
//! The library is designed to be pure and stateless across runs: every
//! redaction call creates its own counters and vault, and the external
//! recognizer and classifier are consumed behind narrow trait interfaces.
//! Transcription, named-entity recognition, polarity classification and
//! vault persistence are collaborator concerns, not part of this crate.
//!
//! ## Modules
//!
//! * `config`: Defines `PatternRule`s and `PatternConfig` for the ordered category passes.
//! * `compiler`: Compiles rules into cached regex pattern sets.
//! * `vault`: The `Vault` mapping, per-run `VaultBuilder` counters, and token format.
//! * `tokenizer`: `PatternTokenizer`, the ordered regex passes over raw text.
//! * `merger`: `EntitySpanMerger`, positionally safe substitution of recognizer spans.
//! * `recognize`: The `Recognizer` boundary trait and `EntitySpan` type.
//! * `polarity`: The `Classifier` boundary trait, response parsing, and vault finalization.
//! * `redactor`: The assembled pipeline and one-shot helpers.
//!
//! ## Usage Example
//!
//! ```rust
//! use shroud_core::{redact_transcript_and_finalize, NoopClassifier, NoopRecognizer};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let input = "Pay 5,000 rupees by January 10 at 8.75% interest.";
//!
//!     // Without an NER backend or classifier, pattern redaction still runs in full.
//!     let result = redact_transcript_and_finalize(input, &NoopRecognizer, &NoopClassifier)?;
//!
//!     assert_eq!(
//!         result.redacted_text,
//!         "Pay [MONEY_1] by [DATE_1] at [RATE_1] interest."
//!     );
//!     assert_eq!(result.vault.get("[MONEY_1]"), Some("5,000 rupees"));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! The library uses `anyhow::Error` for fallible operations (rule loading
//! and compilation, collaborator calls) and defines the structured
//! [`ShroudError`] type for programmatic handling. Redaction itself is a
//! total function over well-formed inputs: malformed collaborator output
//! degrades to fewer redactions, never to a failed run.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod compiler;
pub mod config;
pub mod errors;
pub mod merger;
pub mod polarity;
pub mod recognize;
pub mod redactor;
pub mod tokenizer;
pub mod vault;

/// Re-exports the public configuration types and functions for managing pattern rules.
pub use config::{merge_rules, validate_rules, PatternConfig, PatternRule, MAX_PATTERN_LENGTH};

/// Re-exports the custom error type for clear error reporting.
pub use errors::ShroudError;

/// Re-exports the compiled pattern types for advanced usage.
pub use compiler::{compile_patterns, CompiledPattern, CompiledPatterns};

/// Re-exports the vault types and token helpers.
pub use vault::{format_token, redact_sensitive, token_label, RedactionResult, Vault, VaultBuilder};

/// Re-exports the pattern pass engine.
pub use tokenizer::PatternTokenizer;

/// Re-exports the entity-span merge engine and its token labels.
pub use merger::{EntitySpanMerger, ORG_TOKEN_LABEL, PERSON_TOKEN_LABEL};

/// Re-exports the recognizer boundary interface.
pub use recognize::{EntitySpan, NoopRecognizer, Recognizer};

/// Re-exports the polarity boundary interface and final vault assembly.
pub use polarity::{
    finalize_vault, parse_polarity_response, Classifier, NoopClassifier, Polarity, PolarityMap,
    NEGATION_MARKER,
};

/// Re-exports the assembled pipeline and one-shot helpers.
pub use redactor::{redact_transcript, redact_transcript_and_finalize, Redactor};
