//! polarity.rs - Polarity classification boundary and final vault assembly.
//!
//! After redaction, an external classifier may label MONEY/RATE tokens as
//! NEGATIVE (debt, penalty, loss) or POSITIVE (income, profit) without ever
//! seeing the original values. This module defines that boundary interface,
//! a tolerant parser for raw classifier responses, and the finalization step
//! that annotates negative entries in the vault.
//!
//! A missing, failing, or malformed classifier is never an error: it simply
//! means no polarity information, and the vault passes through unchanged.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::vault::{token_label, Vault};

/// Prefix applied to the original value of a NEGATIVE monetary/rate entry.
pub const NEGATION_MARKER: &str = "-";

/// Semantic sign of a monetary or rate value, supplied externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarity {
    Negative,
    Positive,
}

/// Mapping from token to polarity. Absence of a token means "no polarity
/// determined" for it.
pub type PolarityMap = HashMap<String, Polarity>;

/// A pluggable polarity classifier, called with the redacted text only.
///
/// Like the recognizer, this is a blocking, synchronous boundary call; retry
/// and timeout policy belong to the implementation. Implementations may
/// return an empty map on any internal failure.
pub trait Classifier: Send + Sync {
    fn classify(&self, redacted_text: &str) -> Result<PolarityMap>;
}

/// A classifier that never determines any polarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClassifier;

impl Classifier for NoopClassifier {
    fn classify(&self, _redacted_text: &str) -> Result<PolarityMap> {
        Ok(PolarityMap::new())
    }
}

/// Parses a raw classifier response (a JSON object mapping token strings to
/// `"NEGATIVE"`/`"POSITIVE"`) into a `PolarityMap`.
///
/// Anything malformed degrades to "no information": a non-JSON or non-object
/// response yields an empty map, and entries with unexpected values are
/// dropped individually.
pub fn parse_polarity_response(raw: &str) -> PolarityMap {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Classifier response is not valid JSON, treating as empty: {}", e);
            return PolarityMap::new();
        }
    };

    let object = match value.as_object() {
        Some(o) => o,
        None => {
            warn!("Classifier response is not a JSON object, treating as empty.");
            return PolarityMap::new();
        }
    };

    object
        .iter()
        .filter_map(|(token, v)| match v.as_str() {
            Some("NEGATIVE") => Some((token.clone(), Polarity::Negative)),
            Some("POSITIVE") => Some((token.clone(), Polarity::Positive)),
            _ => {
                debug!("Ignoring polarity entry '{}' with unexpected value {}.", token, v);
                None
            }
        })
        .collect()
}

/// True if polarity annotation applies to this token's category.
fn polarity_applies(token: &str) -> bool {
    matches!(token_label(token), Some("MONEY") | Some("RATE"))
}

/// Produces the final, externally visible vault.
///
/// Every entry passes through unchanged except MONEY/RATE tokens the
/// classifier marked NEGATIVE, whose value gains the negation marker. Pure
/// and total: an empty or irrelevant polarity map returns the vault as-is.
pub fn finalize_vault(vault: &Vault, polarity: &PolarityMap) -> Vault {
    vault
        .iter()
        .map(|(token, original)| {
            let value = if polarity.get(token) == Some(&Polarity::Negative)
                && polarity_applies(token)
            {
                format!("{}{}", NEGATION_MARKER, original)
            } else {
                original.to_string()
            };
            (token.to_string(), value)
        })
        .collect()
}
