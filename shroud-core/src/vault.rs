//! Provides the vault data structures and token-minting state for a single
//! redaction run, along with PII-safe debug logging helpers.
//!
//! A `Vault` is the reversible token-to-original mapping handed to the
//! (external) persistence layer. A `VaultBuilder` is the per-run mutable
//! state behind it: the per-label counters and the accumulating entries.
//! Builders are created fresh per input text and never shared across runs,
//! so concurrent redactions of different documents cannot interfere.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("SHROUD_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Formats a placeholder token: `[` + label + `_` + counter + `]`.
///
/// This textual shape is a compatibility contract with downstream consumers
/// and must not change.
pub fn format_token(label: &str, counter: u32) -> String {
    format!("[{}_{}]", label, counter)
}

/// Parses the category label back out of a token string.
///
/// Returns `None` if the string is not of the form `[LABEL_N]` with an
/// uppercase label and a decimal counter.
pub fn token_label(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('[')?.strip_suffix(']')?;
    let (label, counter) = inner.rsplit_once('_')?;
    if label.is_empty()
        || !label.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        || !label.starts_with(|c: char| c.is_ascii_uppercase())
    {
        return None;
    }
    if counter.is_empty() || !counter.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(label)
}

/// Renders sensitive content for logs without leaking it.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

pub(crate) fn loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

/// The reversible mapping from token to original sensitive value.
///
/// Keys are unique within a run (token minting guarantees this); iteration
/// order carries no semantic meaning downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vault {
    entries: HashMap<String, String>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the original value for a token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, token: String, original: String) {
        self.entries.insert(token, original);
    }
}

impl FromIterator<(String, String)> for Vault {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Per-run token-minting state: per-label counters plus the accumulating
/// vault.
///
/// Counters are 1-based, scoped to a label, and never reset or reuse a
/// number within a run. A token is minted only when its replacement is
/// actually applied, so the numbers assigned per label are contiguous in
/// detection order.
#[derive(Debug, Default)]
pub struct VaultBuilder {
    counters: BTreeMap<String, u32>,
    vault: Vault,
}

impl VaultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next token for `label`, records `original` under it, and
    /// returns the token.
    pub fn mint(&mut self, label: &str, original: &str) -> String {
        let counter = self.counters.entry(label.to_string()).or_insert(0);
        *counter += 1;
        let token = format_token(label, *counter);
        debug!(
            "Minted token '{}' for original '{}'",
            token,
            loggable_content(original)
        );
        self.vault.insert(token.clone(), original.to_string());
        token
    }

    /// Current counter value for a label (0 if the label never minted).
    pub fn counter(&self, label: &str) -> u32 {
        self.counters.get(label).copied().unwrap_or(0)
    }

    /// Consumes the builder, yielding the completed vault.
    pub fn into_vault(self) -> Vault {
        self.vault
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }
}

/// The pair returned by a redaction pass or a full run: the text with all
/// sensitive spans replaced by tokens, and the vault mapping tokens back to
/// the originals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    pub redacted_text: String,
    pub vault: Vault,
}
