//! merger.rs - Merges recognizer entity spans into pattern-redacted text.
//!
//! The recognizer runs against one snapshot of the pattern-redacted text and
//! reports character offsets into that snapshot. The merger applies the
//! resulting substitutions strictly right-to-left (descending start offset):
//! each splice only shifts text to its right, so the snapshot offsets of
//! spans still to the left remain valid. Spans that land on an existing
//! token, fall out of bounds, or carry an irrelevant label are dropped, never
//! errors.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::recognize::EntitySpan;
use crate::vault::{loggable_content, RedactionResult, VaultBuilder};

lazy_static! {
    /// Matches a complete minted token wherever it sits in the text.
    static ref TOKEN_REGEX: Regex = Regex::new(r"\[[A-Z][A-Z0-9]*_\d+\]").unwrap();
}

/// Token label minted for person entities.
pub const PERSON_TOKEN_LABEL: &str = "NAME";
/// Token label minted for organization entities.
pub const ORG_TOKEN_LABEL: &str = "ORG";

/// Applies recognizer entity spans as token substitutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySpanMerger;

impl EntitySpanMerger {
    pub fn new() -> Self {
        Self
    }

    /// Substitutes the relevant entity spans in `redacted_text`, minting
    /// NAME/ORG tokens into `builder`.
    ///
    /// `entities` must have been produced by a recognizer run against
    /// `redacted_text` itself; their offsets are character offsets into that
    /// snapshot.
    pub fn merge_into(
        &self,
        redacted_text: &str,
        entities: &[EntitySpan],
        builder: &mut VaultBuilder,
    ) -> String {
        let mut relevant: Vec<(&EntitySpan, &'static str)> = entities
            .iter()
            .filter_map(|e| match token_label_for(&e.label) {
                Some(label) => Some((e, label)),
                None => {
                    debug!("Ignoring entity span with label '{}'.", e.label);
                    None
                }
            })
            .collect();

        // Right-to-left application keeps remaining snapshot offsets valid.
        relevant.sort_by(|a, b| b.0.start.cmp(&a.0.start));

        let mut text = redacted_text.to_string();
        for (entity, label) in relevant {
            let range = match char_span_to_byte_range(&text, entity.start, entity.end) {
                Some(range) => range,
                None => {
                    warn!(
                        "Dropping malformed entity span {}..{} ('{}'): out of bounds or inverted.",
                        entity.start, entity.end, entity.label
                    );
                    continue;
                }
            };

            let original = text[range.clone()].to_string();
            if original.contains('[') || original.contains(']') || overlaps_token(&text, &range) {
                // Touches a token minted earlier in this run, whether it
                // covers the whole token, one of its brackets, or sits
                // strictly inside it; it must not be overwritten or nested.
                debug!(
                    "Skipping entity span {}..{}: overlaps an existing token ('{}').",
                    entity.start,
                    entity.end,
                    loggable_content(&original)
                );
                continue;
            }

            let token = builder.mint(label, &original);
            text.replace_range(range, &token);
        }
        text
    }

    /// One-shot merge with a fresh vault (for use outside the full pipeline).
    pub fn merge(&self, redacted_text: &str, entities: &[EntitySpan]) -> RedactionResult {
        let mut builder = VaultBuilder::new();
        let redacted_text = self.merge_into(redacted_text, entities, &mut builder);
        RedactionResult {
            redacted_text,
            vault: builder.into_vault(),
        }
    }
}

/// Maps a recognizer category label to the token label it mints, or `None`
/// for categories the merger ignores.
fn token_label_for(entity_label: &str) -> Option<&'static str> {
    match entity_label.to_ascii_uppercase().as_str() {
        "PER" | "PERSON" => Some(PERSON_TOKEN_LABEL),
        "ORG" | "ORGANIZATION" => Some(ORG_TOKEN_LABEL),
        _ => None,
    }
}

/// True if the byte range intersects any minted token in `text`.
///
/// Catches spans lying strictly inside a token, where the extracted
/// substring carries neither bracket.
fn overlaps_token(text: &str, range: &std::ops::Range<usize>) -> bool {
    TOKEN_REGEX
        .find_iter(text)
        .any(|m| m.start() < range.end && range.start < m.end())
}

/// Converts a half-open character-offset span into a byte range of `text`.
///
/// Returns `None` for inverted or out-of-bounds spans.
fn char_span_to_byte_range(text: &str, start: usize, end: usize) -> Option<std::ops::Range<usize>> {
    if start >= end {
        return None;
    }
    let byte_start = char_to_byte(text, start)?;
    let byte_end = char_to_byte(text, end)?;
    Some(byte_start..byte_end)
}

fn char_to_byte(text: &str, char_offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::EntitySpan;

    #[test]
    fn char_to_byte_handles_multibyte_text() {
        let text = "₹5 to Ravi";
        // '₹' is 3 bytes; char offset 6 is the 'R' of "Ravi".
        assert_eq!(char_to_byte(text, 0), Some(0));
        assert_eq!(char_to_byte(text, 1), Some(3));
        assert_eq!(char_to_byte(text, 6), Some(8));
        assert_eq!(char_to_byte(text, 10), Some(text.len()));
        assert_eq!(char_to_byte(text, 11), None);
    }

    #[test]
    fn descending_order_keeps_earlier_offsets_valid() {
        let text = "Alice paid Bob Industries";
        let entities = vec![
            EntitySpan::new(0, 5, "PER"),
            EntitySpan::new(11, 25, "ORG"),
        ];
        let merger = EntitySpanMerger::new();
        let result = merger.merge(text, &entities);
        assert_eq!(result.redacted_text, "[NAME_1] paid [ORG_1]");
        assert_eq!(result.vault.get("[NAME_1]"), Some("Alice"));
        assert_eq!(result.vault.get("[ORG_1]"), Some("Bob Industries"));
    }

    #[test]
    fn span_overlapping_existing_token_is_skipped() {
        let text = "Pay [MONEY_1] to Ravi";
        let entities = vec![
            // Degenerate recognizer output covering the token itself.
            EntitySpan::new(4, 13, "PERSON"),
            EntitySpan::new(17, 21, "PERSON"),
        ];
        let merger = EntitySpanMerger::new();
        let result = merger.merge(text, &entities);
        assert_eq!(result.redacted_text, "Pay [MONEY_1] to [NAME_1]");
        assert_eq!(result.vault.get("[NAME_1]"), Some("Ravi"));
        assert_eq!(result.vault.len(), 1);
    }

    #[test]
    fn span_covering_a_token_tail_is_skipped() {
        let text = "Pay [MONEY_1] to Ravi";
        // Starts inside the token and runs past its closing bracket.
        let entities = vec![EntitySpan::new(6, 16, "PERSON")];
        let merger = EntitySpanMerger::new();
        let result = merger.merge(text, &entities);
        assert_eq!(result.redacted_text, "Pay [MONEY_1] to Ravi");
        assert!(result.vault.is_empty());
    }

    #[test]
    fn span_strictly_inside_a_token_is_skipped() {
        let text = "Pay [MONEY_1] to Ravi";
        // Covers "MONEY_1" only: the substring carries neither bracket.
        let entities = vec![
            EntitySpan::new(5, 12, "PERSON"),
            EntitySpan::new(17, 21, "PERSON"),
        ];
        let merger = EntitySpanMerger::new();
        let result = merger.merge(text, &entities);
        assert_eq!(result.redacted_text, "Pay [MONEY_1] to [NAME_1]");
        assert_eq!(result.vault.get("[NAME_1]"), Some("Ravi"));
        assert_eq!(result.vault.len(), 1);
    }

    #[test]
    fn irrelevant_and_malformed_spans_are_dropped() {
        let text = "Meet Ravi in Paris";
        let entities = vec![
            EntitySpan::new(13, 18, "LOC"),
            EntitySpan::new(40, 50, "PER"),
            EntitySpan::new(9, 5, "PER"),
            EntitySpan::new(5, 9, "PER"),
        ];
        let merger = EntitySpanMerger::new();
        let result = merger.merge(text, &entities);
        assert_eq!(result.redacted_text, "Meet [NAME_1] in Paris");
        assert_eq!(result.vault.len(), 1);
    }
}
