//! Configuration management for `shroud-core`.
//!
//! This module defines the core data structures for pattern rules and rule
//! sets. It handles serialization/deserialization of YAML configurations and
//! provides utilities for loading, merging, and validating these configs.
//!
//! Unlike a generic find/replace ruleset, rule order is semantic here: passes
//! run in the order rules are listed, each over the output of the previous
//! pass, and counters are minted in that order.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Represents a single category pattern rule used by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternRule {
    /// Unique identifier for the rule (e.g., "money_amount").
    pub name: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// The regex pattern string.
    pub pattern: Option<String>,
    /// Category label minted into tokens, e.g. "MONEY" yields `[MONEY_1]`.
    pub token_label: String,
    /// If true, the pattern is compiled case-insensitively.
    pub case_insensitive: bool,
    /// If true, enables multiline mode for the regex engine.
    pub multiline: bool,
    /// If true, the dot character `.` in regex will match newlines.
    pub dot_matches_new_line: bool,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
    /// Security severity level (e.g., "high", "medium").
    pub severity: Option<String>,
    /// Metadata tags for categorization.
    pub tags: Option<Vec<String>>,
}

impl Default for PatternRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            pattern: None,
            token_label: "DETAIL".to_string(),
            case_insensitive: true,
            multiline: false,
            dot_matches_new_line: false,
            enabled: None,
            severity: None,
            tags: None,
        }
    }
}

/// Represents the top-level configuration structure for shroud.
///
/// `rules` is ordered: the tokenizer applies passes in listed order.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct PatternConfig {
    /// An ordered list of category pattern rules.
    pub rules: Vec<PatternRule>,
}

impl PatternConfig {
    /// Loads pattern rules from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom pattern rules from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: PatternConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_rules(&config.rules)?;
        info!("Loaded {} rules from file {}.", config.rules.len(), path.display());

        Ok(config)
    }

    /// Loads the default category rules from the embedded configuration.
    ///
    /// The embedded file lists MONEY, DATE, RATE and DETAIL in that order;
    /// DETAIL is last so the generic digit-group pattern cannot consume
    /// amounts, dates or rates.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default pattern rules from embedded string...");
        let default_yaml = include_str!("../config/default_patterns.yaml");
        let config: PatternConfig = serde_yml::from_str(default_yaml)
            .context("Failed to parse default pattern rules")?;

        debug!("Loaded {} default pattern rules.", config.rules.len());
        Ok(config)
    }
}

/// Merges user-defined rules with defaults, preserving pass order.
///
/// A user rule whose name matches a default rule replaces it in place (the
/// pass keeps its position in the ordering); user rules with new names are
/// appended and run after the defaults.
pub fn merge_rules(
    default_config: PatternConfig,
    user_config: Option<PatternConfig>,
) -> PatternConfig {
    debug!(
        "merge_rules called. Initial default rules count: {}",
        default_config.rules.len()
    );

    let mut final_rules = default_config.rules;

    if let Some(user_cfg) = user_config {
        debug!("User config provided. Merging {} user rules.", user_cfg.rules.len());
        for user_rule in user_cfg.rules {
            match final_rules.iter_mut().find(|r| r.name == user_rule.name) {
                Some(existing) => *existing = user_rule,
                None => final_rules.push(user_rule),
            }
        }
    }

    debug!("Final total rules after merge: {}", final_rules.len());

    PatternConfig { rules: final_rules }
}

/// Validates rule integrity (names, token labels, regex compilation).
pub fn validate_rules(rules: &[PatternRule]) -> Result<()> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();
    let label_regex = Regex::new(r"^[A-Z][A-Z0-9]*$").unwrap();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        if !label_regex.is_match(&rule.token_label) {
            errors.push(format!(
                "Rule '{}' has an invalid `token_label` '{}': must be uppercase alphanumeric.",
                rule.name, rule.token_label
            ));
        }

        let pattern = match &rule.pattern {
            Some(p) => p,
            None => {
                errors.push(format!("Rule '{}' is missing the `pattern` field.", rule.name));
                continue;
            }
        };

        if pattern.is_empty() {
            errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
        }

        if pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Rule '{}': pattern length ({}) exceeds maximum allowed ({}).",
                rule.name,
                pattern.len(),
                MAX_PATTERN_LENGTH
            ));
        }

        if let Err(e) = Regex::new(pattern) {
            errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
            continue;
        }

        // Tokens must never re-match in later passes; a pattern that can
        // match an opening bracket would corrupt earlier redactions.
        if pattern.contains(r"\[") {
            warn!(
                "Rule '{}' pattern mentions a literal '[': make sure it cannot match minted tokens.",
                rule.name
            );
        }
    }

    if !errors.is_empty() {
        let full_error_message = format!("Rule validation failed:\n{}", errors.join("\n"));
        Err(anyhow!(full_error_message))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, label: &str, pattern: &str) -> PatternRule {
        PatternRule {
            name: name.to_string(),
            token_label: label.to_string(),
            pattern: Some(pattern.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn default_rules_load_in_fixed_category_order() {
        let config = PatternConfig::load_default_rules().unwrap();
        let labels: Vec<&str> = config.rules.iter().map(|r| r.token_label.as_str()).collect();
        assert_eq!(labels, vec!["MONEY", "DATE", "RATE", "DETAIL"]);
    }

    #[test]
    fn merge_replaces_in_place_and_appends_new() {
        let defaults = PatternConfig {
            rules: vec![rule("a", "MONEY", "x"), rule("b", "DATE", "y")],
        };
        let user = PatternConfig {
            rules: vec![rule("a", "MONEY", "z"), rule("c", "RATE", "w")],
        };
        let merged = merge_rules(defaults, Some(user));
        let names: Vec<&str> = merged.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(merged.rules[0].pattern.as_deref(), Some("z"));
    }

    #[test]
    fn validate_rejects_lowercase_token_label() {
        let rules = vec![rule("bad", "money", r"\d+")];
        assert!(validate_rules(&rules).is_err());
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let rules = vec![rule("dup", "MONEY", r"\d+"), rule("dup", "DATE", r"\d+")];
        assert!(validate_rules(&rules).is_err());
    }
}
