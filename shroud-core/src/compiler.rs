//! compiler.rs - Manages the compilation and caching of pattern rules.
//!
//! This module provides a thread-safe, cached mechanism to convert a
//! `PatternConfig` into `CompiledPatterns`, which are optimized for
//! efficient tokenization. It uses a global, shared cache to avoid
//! redundant compilation.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::RegexBuilder;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::config::{PatternConfig, PatternRule, MAX_PATTERN_LENGTH};
use crate::errors::ShroudError;

/// Represents a single compiled pattern rule.
///
/// This struct holds a compiled regular expression along with the category
/// label its matches are tokenized under, ready for efficient application.
#[derive(Debug)]
pub struct CompiledPattern {
    /// The compiled regular expression used for matching.
    pub regex: regex::Regex,
    /// Category label minted into tokens for this rule's matches.
    pub token_label: String,
    /// The unique name of the pattern rule.
    pub name: String,
}

/// Represents the ordered collection of compiled rules for one config.
///
/// Order matters: the tokenizer applies these as sequential passes.
#[derive(Debug)]
pub struct CompiledPatterns {
    /// Compiled patterns in pass order.
    pub patterns: Vec<CompiledPattern>,
}

lazy_static! {
    /// A thread-safe, global cache for compiled patterns.
    /// The key is a hash of the `PatternConfig`.
    static ref COMPILED_PATTERNS_CACHE: RwLock<HashMap<u64, Arc<CompiledPatterns>>> =
        RwLock::new(HashMap::new());
}

/// Hashes the `PatternConfig` to create a stable, unique key for the cache.
///
/// Rules are hashed in listed order: two configs with the same rules in a
/// different order compile to different pass sequences and must not share a
/// cache entry.
fn hash_config(config: &PatternConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.rules.hash(&mut hasher);
    hasher.finish()
}

/// Compiles a list of `PatternRule`s into `CompiledPatterns`.
/// This is the low-level function that performs the actual regex compilation.
pub fn compile_patterns(rules_to_compile: Vec<PatternRule>) -> Result<CompiledPatterns, ShroudError> {
    debug!("Starting compilation of {} pattern rules.", rules_to_compile.len());

    let mut compiled = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        if rule.enabled == Some(false) {
            debug!("Skipping disabled rule '{}'.", &rule.name);
            continue;
        }
        match rule.pattern.as_ref() {
            Some(pattern) => {
                debug!("Attempting to compile rule: '{}' with pattern '{:?}'", &rule.name, pattern);

                if pattern.len() > MAX_PATTERN_LENGTH {
                    compilation_errors.push(ShroudError::PatternLengthExceeded(
                        rule.name,
                        pattern.len(),
                        MAX_PATTERN_LENGTH,
                    ));
                    continue;
                }

                let regex_result = RegexBuilder::new(pattern)
                    .case_insensitive(rule.case_insensitive)
                    .multi_line(rule.multiline)
                    .dot_matches_new_line(rule.dot_matches_new_line)
                    .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
                    .build();

                match regex_result {
                    Ok(regex) => {
                        debug!("Rule '{}' compiled successfully.", &rule.name);
                        compiled.push(CompiledPattern {
                            regex,
                            token_label: rule.token_label,
                            name: rule.name,
                        });
                    }
                    Err(e) => {
                        compilation_errors.push(ShroudError::PatternCompilationError(rule.name, e));
                    }
                }
            }
            None => {
                warn!("Skipping rule '{}' because its pattern is missing.", &rule.name);
                continue;
            }
        }
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        Err(ShroudError::Fatal(format!(
            "Failed to compile {} rule(s):\n{}",
            compilation_errors.len(),
            error_message
        )))
    } else {
        debug!("Finished compiling rules. Total compiled: {}.", compiled.len());
        Ok(CompiledPatterns { patterns: compiled })
    }
}

/// Gets a `CompiledPatterns` instance from the cache or compiles them if not
/// found.
///
/// This is the public entry point for retrieving compiled patterns. It
/// returns an `Arc` to a `CompiledPatterns` instance, allowing for cheap
/// sharing.
pub fn get_or_compile_patterns(config: &PatternConfig) -> Result<Arc<CompiledPatterns>> {
    let cache_key = hash_config(config);

    {
        let cache = COMPILED_PATTERNS_CACHE.read().unwrap();
        if let Some(patterns) = cache.get(&cache_key) {
            debug!("Serving compiled patterns from cache for key: {}", &cache_key);
            return Ok(Arc::clone(patterns));
        }
    } // Read lock is released here.

    debug!("Compiled patterns not found in cache. Compiling now.");
    let compiled = compile_patterns(config.rules.clone())?;
    let compiled_arc = Arc::new(compiled);

    COMPILED_PATTERNS_CACHE
        .write()
        .unwrap()
        .insert(cache_key, Arc::clone(&compiled_arc));

    debug!("Successfully compiled and cached patterns for key: {}", &cache_key);
    Ok(compiled_arc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternConfig;

    #[test]
    fn compiles_default_rules_in_order() {
        let config = PatternConfig::load_default_rules().unwrap();
        let compiled = compile_patterns(config.rules).unwrap();
        let labels: Vec<&str> = compiled.patterns.iter().map(|p| p.token_label.as_str()).collect();
        assert_eq!(labels, vec!["MONEY", "DATE", "RATE", "DETAIL"]);
    }

    #[test]
    fn invalid_pattern_reports_rule_name() {
        let rule = PatternRule {
            name: "broken".to_string(),
            token_label: "MONEY".to_string(),
            pattern: Some("(".to_string()),
            ..Default::default()
        };
        let err = compile_patterns(vec![rule]).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn oversized_pattern_is_rejected() {
        let rule = PatternRule {
            name: "huge".to_string(),
            token_label: "MONEY".to_string(),
            pattern: Some("a".repeat(MAX_PATTERN_LENGTH + 1)),
            ..Default::default()
        };
        let err = compile_patterns(vec![rule]).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn disabled_rules_are_not_compiled() {
        let rule = PatternRule {
            name: "off".to_string(),
            token_label: "MONEY".to_string(),
            pattern: Some(r"\d+".to_string()),
            enabled: Some(false),
            ..Default::default()
        };
        let compiled = compile_patterns(vec![rule]).unwrap();
        assert!(compiled.patterns.is_empty());
    }
}
