// shroud-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use shroud_core::config::{merge_rules, PatternConfig, PatternRule};

#[test]
fn test_load_default_rules() {
    let config = PatternConfig::load_default_rules().unwrap();
    assert!(!config.rules.is_empty());
    assert!(config.rules.iter().any(|r| r.name == "money_amount"));
    // DETAIL must be the final pass so it cannot swallow earlier categories.
    assert_eq!(config.rules.last().unwrap().token_label, "DETAIL");
}

#[test]
fn test_load_from_file() -> Result<()> {
    let yaml_content = r#"
rules:
  - name: ticket_number
    token_label: DETAIL
    pattern: "TKT-\\d{6}"
    description: "Internal support ticket references"
    case_insensitive: false
    severity: "low"
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let config = PatternConfig::load_from_file(file.path())?;
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].name, "ticket_number");
    assert_eq!(config.rules[0].token_label, "DETAIL");
    assert!(!config.rules[0].case_insensitive);
    assert_eq!(config.rules[0].pattern, Some("TKT-\\d{6}".to_string()));
    Ok(())
}

#[test]
fn test_load_from_file_defaults_case_insensitive() -> Result<()> {
    let yaml_content = r#"
rules:
  - name: another_rule
    token_label: MONEY
    pattern: "pay"
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let config = PatternConfig::load_from_file(file.path())?;
    assert_eq!(config.rules.len(), 1);
    // case_insensitive is omitted, so it should default to true.
    assert!(config.rules[0].case_insensitive);
    Ok(())
}

#[test]
fn test_load_from_file_rejects_invalid_rules() -> Result<()> {
    let yaml_content = r#"
rules:
  - name: broken
    token_label: money
    pattern: "("
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let err = PatternConfig::load_from_file(file.path()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("token_label"), "unexpected error: {message}");
    assert!(message.contains("invalid regex"), "unexpected error: {message}");
    Ok(())
}

#[test]
fn test_merge_rules_preserves_pass_order() {
    let defaults = PatternConfig::load_default_rules().unwrap();
    let user = PatternConfig {
        rules: vec![
            PatternRule {
                name: "money_amount".to_string(),
                token_label: "MONEY".to_string(),
                pattern: Some(r"\$\d+".to_string()),
                ..Default::default()
            },
            PatternRule {
                name: "badge_id".to_string(),
                token_label: "DETAIL".to_string(),
                pattern: Some(r"B-\d{4}".to_string()),
                case_insensitive: false,
                ..Default::default()
            },
        ],
    };

    let merged = merge_rules(defaults, Some(user));

    // The overridden money rule keeps its original position at the front.
    assert_eq!(merged.rules[0].name, "money_amount");
    assert_eq!(merged.rules[0].pattern.as_deref(), Some(r"\$\d+"));
    // New user rules are appended after the defaults.
    assert_eq!(merged.rules.last().unwrap().name, "badge_id");
    assert_eq!(merged.rules.len(), 5);
}

#[test]
fn test_merge_rules_no_user_config() {
    let defaults = PatternConfig::load_default_rules().unwrap();
    let expected = defaults.clone();
    let merged = merge_rules(defaults, None);
    assert_eq!(merged, expected);
}

#[test]
fn test_custom_ruleset_drives_the_tokenizer() -> Result<()> {
    use shroud_core::PatternTokenizer;

    let config = PatternConfig {
        rules: vec![PatternRule {
            name: "ticket_number".to_string(),
            token_label: "DETAIL".to_string(),
            pattern: Some(r"TKT-\d{6}".to_string()),
            case_insensitive: false,
            ..Default::default()
        }],
    };
    let tokenizer = PatternTokenizer::new(&config)?;
    let result = tokenizer.tokenize("Escalate TKT-123456 to tier two.");
    assert_eq!(result.redacted_text, "Escalate [DETAIL_1] to tier two.");
    assert_eq!(result.vault.get("[DETAIL_1]"), Some("TKT-123456"));
    Ok(())
}
