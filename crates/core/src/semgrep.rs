//! Transformation of Codacy patterns into a Semgrep rule configuration

use crate::codacy::Pattern;
use crate::yaml::{BlockEmitter, EmitError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Comment block written above the generated rules.
pub const CONFIG_HEADER: &str = "\
# This file contains Semgrep rules generated from Codacy configuration
# See https://semgrep.dev for more information about Semgrep
#
# You can use this file locally with:
#  - semgrep --config semgrep_config.yaml .
#
# For more information about rule syntax, visit:
# https://semgrep.dev/docs/writing-rules/rule-syntax/

";

const DEFAULT_SEVERITY: &str = "WARNING";
const PLACEHOLDER_PATTERN: &str = "{}";
const UNKNOWN_RULE_ID: &str = "unknown-rule";

/// Column after which long scalars are folded
pub const LINE_WIDTH: i32 = 80;

// =============================================================================
// Output Domain Types
// =============================================================================

/// A single Semgrep rule. Field order is the key order of the YAML output.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub severity: String,
    pub pattern: String,
}

/// Top-level Semgrep configuration document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SemgrepConfig {
    pub rules: Vec<Rule>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to serialize Semgrep config: {0}")]
    Yaml(#[from] EmitError),
}

// =============================================================================
// Transformations
// =============================================================================

/// Simplify a Codacy pattern id into a readable Semgrep rule id
///
/// Keeps only the part after the last `.`, then drops repeated `-` segments,
/// keeping the first occurrence of each. Empty ids become `unknown-rule`.
///
/// `"eslint.no-unused-vars-no-unused-vars"` becomes `"no-unused-vars"`.
pub fn format_rule_id(pattern_id: &str) -> String {
    let last = pattern_id.rsplit('.').next().unwrap_or_default();

    let simplified = if last.contains('-') {
        let mut unique: Vec<&str> = Vec::new();
        for part in last.split('-') {
            if !unique.contains(&part) {
                unique.push(part);
            }
        }
        unique.join("-")
    } else {
        last.to_string()
    };

    if simplified.is_empty() {
        UNKNOWN_RULE_ID.to_string()
    } else {
        simplified
    }
}

/// Convert one pattern into a rule, if it targets any selected language
pub fn pattern_to_rule(pattern: &Pattern, selected_languages: &BTreeSet<String>) -> Option<Rule> {
    let definition = &pattern.pattern_definition;
    let languages: Vec<String> = definition
        .normalized_languages()
        .intersection(selected_languages)
        .cloned()
        .collect();

    if languages.is_empty() {
        return None;
    }

    let severity = pattern
        .severity
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SEVERITY)
        .to_uppercase();

    Some(Rule {
        id: format_rule_id(&definition.id),
        languages,
        message: definition
            .description
            .clone()
            .filter(|message| !message.is_empty()),
        severity,
        pattern: definition
            .pattern
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_PATTERN.to_string()),
    })
}

/// Build the Semgrep configuration for the selected (lower-cased) languages
///
/// Patterns that share no language with the selection are skipped. Rule ids are
/// not deduplicated.
pub fn build_config(patterns: &[Pattern], selected_languages: &BTreeSet<String>) -> SemgrepConfig {
    SemgrepConfig {
        rules: patterns
            .iter()
            .filter_map(|pattern| pattern_to_rule(pattern, selected_languages))
            .collect(),
    }
}

/// Render the configuration as a YAML document preceded by [`CONFIG_HEADER`]
///
/// Rule keys keep the field order of [`Rule`]. Long single-line values are
/// folded at [`LINE_WIDTH`] and multi-line values become literal blocks.
pub fn render_config(config: &SemgrepConfig) -> Result<String, RenderError> {
    let mut emitter = BlockEmitter::new(LINE_WIDTH)?;
    emitter.begin_document()?;
    emitter.begin_mapping()?;
    emitter.scalar("rules")?;
    emitter.begin_sequence()?;
    for rule in &config.rules {
        emit_rule(&mut emitter, rule)?;
    }
    emitter.end_sequence()?;
    emitter.end_mapping()?;

    let body = emitter.finish()?;
    Ok(format!("{CONFIG_HEADER}{body}"))
}

fn emit_rule(emitter: &mut BlockEmitter, rule: &Rule) -> Result<(), EmitError> {
    emitter.begin_mapping()?;

    emitter.scalar("id")?;
    emitter.scalar(&rule.id)?;

    emitter.scalar("languages")?;
    emitter.begin_sequence()?;
    for language in &rule.languages {
        emitter.scalar(language)?;
    }
    emitter.end_sequence()?;

    if let Some(message) = &rule.message {
        emitter.scalar("message")?;
        emitter.scalar(message)?;
    }

    emitter.scalar("severity")?;
    emitter.scalar(&rule.severity)?;

    emitter.scalar("pattern")?;
    emitter.scalar(&rule.pattern)?;

    emitter.end_mapping()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codacy::PatternDefinition;

    fn pattern(id: &str, enabled: bool, languages: &[&str]) -> Pattern {
        Pattern {
            id: Some(format!("Semgrep_{id}")),
            enabled,
            severity: None,
            pattern_definition: PatternDefinition {
                id: id.to_string(),
                description: None,
                languages: languages.iter().map(|l| l.to_string()).collect(),
                pattern: None,
            },
        }
    }

    fn selected(languages: &[&str]) -> BTreeSet<String> {
        languages.iter().map(|l| l.to_string()).collect()
    }

    // ============================================================================
    // format_rule_id tests
    // ============================================================================

    #[test]
    fn test_format_rule_id_keeps_last_dotted_segment() {
        assert_eq!(format_rule_id("python.security.audit.audit"), "audit");
    }

    #[test]
    fn test_format_rule_id_dedups_hyphen_parts() {
        assert_eq!(
            format_rule_id("eslint.no-unused-vars-no-unused-vars"),
            "no-unused-vars"
        );
    }

    #[test]
    fn test_format_rule_id_empty() {
        assert_eq!(format_rule_id(""), "unknown-rule");
    }

    #[test]
    fn test_format_rule_id_trailing_dot() {
        assert_eq!(format_rule_id("python.lang."), "unknown-rule");
    }

    #[test]
    fn test_format_rule_id_without_separators() {
        assert_eq!(format_rule_id("eval"), "eval");
    }

    #[test]
    fn test_format_rule_id_keeps_first_occurrence_order() {
        assert_eq!(format_rule_id("go.a-b-a-c-b"), "a-b-c");
    }

    #[test]
    fn test_format_rule_id_collapses_empty_parts() {
        // "a--b" splits into ["a", "", "b"]; the empty part is kept once
        assert_eq!(format_rule_id("a--b--c"), "a--b-c");
    }

    // ============================================================================
    // pattern_to_rule tests
    // ============================================================================

    #[test]
    fn test_pattern_to_rule_defaults() {
        let rule = pattern_to_rule(&pattern("js.eval", true, &["JavaScript"]), &selected(&["javascript"]))
            .unwrap();

        assert_eq!(rule.id, "eval");
        assert_eq!(rule.languages, vec!["javascript"]);
        assert_eq!(rule.message, None);
        assert_eq!(rule.severity, "WARNING");
        assert_eq!(rule.pattern, "{}");
    }

    #[test]
    fn test_pattern_to_rule_copies_fields() {
        let mut p = pattern("python.flask.debug-enabled", true, &["python"]);
        p.severity = Some("error".to_string());
        p.pattern_definition.description = Some("Flask debug mode".to_string());
        p.pattern_definition.pattern = Some("app.run(debug=True)".to_string());

        let rule = pattern_to_rule(&p, &selected(&["python"])).unwrap();
        assert_eq!(rule.id, "debug-enabled");
        assert_eq!(rule.severity, "ERROR");
        assert_eq!(rule.message.as_deref(), Some("Flask debug mode"));
        assert_eq!(rule.pattern, "app.run(debug=True)");
    }

    #[test]
    fn test_pattern_to_rule_null_or_empty_severity_is_warning() {
        for severity in ["null", "\"\""] {
            let p: Pattern = serde_json::from_str(&format!(
                r#"{{"enabled": true, "severity": {severity}, "patternDefinition": {{"id": "x", "languages": ["Go"]}}}}"#
            ))
            .unwrap();

            let rule = pattern_to_rule(&p, &selected(&["go"])).unwrap();
            assert_eq!(rule.severity, "WARNING", "severity {severity}");
        }
    }

    #[test]
    fn test_pattern_to_rule_empty_description_omitted() {
        let mut p = pattern("x", true, &["go"]);
        p.pattern_definition.description = Some(String::new());

        let rule = pattern_to_rule(&p, &selected(&["go"])).unwrap();
        assert!(rule.message.is_none());
    }

    #[test]
    fn test_pattern_to_rule_no_intersection() {
        assert!(pattern_to_rule(&pattern("x", true, &["go"]), &selected(&["python"])).is_none());
    }

    #[test]
    fn test_pattern_to_rule_languages_equal_intersection() {
        let p = pattern("x", true, &["Python", "Go", "Java"]);
        let rule = pattern_to_rule(&p, &selected(&["go", "python", "ruby"])).unwrap();

        let languages: BTreeSet<String> = rule.languages.into_iter().collect();
        assert_eq!(languages, selected(&["go", "python"]));
    }

    // ============================================================================
    // build_config tests
    // ============================================================================

    #[test]
    fn test_build_config_preserves_order_and_skips() {
        let patterns = vec![
            pattern("a.first", true, &["python"]),
            pattern("b.second", true, &["ruby"]),
            pattern("c.third", true, &["python", "go"]),
        ];

        let config = build_config(&patterns, &selected(&["python"]));
        let ids: Vec<&str> = config.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "third"]);
        assert!(config.rules.iter().all(|r| r.languages == vec!["python"]));
    }

    #[test]
    fn test_build_config_keeps_colliding_ids() {
        let patterns = vec![
            pattern("python.audit.eval", true, &["python"]),
            pattern("js.audit.eval", true, &["python"]),
        ];

        let config = build_config(&patterns, &selected(&["python"]));
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].id, config.rules[1].id);
    }

    #[test]
    fn test_build_config_no_selection() {
        let patterns = vec![pattern("a", true, &["python"])];
        assert!(build_config(&patterns, &BTreeSet::new()).rules.is_empty());
    }

    // ============================================================================
    // render_config tests
    // ============================================================================

    fn sample_config() -> SemgrepConfig {
        SemgrepConfig {
            rules: vec![
                Rule {
                    id: "eval".to_string(),
                    languages: vec!["python".to_string()],
                    message: Some("Avoid eval.\nIt runs arbitrary code.".to_string()),
                    severity: "ERROR".to_string(),
                    pattern: "eval(...)".to_string(),
                },
                Rule {
                    id: "no-unused-vars".to_string(),
                    languages: vec!["javascript".to_string(), "typescript".to_string()],
                    message: None,
                    severity: "WARNING".to_string(),
                    pattern: "{}".to_string(),
                },
                Rule {
                    id: "unicode".to_string(),
                    languages: vec!["go".to_string()],
                    message: Some("Évitez ce motif ✓".to_string()),
                    severity: "INFO".to_string(),
                    pattern: "fmt.Println(\"héllo\")".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_render_config_starts_with_header() {
        let rendered = render_config(&sample_config()).unwrap();
        assert!(rendered.starts_with(CONFIG_HEADER));
        assert!(rendered[CONFIG_HEADER.len()..]
            .trim_start_matches("---\n")
            .starts_with("rules:"));
    }

    #[test]
    fn test_render_config_round_trip() {
        let config = sample_config();
        let rendered = render_config(&config).unwrap();

        let parsed: SemgrepConfig = serde_yml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_render_config_key_order() {
        let rendered = render_config(&sample_config()).unwrap();
        let first_rule = &rendered[rendered.find("- id: eval").unwrap()..];
        let first_rule = &first_rule[..first_rule.find("- id: no-unused-vars").unwrap()];

        let positions: Vec<usize> = ["id:", "languages:", "message:", "severity:", "pattern:"]
            .iter()
            .map(|key| first_rule.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_config_multiline_uses_literal_block() {
        let rendered = render_config(&sample_config()).unwrap();
        assert!(rendered.contains("message: |"));
        assert!(rendered.contains("It runs arbitrary code."));
        assert!(!rendered.contains("\\n"));
    }

    #[test]
    fn test_render_config_preserves_unicode() {
        let rendered = render_config(&sample_config()).unwrap();
        assert!(rendered.contains("Évitez ce motif ✓"));
    }

    #[test]
    fn test_render_config_folds_long_message() {
        let message = "Calling eval on strings built from request data lets an attacker run \
                       arbitrary code inside the server process, so pass literals instead.";
        let config = SemgrepConfig {
            rules: vec![Rule {
                message: Some(message.to_string()),
                ..sample_config().rules[1].clone()
            }],
        };
        assert!(message.len() > LINE_WIDTH as usize);

        let rendered = render_config(&config).unwrap();
        let body = &rendered[CONFIG_HEADER.len()..];

        // Folding happens at the first space past the width
        let longest_word = message.split(' ').map(str::len).max().unwrap();
        assert!(body.lines().count() > 8);
        assert!(body
            .lines()
            .all(|line| line.chars().count() <= LINE_WIDTH as usize + 1 + longest_word));
        assert!(!body.lines().any(|line| line.contains(message)));

        let parsed: SemgrepConfig = serde_yml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_render_config_empty_rules() {
        let rendered = render_config(&SemgrepConfig::default()).unwrap();
        assert_eq!(&rendered[CONFIG_HEADER.len()..], "rules: []\n");
    }

    #[test]
    fn test_render_config_quotes_ambiguous_values() {
        let config = SemgrepConfig {
            rules: vec![Rule {
                pattern: "true".to_string(),
                ..sample_config().rules[1].clone()
            }],
        };
        let rendered = render_config(&config).unwrap();
        assert!(rendered.contains("pattern: 'true'"));

        let parsed: SemgrepConfig = serde_yml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_render_config_omits_missing_message() {
        let config = SemgrepConfig {
            rules: vec![sample_config().rules[1].clone()],
        };
        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("message:"));
    }
}
