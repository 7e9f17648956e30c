//! Per-file content transform.

use glob::Pattern;
use promoter_config::RuleSet;
use promoter_core::{Error, ReleaseFile, Result};
use regex::Regex;

/// Render one file's content for the destination stage.
///
/// Steps, in order:
/// 1. the reserved `.releaser.yaml` is returned untouched
/// 2. every occurrence of `from_stage` becomes `to_stage`
/// 3. literal rules, each replacing all occurrences
/// 4. regex rules whose file glob (if any) matches the file name
pub fn transform_file(
    file: &ReleaseFile,
    from_stage: &str,
    to_stage: &str,
    rules: Option<&RuleSet>,
) -> Result<String> {
    if file.is_releaser_file() {
        return Ok(file.content.clone());
    }

    let mut content = if from_stage.is_empty() {
        file.content.clone()
    } else {
        file.content.replace(from_stage, to_stage)
    };

    let Some(rules) = rules else {
        return Ok(content);
    };

    for rule in &rules.literal {
        if rule.search.is_empty() {
            continue;
        }
        content = content.replace(&rule.search, &rule.replace);
    }

    for rule in &rules.regex {
        if !rule.file_glob.is_empty() {
            let pattern =
                Pattern::new(&normalize_glob(&rule.file_glob)).map_err(|e| Error::InvalidRule {
                    rule: rule.file_glob.clone(),
                    file: file.location().to_string(),
                    message: e.to_string(),
                })?;
            if !pattern.matches(&file.name) {
                continue;
            }
        }

        let re = Regex::new(&rule.pattern).map_err(|e| Error::InvalidRule {
            rule: rule.pattern.clone(),
            file: file.location().to_string(),
            message: e.to_string(),
        })?;
        content = re
            .replace_all(&content, rule.replacement.as_str())
            .into_owned();
    }

    Ok(content)
}

/// Rewrite `[^x]` set negation to the `[!x]` form `glob` understands.
fn normalize_glob(glob: &str) -> String {
    glob.replace("[^", "[!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use promoter_config::{LiteralRule, RegexRule};
    use promoter_core::layout::RELEASER_FILE;

    fn file(name: &str, content: &str) -> ReleaseFile {
        ReleaseFile::new(".", name, content)
    }

    #[test]
    fn test_releaser_file_is_identity() {
        let rules = RuleSet {
            literal: vec![LiteralRule::new("a", "b")],
            regex: vec![RegexRule::new(".*", "gone")],
        };
        let f = file(RELEASER_FILE, "a: 00-head");

        let out = transform_file(&f, "00-head", "01-staging", Some(&rules)).unwrap();
        assert_eq!(out, "a: 00-head");
    }

    #[test]
    fn test_stage_name_replaced_before_rules() {
        // The literal rule only matches after the stage rename has happened.
        let rules = RuleSet {
            literal: vec![LiteralRule::new("env-01-staging", "env-staging")],
            regex: vec![],
        };
        let f = file("config.yaml", "name: env-00-head\nother: 00-head\n");

        let out = transform_file(&f, "00-head", "01-staging", Some(&rules)).unwrap();
        assert_eq!(out, "name: env-staging\nother: 01-staging\n");
    }

    #[test]
    fn test_no_rules_only_renames_stage() {
        let f = file("config.yaml", "stage: 00-head");
        let out = transform_file(&f, "00-head", "01-staging", None).unwrap();
        assert_eq!(out, "stage: 01-staging");
    }

    #[test]
    fn test_autoupdate_comment_stripped() {
        let rules = RuleSet {
            literal: vec![],
            regex: vec![RegexRule::new(" # .*:autoupdate.*", "")],
        };
        let content = "image:\n  tag: v1.2.3 # {\"$imagepolicy\": \"flux:app:tag\"}:autoupdate\n  other: another # not-auto-push\n";
        let f = file("kustomization.yaml", content);

        let out = transform_file(&f, "00-head", "01-staging", Some(&rules)).unwrap();
        assert_eq!(
            out,
            "image:\n  tag: v1.2.3\n  other: another # not-auto-push\n"
        );
    }

    #[test]
    fn test_regex_glob_restricts_files() {
        let rules = RuleSet {
            literal: vec![],
            regex: vec![RegexRule::new("replicas: \\d+", "replicas: 3").for_files("*.yaml")],
        };

        let yaml = file("deployment.yaml", "replicas: 1");
        let json = file("deployment.json", "replicas: 1");

        assert_eq!(
            transform_file(&yaml, "a", "b", Some(&rules)).unwrap(),
            "replicas: 3"
        );
        assert_eq!(
            transform_file(&json, "a", "b", Some(&rules)).unwrap(),
            "replicas: 1"
        );
    }

    #[test]
    fn test_caret_negated_glob_set() {
        let rules = RuleSet {
            literal: vec![],
            regex: vec![RegexRule::new("replicas: \\d+", "replicas: 3").for_files("[^_]*.yaml")],
        };

        let values = file("values.yaml", "replicas: 1");
        let helpers = file("_helpers.yaml", "replicas: 1");

        assert_eq!(
            transform_file(&values, "a", "b", Some(&rules)).unwrap(),
            "replicas: 3"
        );
        assert_eq!(
            transform_file(&helpers, "a", "b", Some(&rules)).unwrap(),
            "replicas: 1"
        );
    }

    #[test]
    fn test_capture_group_references() {
        let rules = RuleSet {
            literal: vec![],
            regex: vec![RegexRule::new(
                r"host: (?P<svc>\w+)\.(\w+)\.internal",
                "host: ${svc}.$2.example.com",
            )],
        };
        let f = file("svc.yaml", "host: api.west.internal");

        assert_eq!(
            transform_file(&f, "x", "y", Some(&rules)).unwrap(),
            "host: api.west.example.com"
        );
    }

    #[test]
    fn test_invalid_regex_names_rule_and_file() {
        let rules = RuleSet {
            literal: vec![],
            regex: vec![RegexRule::new("(unclosed", "")],
        };
        let f = ReleaseFile::new("nested", "a.yaml", "x");

        let err = transform_file(&f, "x", "y", Some(&rules)).unwrap_err();
        match err {
            Error::InvalidRule { rule, file, .. } => {
                assert_eq!(rule, "(unclosed");
                assert_eq!(file, "nested/a.yaml");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let rules = RuleSet {
            literal: vec![],
            regex: vec![RegexRule::new("x", "y").for_files("[")],
        };
        let err = transform_file(&file("a.yaml", "x"), "a", "b", Some(&rules)).unwrap_err();
        assert!(matches!(err, Error::InvalidRule { .. }));
    }
}
