//! Placement rules.
//!
//! Rules are `(pattern, destination)` pairs evaluated in declared order.
//! Patterns are compiled once when the config is loaded; matching is an
//! unanchored search over the file name.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A placement rule as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Regular expression searched anywhere in the file name
    pub pattern: String,
    /// Folder relative to the watched root
    #[serde(rename = "target")]
    pub destination: String,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            destination: destination.into(),
        }
    }
}

/// A rule whose pattern failed to compile
#[derive(Debug, Error)]
#[error("Invalid rule pattern {pattern:?}: {source}")]
pub struct RuleError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    destination: String,
}

/// Ordered, precompiled placement rules. First match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule up front. A single bad pattern rejects the whole set.
    pub fn compile(rules: &[Rule]) -> Result<Self, RuleError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledRule {
                        regex,
                        destination: rule.destination.clone(),
                    })
                    .map_err(|source| RuleError {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Destination of the first rule whose pattern occurs in `file_name`
    pub fn match_rule(&self, file_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(file_name))
            .map(|rule| rule.destination.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_set(rules: &[(&str, &str)]) -> RuleSet {
        let rules: Vec<Rule> = rules.iter().map(|(p, d)| Rule::new(*p, *d)).collect();
        RuleSet::compile(&rules).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let rules = rule_set(&[
            (r"\.pdf$", "Documents"),
            (r"invoice", "Finance"),
        ]);

        assert_eq!(rules.match_rule("invoice.pdf"), Some("Documents"));
        assert_eq!(rules.match_rule("invoice.txt"), Some("Finance"));
    }

    #[test]
    fn test_unanchored_search() {
        let rules = rule_set(&[("report", "Reports")]);

        assert_eq!(rules.match_rule("q3-report-final.docx"), Some("Reports"));
        assert_eq!(rules.match_rule("report"), Some("Reports"));
    }

    #[test]
    fn test_no_match_is_none() {
        let rules = rule_set(&[(r"\.jpg$", "Photos")]);
        assert_eq!(rules.match_rule("notes.xyz"), None);
        assert_eq!(RuleSet::default().match_rule("anything"), None);
    }

    #[test]
    fn test_invoice_rule() {
        let rules = rule_set(&[(r".*invoice.*\.pdf$", "Documents/Finance/Invoices")]);
        assert_eq!(
            rules.match_rule("project_invoice_2024.pdf"),
            Some("Documents/Finance/Invoices")
        );
        assert_eq!(rules.match_rule("project_invoice_2024.pdf.bak"), None);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let rules = vec![Rule::new("ok", "A"), Rule::new("(unclosed", "B")];
        let err = RuleSet::compile(&rules).unwrap_err();
        assert_eq!(err.pattern, "(unclosed");
    }

    #[test]
    fn test_rule_deserializes_target_field() {
        let rule: Rule = serde_json::from_str(r#"{"pattern": "x", "target": "Y"}"#).unwrap();
        assert_eq!(rule, Rule::new("x", "Y"));
    }
}
