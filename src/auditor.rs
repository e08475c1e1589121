//! The pattern auditor.
//!
//! Raises an issue against every created or changed item whose name matches
//! one of the configured regular expressions.

use crate::config::PatternRuleConfig;
use crate::core::{AuditIssue, Auditor, ChangeItem};
use anyhow::{Context, Result};
use regex::Regex;

/// A compiled pattern rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub regex: Regex,
    pub issue: String,
    pub score: u32,
}

/// An auditor driven by name patterns.
#[derive(Debug, Clone)]
pub struct PatternAuditor {
    rules: Vec<PatternRule>,
}

impl PatternAuditor {
    /// Compiles the rules from the configuration.
    pub fn new(rules: &[PatternRuleConfig]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).with_context(|| {
                    format!("Failed to compile auditor pattern '{}'", rule.pattern)
                })?;
                Ok(PatternRule {
                    regex,
                    issue: rule.issue.clone(),
                    score: rule.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Auditor for PatternAuditor {
    fn name(&self) -> &str {
        "pattern"
    }

    fn audit(&self, item: &ChangeItem) -> Vec<AuditIssue> {
        self.rules
            .iter()
            .filter(|rule| rule.regex.is_match(&item.name))
            .filter(|rule| !item.audit_issues.iter().any(|known| known.issue == rule.issue))
            .map(|rule| AuditIssue {
                issue: rule.issue.clone(),
                notes: Some(format!("name matches /{}/", rule.regex.as_str())),
                score: rule.score,
                justified: false,
                new: true,
            })
            .collect()
    }
}
