use chrono::Utc;
use glob::Pattern;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Repository;
use crate::types::{AutolabelRule, RuleType};

/// Patterns are shell-style globs matched against the whole subject: a branch
/// name for `branch_name` rules, the linked issue reference for
/// `linked_issue` rules. A pattern without wildcards is an exact match.
pub fn compile_pattern(pattern: &str) -> Result<Pattern> {
    if pattern.trim().is_empty() {
        return Err(Error::InvalidPattern("pattern cannot be empty".to_string()));
    }
    Pattern::new(pattern).map_err(|e| Error::InvalidPattern(format!("{pattern}: {e}")))
}

pub struct AutolabelTable<'r, R: ?Sized> {
    repo: &'r R,
}

impl<'r, R: Repository + ?Sized> AutolabelTable<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// `(pattern, label)` pairs for a repository, in a stable order.
    pub fn rules_for(&self, repository: &str, rule_type: RuleType) -> Result<Vec<(String, String)>> {
        Ok(self
            .repo
            .list_autolabel_rules(repository, rule_type)?
            .into_iter()
            .map(|rule| (rule.pattern, rule.label))
            .collect())
    }

    /// Every label whose rule matches `subject`. All matching rules fire.
    pub fn labels_for(
        &self,
        repository: &str,
        rule_type: RuleType,
        subject: &str,
    ) -> Result<Vec<String>> {
        let mut labels: Vec<String> = Vec::new();
        for (pattern, label) in self.rules_for(repository, rule_type)? {
            let matched = match Pattern::new(&pattern) {
                Ok(compiled) => compiled.matches(subject),
                Err(e) => {
                    tracing::warn!("Skipping unparseable autolabel pattern '{pattern}': {e}");
                    false
                }
            };
            if matched && !labels.contains(&label) {
                labels.push(label);
            }
        }
        Ok(labels)
    }

    pub fn add(
        &self,
        repository: &str,
        rule_type: RuleType,
        pattern: &str,
        label: &str,
    ) -> Result<AutolabelRule> {
        if repository.trim().is_empty() {
            return Err(Error::InvalidName("repository cannot be empty".to_string()));
        }
        if label.trim().is_empty() {
            return Err(Error::InvalidName("label cannot be empty".to_string()));
        }
        compile_pattern(pattern)?;

        let rule = AutolabelRule {
            id: Uuid::new_v4().to_string(),
            rule_type,
            repository: repository.to_string(),
            pattern: pattern.to_string(),
            label: label.to_string(),
            created_at: Utc::now(),
        };
        self.repo.create_autolabel_rule(&rule)?;
        Ok(rule)
    }

    pub fn remove(&self, id: &str) -> Result<AutolabelRule> {
        let rule = self
            .repo
            .get_autolabel_rule(id)?
            .ok_or_else(|| Error::UnknownRule(id.to_string()))?;
        self.repo.delete_autolabel_rule(id)?;
        Ok(rule)
    }
}
