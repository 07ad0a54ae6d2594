use std::fmt;

use serde::{Deserialize, Serialize};

/// What an autolabel rule's pattern is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    LinkedIssue,
    BranchName,
}

impl RuleType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleType::LinkedIssue => "linked_issue",
            RuleType::BranchName => "branch_name",
        }
    }

    pub fn parse(s: &str) -> Option<RuleType> {
        match s {
            "linked_issue" => Some(RuleType::LinkedIssue),
            "branch_name" => Some(RuleType::BranchName),
            _ => None,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How loudly events from a repository are reported.
/// Repositories without an explicit row are `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Default,
    Important,
    Ignored,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Default => "default",
            Priority::Important => "important",
            Priority::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "default" => Some(Priority::Default),
            "important" => Some(Priority::Important),
            "ignored" => Some(Priority::Ignored),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_type() {
        assert_eq!(RuleType::parse("branch_name"), Some(RuleType::BranchName));
        assert_eq!(RuleType::parse("linked_issue"), Some(RuleType::LinkedIssue));
        assert_eq!(RuleType::parse("label"), None);
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(Priority::default(), Priority::Default);
        assert_eq!(Priority::parse("ignored"), Some(Priority::Ignored));
        assert_eq!(Priority::Important.to_string(), "important");
    }

    #[test]
    fn test_serde_names_match_storage_names() {
        let json = serde_json::to_string(&RuleType::LinkedIssue).unwrap();
        assert_eq!(json, "\"linked_issue\"");
        let parsed: Priority = serde_json::from_str("\"important\"").unwrap();
        assert_eq!(parsed, Priority::Important);
    }
}
