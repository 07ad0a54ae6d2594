use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Priority, RuleType};

/// Stable chat-platform identifier of a user.
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub group_name: String,
    pub protected: bool,
    pub created_at: DateTime<Utc>,
}

/// `manager` may administer `managed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManagementEdge {
    pub manager: String,
    pub managed: String,
}

impl ManagementEdge {
    pub fn new(manager: impl Into<String>, managed: impl Into<String>) -> Self {
        Self {
            manager: manager.into(),
            managed: managed.into(),
        }
    }
}

/// Members of `group_name` may invoke `command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPermission {
    pub command: String,
    pub group_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutolabelRule {
    pub id: String,
    pub rule_type: RuleType,
    pub repository: String,
    pub pattern: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPriority {
    pub repository: String,
    pub priority: Priority,
    pub updated_at: DateTime<Utc>,
}

/// A group together with everything attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct GroupDetails {
    pub group: Group,
    pub members: Vec<Membership>,
    pub commands: Vec<String>,
    pub can_manage: Vec<String>,
    pub is_managed_by: Vec<String>,
}
