use serde::{Deserialize, Serialize};

use crate::auth::Decision;
use crate::types::{Priority, RuleType, UserId};

#[derive(Debug, Deserialize)]
pub struct CommandQuery {
    pub user: UserId,
    pub command: String,
}

#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    pub user: UserId,
    pub group: String,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CommandDecisionResponse {
    pub allowed: bool,
    #[serde(flatten)]
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Decision> for CommandDecisionResponse {
    fn from(decision: Decision) -> Self {
        Self {
            allowed: decision.is_allowed(),
            message: decision.denial_message(),
            decision,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ManageDecisionResponse {
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct EnsureUserRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserGroupsResponse {
    pub groups: Vec<String>,
    pub manageable: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Deserialize)]
pub struct GrantCommandRequest {
    pub command: String,
}

#[derive(Debug, Deserialize)]
pub struct ManageGroupRequest {
    pub group: String,
}

/// Whether a create/delete changed anything.
#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    pub changed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddAutolabelRequest {
    pub rule_type: RuleType,
    pub pattern: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct LabelsQuery {
    pub rule_type: RuleType,
    pub subject: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPriorityRequest {
    pub priority: Priority,
}

#[derive(Debug, Serialize)]
pub struct PriorityResponse {
    pub repository: String,
    pub priority: Priority,
}
