use std::collections::BTreeSet;

use serde::Serialize;

use super::MembershipLedger;
use crate::config::Authority;
use crate::error::Result;
use crate::store::Repository;
use crate::types::{CommandPermission, UserId};

/// Outcome of a command check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// `group` is the first of the user's groups that grants the command.
    Allowed { group: String },
    /// Lists every group that would have granted the command.
    Denied { granting_groups: Vec<String> },
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Explanation for the chat user, `None` when allowed.
    #[must_use]
    pub fn denial_message(&self) -> Option<String> {
        match self {
            Decision::Allowed { .. } => None,
            Decision::Denied { granting_groups } if granting_groups.is_empty() => {
                Some("No group may run that command.".to_string())
            }
            Decision::Denied { granting_groups } => Some(format!(
                "Only members of groups {} may run that command.",
                granting_groups
                    .iter()
                    .map(|name| format!("_{name}_"))
                    .collect::<Vec<_>>()
                    .join(" | ")
            )),
        }
    }
}

/// Decides whether a user may invoke a command: any one of the user's groups
/// holding a grant for it suffices. There are no deny grants.
pub struct PermissionResolver<'r, R: ?Sized> {
    repo: &'r R,
    superuser_group: Option<&'r str>,
}

impl<'r, R: Repository + ?Sized> PermissionResolver<'r, R> {
    pub fn new(repo: &'r R, authority: &'r Authority) -> Self {
        Self {
            repo,
            superuser_group: authority.superuser_group.as_deref(),
        }
    }

    pub fn check(&self, user: UserId, command: &str) -> Result<Decision> {
        let groups = MembershipLedger::new(self.repo).groups_of(user)?;
        let grants = self.repo.list_command_permissions(command)?;
        let decision = resolve(&groups, &grants, self.superuser_group);

        tracing::debug!(user, command, allowed = decision.is_allowed(), "command check");
        Ok(decision)
    }

    pub fn is_allowed(&self, user: UserId, command: &str) -> Result<bool> {
        Ok(self.check(user, command)?.is_allowed())
    }
}

/// Pure decision over a user's groups and the grants recorded for one command.
#[must_use]
pub fn resolve(
    groups: &BTreeSet<String>,
    grants: &[CommandPermission],
    superuser_group: Option<&str>,
) -> Decision {
    if let Some(superuser) = superuser_group.filter(|name| groups.contains(*name)) {
        return Decision::Allowed {
            group: superuser.to_string(),
        };
    }

    match grants.iter().find(|grant| groups.contains(&grant.group_name)) {
        Some(grant) => Decision::Allowed {
            group: grant.group_name.clone(),
        },
        None => Decision::Denied {
            granting_groups: grants.iter().map(|g| g.group_name.clone()).collect(),
        },
    }
}
