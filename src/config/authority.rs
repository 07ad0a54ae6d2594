use serde::Deserialize;

use crate::types::UserId;

/// Who sits above the group graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Authority {
    /// The bot operator: may manage every group and remove protected memberships.
    pub override_user: Option<UserId>,
    /// Members of this group may run every command regardless of grants.
    pub superuser_group: Option<String>,
}

impl Authority {
    #[must_use]
    pub fn with_override(user: UserId) -> Self {
        Self {
            override_user: Some(user),
            superuser_group: None,
        }
    }

    #[must_use]
    pub fn is_override(&self, user: UserId) -> bool {
        self.override_user == Some(user)
    }
}
