use std::collections::BTreeSet;

use super::{GroupGraph, MembershipLedger};
use crate::config::Authority;
use crate::error::{Error, Result};
use crate::store::Repository;
use crate::types::UserId;

/// Decides whether a user may administer a group.
///
/// A user manages every group reachable from any group they belong to,
/// including those groups themselves. The override user manages everything.
/// Nothing is cached: the graph and memberships are read on every call.
pub struct ManagementAuthorizer<'r, R: ?Sized> {
    repo: &'r R,
    authority: &'r Authority,
}

impl<'r, R: Repository + ?Sized> ManagementAuthorizer<'r, R> {
    pub fn new(repo: &'r R, authority: &'r Authority) -> Self {
        Self { repo, authority }
    }

    pub fn graph(&self) -> Result<GroupGraph> {
        Ok(GroupGraph::from_edges(self.repo.list_management_edges()?))
    }

    pub fn can_manage(&self, user: UserId, target: &str) -> Result<bool> {
        if self.authority.is_override(user) {
            return Ok(true);
        }

        let groups = MembershipLedger::new(self.repo).groups_of(user)?;
        if groups.is_empty() {
            return Ok(false);
        }
        if groups.contains(target) {
            return Ok(true);
        }

        let graph = self.graph()?;
        let allowed = groups.iter().any(|group| graph.can_reach(group, target));

        tracing::debug!(user, group = target, allowed, "management check");
        Ok(allowed)
    }

    /// Fails with `NotAuthorized` unless `user` can manage `target`.
    pub fn require_manage(&self, user: UserId, target: &str) -> Result<()> {
        if self.can_manage(user, target)? {
            return Ok(());
        }

        tracing::warn!(user, group = target, "management denied");
        Err(Error::NotAuthorized {
            user,
            group: target.to_string(),
        })
    }

    /// Every existing group `user` can manage.
    pub fn manageable_groups(&self, user: UserId) -> Result<BTreeSet<String>> {
        let all: BTreeSet<String> = self
            .repo
            .list_groups()?
            .into_iter()
            .map(|g| g.name)
            .collect();

        if self.authority.is_override(user) {
            return Ok(all);
        }

        let graph = self.graph()?;
        let reachable = MembershipLedger::new(self.repo)
            .groups_of(user)?
            .iter()
            .flat_map(|group| graph.reachable_from(group))
            .filter(|group| all.contains(group))
            .collect();
        Ok(reachable)
    }
}
