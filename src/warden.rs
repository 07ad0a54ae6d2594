//! The API the chat and webhook collaborators call.
//!
//! Reads run in a read session; every mutation runs in its own transaction:
//! validate, authorize, apply, commit. Authorization is evaluated inside that
//! transaction on every call.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::auth::{Decision, ManagementAuthorizer, MembershipLedger, PermissionResolver};
use crate::config::{Authority, Config};
use crate::error::{Error, Result};
use crate::rules::{
    AUTOLABEL_ADD_COMMAND, AUTOLABEL_REMOVE_COMMAND, AutolabelTable, PRIORITIZE_COMMAND,
    PriorityTable,
};
use crate::store::{Repository, Store, Transaction};
use crate::types::*;
use crate::validation::{validate_command_name, validate_group_name};

pub struct Warden {
    store: Arc<dyn Store>,
    authority: Authority,
    timeout: Duration,
}

impl Warden {
    pub fn new(store: Arc<dyn Store>, authority: Authority, timeout: Duration) -> Self {
        Self {
            store,
            authority,
            timeout,
        }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Self {
        Self::new(store, config.authority.clone(), config.store.timeout())
    }

    #[must_use]
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    fn read<T>(&self, f: impl FnOnce(&dyn Repository) -> Result<T>) -> Result<T> {
        let reader = self.store.reader(self.timeout)?;
        f(&*reader)
    }

    fn write<T>(&self, f: impl FnOnce(&dyn Transaction) -> Result<T>) -> Result<T> {
        let tx = self.store.transaction(self.timeout)?;
        let value = f(&*tx)?;
        tx.commit()?;
        Ok(value)
    }

    // Users

    /// Records a user on first sight and keeps their display name current.
    pub fn ensure_user(&self, id: UserId, name: &str) -> Result<User> {
        self.write(|tx| {
            let now = Utc::now();
            let user = match tx.get_user(id)? {
                Some(existing) if existing.name == name => return Ok(existing),
                Some(existing) => User {
                    name: name.to_string(),
                    updated_at: now,
                    ..existing
                },
                None => User {
                    id,
                    name: name.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            };
            tx.upsert_user(&user)?;
            Ok(user)
        })
    }

    pub fn find_users_by_name(&self, name: &str) -> Result<Vec<User>> {
        self.read(|repo| repo.find_users_by_name(name))
    }

    // Decisions

    pub fn is_allowed(&self, user: UserId, command: &str) -> Result<bool> {
        Ok(self.check_command(user, command)?.is_allowed())
    }

    pub fn check_command(&self, user: UserId, command: &str) -> Result<Decision> {
        self.read(|repo| PermissionResolver::new(repo, &self.authority).check(user, command))
    }

    pub fn can_manage(&self, user: UserId, group: &str) -> Result<bool> {
        self.read(|repo| ManagementAuthorizer::new(repo, &self.authority).can_manage(user, group))
    }

    pub fn groups_of(&self, user: UserId) -> Result<BTreeSet<String>> {
        self.read(|repo| MembershipLedger::new(repo).groups_of(user))
    }

    pub fn manageable_groups(&self, user: UserId) -> Result<BTreeSet<String>> {
        self.read(|repo| ManagementAuthorizer::new(repo, &self.authority).manageable_groups(user))
    }

    // Groups

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.read(|repo| repo.list_groups())
    }

    pub fn group_details(&self, name: &str) -> Result<GroupDetails> {
        self.read(|repo| {
            let group = require_group(repo, name)?;
            let graph = ManagementAuthorizer::new(repo, &self.authority).graph()?;
            Ok(GroupDetails {
                members: MembershipLedger::new(repo).members_of(name)?,
                commands: repo
                    .list_group_command_permissions(name)?
                    .into_iter()
                    .map(|p| p.command)
                    .collect(),
                can_manage: graph.can_manage(name).map(String::from).collect(),
                is_managed_by: graph.is_managed_by(name).map(String::from).collect(),
                group,
            })
        })
    }

    /// Without a parent only the override user may create a group. With one,
    /// the actor must manage the parent, which then manages the new group.
    pub fn create_group(&self, actor: UserId, name: &str, parent: Option<&str>) -> Result<Group> {
        validate_group_name(name)?;

        self.write(|tx| {
            match parent {
                Some(parent) => {
                    require_group(tx, parent)?;
                    ManagementAuthorizer::new(tx, &self.authority).require_manage(actor, parent)?;
                }
                None if !self.authority.is_override(actor) => {
                    return Err(Error::NotAuthorized {
                        user: actor,
                        group: name.to_string(),
                    });
                }
                None => {}
            }

            let group = Group {
                name: name.to_string(),
                created_at: Utc::now(),
            };
            tx.create_group(&group)?;
            if let Some(parent) = parent {
                tx.create_management_edge(&ManagementEdge::new(parent, name))?;
            }

            info!(actor, group = name, parent, "group created");
            Ok(group)
        })
    }

    /// Cascades to memberships, grants and management edges. Groups holding
    /// protected memberships can only be deleted by the override user.
    pub fn delete_group(&self, actor: UserId, name: &str) -> Result<()> {
        self.write(|tx| {
            require_group(tx, name)?;
            ManagementAuthorizer::new(tx, &self.authority).require_manage(actor, name)?;

            if !self.authority.is_override(actor) {
                if let Some(user) = MembershipLedger::new(tx).first_protected_member(name)? {
                    return Err(Error::ProtectedMembership {
                        user,
                        group: name.to_string(),
                    });
                }
            }

            tx.delete_group(name)?;
            info!(actor, group = name, "group deleted");
            Ok(())
        })
    }

    // Membership

    /// Only the override user may create protected memberships.
    pub fn add_member(
        &self,
        actor: UserId,
        user: UserId,
        group: &str,
        protected: bool,
    ) -> Result<Membership> {
        self.write(|tx| {
            require_group(tx, group)?;
            ManagementAuthorizer::new(tx, &self.authority).require_manage(actor, group)?;
            if protected && !self.authority.is_override(actor) {
                return Err(Error::NotAuthorized {
                    user: actor,
                    group: group.to_string(),
                });
            }

            let membership = MembershipLedger::new(tx).add_member(user, group, protected)?;
            info!(actor, user, group, protected, "member added");
            Ok(membership)
        })
    }

    /// An existing protected membership is refused before reach is
    /// considered. Otherwise reach is checked before membership, so callers
    /// without it cannot learn who belongs to the group.
    pub fn remove_member(&self, actor: UserId, user: UserId, group: &str) -> Result<()> {
        self.write(|tx| {
            require_group(tx, group)?;
            let protected = tx
                .get_membership(user, group)?
                .is_some_and(|membership| membership.protected);
            if protected && !self.authority.is_override(actor) {
                return Err(Error::ProtectedMembership {
                    user,
                    group: group.to_string(),
                });
            }

            ManagementAuthorizer::new(tx, &self.authority).require_manage(actor, group)?;
            MembershipLedger::new(tx).remove_member(user, group, actor, &self.authority)?;
            info!(actor, user, group, "member removed");
            Ok(())
        })
    }

    // Command permissions

    /// Returns false if the group already held the grant. Apart from the
    /// override user, an actor can only hand out commands they may run.
    pub fn grant_command(&self, actor: UserId, group: &str, command: &str) -> Result<bool> {
        validate_command_name(command)?;

        self.write(|tx| {
            require_group(tx, group)?;
            ManagementAuthorizer::new(tx, &self.authority).require_manage(actor, group)?;
            if !self.authority.is_override(actor)
                && !PermissionResolver::new(tx, &self.authority).is_allowed(actor, command)?
            {
                return Err(Error::CommandDenied {
                    user: actor,
                    command: command.to_string(),
                });
            }

            let inserted = tx.create_command_permission(&CommandPermission {
                command: command.to_string(),
                group_name: group.to_string(),
                created_at: Utc::now(),
            })?;
            if inserted {
                info!(actor, group, command, "command granted");
            }
            Ok(inserted)
        })
    }

    /// Returns false if the group did not hold the grant.
    pub fn revoke_command(&self, actor: UserId, group: &str, command: &str) -> Result<bool> {
        self.write(|tx| {
            require_group(tx, group)?;
            ManagementAuthorizer::new(tx, &self.authority).require_manage(actor, group)?;

            let removed = tx.delete_command_permission(command, group)?;
            if removed {
                info!(actor, group, command, "command revoked");
            }
            Ok(removed)
        })
    }

    // Management edges

    /// The actor must manage both ends, so nobody can hand their own group
    /// control over a group they do not already administer.
    pub fn add_management_edge(&self, actor: UserId, manager: &str, managed: &str) -> Result<bool> {
        self.write(|tx| {
            require_group(tx, manager)?;
            require_group(tx, managed)?;
            let authorizer = ManagementAuthorizer::new(tx, &self.authority);
            authorizer.require_manage(actor, managed)?;
            authorizer.require_manage(actor, manager)?;

            let inserted = tx.create_management_edge(&ManagementEdge::new(manager, managed))?;
            if inserted {
                let cycle = authorizer.graph()?.on_cycle(manager);
                info!(actor, manager, managed, cycle, "management edge added");
            }
            Ok(inserted)
        })
    }

    /// The actor must manage both ends, so members of a managed group cannot
    /// cut their managers loose.
    pub fn remove_management_edge(
        &self,
        actor: UserId,
        manager: &str,
        managed: &str,
    ) -> Result<bool> {
        self.write(|tx| {
            require_group(tx, manager)?;
            require_group(tx, managed)?;
            let authorizer = ManagementAuthorizer::new(tx, &self.authority);
            authorizer.require_manage(actor, managed)?;
            authorizer.require_manage(actor, manager)?;

            let removed = tx.delete_management_edge(manager, managed)?;
            if removed {
                info!(actor, manager, managed, "management edge removed");
            }
            Ok(removed)
        })
    }

    // Autolabel rules

    pub fn rules_for(&self, repository: &str, rule_type: RuleType) -> Result<Vec<(String, String)>> {
        self.read(|repo| AutolabelTable::new(repo).rules_for(repository, rule_type))
    }

    pub fn labels_for(
        &self,
        repository: &str,
        rule_type: RuleType,
        subject: &str,
    ) -> Result<Vec<String>> {
        self.read(|repo| AutolabelTable::new(repo).labels_for(repository, rule_type, subject))
    }

    pub fn list_autolabel_rules(
        &self,
        repository: &str,
        rule_type: RuleType,
    ) -> Result<Vec<AutolabelRule>> {
        self.read(|repo| repo.list_autolabel_rules(repository, rule_type))
    }

    pub fn add_autolabel_rule(
        &self,
        actor: UserId,
        repository: &str,
        rule_type: RuleType,
        pattern: &str,
        label: &str,
    ) -> Result<AutolabelRule> {
        self.write(|tx| {
            self.require_command(tx, actor, AUTOLABEL_ADD_COMMAND)?;
            let rule = AutolabelTable::new(tx).add(repository, rule_type, pattern, label)?;
            info!(actor, repository, %rule_type, pattern, label, "autolabel rule added");
            Ok(rule)
        })
    }

    pub fn remove_autolabel_rule(&self, actor: UserId, id: &str) -> Result<AutolabelRule> {
        self.write(|tx| {
            self.require_command(tx, actor, AUTOLABEL_REMOVE_COMMAND)?;
            let rule = AutolabelTable::new(tx).remove(id)?;
            info!(actor, id, repository = %rule.repository, "autolabel rule removed");
            Ok(rule)
        })
    }

    // Repository priority

    pub fn priority_of(&self, repository: &str) -> Result<Priority> {
        self.read(|repo| PriorityTable::new(repo).priority_of(repository))
    }

    pub fn set_priority(
        &self,
        actor: UserId,
        repository: &str,
        priority: Priority,
    ) -> Result<RepositoryPriority> {
        self.write(|tx| {
            self.require_command(tx, actor, PRIORITIZE_COMMAND)?;
            let row = PriorityTable::new(tx).set(repository, priority)?;
            info!(actor, repository, %priority, "repository priority set");
            Ok(row)
        })
    }

    pub fn repositories_with(&self, priority: Priority) -> Result<Vec<String>> {
        self.read(|repo| PriorityTable::new(repo).repositories_with(priority))
    }

    // Setup

    /// Creates `group` managing itself if needed and gives the override user
    /// a protected membership in it. Safe to run more than once.
    pub fn bootstrap(&self, group: &str) -> Result<Membership> {
        validate_group_name(group)?;
        let operator = self.authority.override_user.ok_or_else(|| {
            Error::Config("an override user is required to bootstrap".to_string())
        })?;

        self.write(|tx| {
            if tx.get_group(group)?.is_none() {
                tx.create_group(&Group {
                    name: group.to_string(),
                    created_at: Utc::now(),
                })?;
            }
            tx.create_management_edge(&ManagementEdge::new(group, group))?;

            let ledger = MembershipLedger::new(tx);
            if let Some(existing) = tx.get_membership(operator, group)? {
                if existing.protected {
                    return Ok(existing);
                }
                ledger.remove_member(operator, group, operator, &self.authority)?;
            }
            let membership = ledger.add_member(operator, group, true)?;
            info!(user = operator, group, "bootstrapped administrative group");
            Ok(membership)
        })
    }

    fn require_command<R>(&self, repo: &R, actor: UserId, command: &str) -> Result<()>
    where
        R: Repository + ?Sized,
    {
        if self.authority.is_override(actor)
            || PermissionResolver::new(repo, &self.authority).is_allowed(actor, command)?
        {
            return Ok(());
        }

        tracing::warn!(user = actor, command, "command denied");
        Err(Error::CommandDenied {
            user: actor,
            command: command.to_string(),
        })
    }
}

fn require_group<R>(repo: &R, name: &str) -> Result<Group>
where
    R: Repository + ?Sized,
{
    repo.get_group(name)?
        .ok_or_else(|| Error::UnknownGroup(name.to_string()))
}
