mod schema;
mod sqlite;

use std::time::Duration;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Typed access to every persisted entity.
///
/// Implementations are sessions: everything done through one value observes a
/// single consistent view of the store.
pub trait Repository {
    // User operations
    fn upsert_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: UserId) -> Result<Option<User>>;
    fn find_users_by_name(&self, name: &str) -> Result<Vec<User>>;

    // Group operations
    fn create_group(&self, group: &Group) -> Result<()>;
    fn get_group(&self, name: &str) -> Result<Option<Group>>;
    fn list_groups(&self) -> Result<Vec<Group>>;
    /// Deletes the group and, by cascade, its memberships, command
    /// permissions and every management edge touching it.
    fn delete_group(&self, name: &str) -> Result<bool>;

    // Membership operations
    fn get_membership(&self, user_id: UserId, group_name: &str) -> Result<Option<Membership>>;
    fn create_membership(&self, membership: &Membership) -> Result<()>;
    fn delete_membership(&self, user_id: UserId, group_name: &str) -> Result<bool>;
    fn list_user_memberships(&self, user_id: UserId) -> Result<Vec<Membership>>;
    fn list_group_memberships(&self, group_name: &str) -> Result<Vec<Membership>>;

    // Management edge operations
    fn create_management_edge(&self, edge: &ManagementEdge) -> Result<bool>;
    fn delete_management_edge(&self, manager: &str, managed: &str) -> Result<bool>;
    fn list_management_edges(&self) -> Result<Vec<ManagementEdge>>;

    // Command permission operations
    fn create_command_permission(&self, permission: &CommandPermission) -> Result<bool>;
    fn delete_command_permission(&self, command: &str, group_name: &str) -> Result<bool>;
    fn list_command_permissions(&self, command: &str) -> Result<Vec<CommandPermission>>;
    fn list_group_command_permissions(&self, group_name: &str)
    -> Result<Vec<CommandPermission>>;

    // Autolabel rule operations
    fn create_autolabel_rule(&self, rule: &AutolabelRule) -> Result<()>;
    fn get_autolabel_rule(&self, id: &str) -> Result<Option<AutolabelRule>>;
    fn delete_autolabel_rule(&self, id: &str) -> Result<bool>;
    fn list_autolabel_rules(
        &self,
        repository: &str,
        rule_type: RuleType,
    ) -> Result<Vec<AutolabelRule>>;

    // Repository priority operations
    fn upsert_repository_priority(&self, priority: &RepositoryPriority) -> Result<()>;
    fn get_repository_priority(&self, repository: &str) -> Result<Option<RepositoryPriority>>;
    fn list_repository_priorities(&self, priority: Priority) -> Result<Vec<RepositoryPriority>>;
}

/// A write session. Changes become visible to others only on `commit`;
/// dropping an uncommitted transaction discards them.
pub trait Transaction: Repository {
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Store defines the database interface.
///
/// Every call that may wait on the database takes the caller's timeout and
/// fails with `Error::Timeout` once it elapses.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    fn reader(&self, timeout: Duration) -> Result<Box<dyn Repository + '_>>;

    fn transaction(&self, timeout: Duration) -> Result<Box<dyn Transaction + '_>>;
}
