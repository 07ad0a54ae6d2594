use std::collections::BTreeSet;

use chrono::Utc;

use crate::config::Authority;
use crate::error::{Error, Result};
use crate::store::Repository;
use crate::types::{Membership, User, UserId};

/// Who belongs to which group.
///
/// Adding an existing pair fails with `AlreadyMember`; it is never a silent
/// no-op. Protected memberships can only be removed by the override user.
pub struct MembershipLedger<'r, R: ?Sized> {
    repo: &'r R,
}

impl<'r, R: Repository + ?Sized> MembershipLedger<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    pub fn groups_of(&self, user: UserId) -> Result<BTreeSet<String>> {
        Ok(self
            .repo
            .list_user_memberships(user)?
            .into_iter()
            .map(|m| m.group_name)
            .collect())
    }

    pub fn is_member(&self, user: UserId, group: &str) -> Result<bool> {
        Ok(self.repo.get_membership(user, group)?.is_some())
    }

    pub fn members_of(&self, group: &str) -> Result<Vec<Membership>> {
        self.repo.list_group_memberships(group)
    }

    pub fn add_member(&self, user: UserId, group: &str, protected: bool) -> Result<Membership> {
        if self.repo.get_group(group)?.is_none() {
            return Err(Error::UnknownGroup(group.to_string()));
        }
        if self.is_member(user, group)? {
            return Err(Error::AlreadyMember {
                user,
                group: group.to_string(),
            });
        }

        self.ensure_user(user)?;

        let membership = Membership {
            user_id: user,
            group_name: group.to_string(),
            protected,
            created_at: Utc::now(),
        };
        self.repo.create_membership(&membership)?;
        Ok(membership)
    }

    /// `caller` is only consulted for protected memberships.
    pub fn remove_member(
        &self,
        user: UserId,
        group: &str,
        caller: UserId,
        authority: &Authority,
    ) -> Result<Membership> {
        let membership = self
            .repo
            .get_membership(user, group)?
            .ok_or_else(|| Error::NotMember {
                user,
                group: group.to_string(),
            })?;

        if membership.protected && !authority.is_override(caller) {
            return Err(Error::ProtectedMembership {
                user,
                group: group.to_string(),
            });
        }

        self.repo.delete_membership(user, group)?;
        Ok(membership)
    }

    /// Lowest user id holding a protected membership in `group`, if any.
    pub fn first_protected_member(&self, group: &str) -> Result<Option<UserId>> {
        Ok(self
            .members_of(group)?
            .into_iter()
            .find(|m| m.protected)
            .map(|m| m.user_id))
    }

    /// Memberships reference users, so a user seen for the first time as the
    /// subject of a membership gets a row named after their id.
    fn ensure_user(&self, user: UserId) -> Result<()> {
        if self.repo.get_user(user)?.is_none() {
            let now = Utc::now();
            self.repo.upsert_user(&User {
                id: user,
                name: user.to_string(),
                created_at: now,
                updated_at: now,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::{SqliteStore, Store};
    use crate::types::Group;

    const TIMEOUT: Duration = Duration::from_secs(1);
    const OPERATOR: UserId = 100;

    fn store_with_groups(names: &[&str]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.initialize().unwrap();
        let tx = store.transaction(TIMEOUT).unwrap();
        for name in names {
            tx.create_group(&Group {
                name: name.to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        }
        tx.commit().unwrap();
        store
    }

    #[test]
    fn test_add_and_query() {
        let store = store_with_groups(&["admins", "mods"]);
        let tx = store.transaction(TIMEOUT).unwrap();
        let ledger = MembershipLedger::new(&*tx);

        ledger.add_member(3, "admins", false).unwrap();
        ledger.add_member(3, "mods", false).unwrap();

        assert!(ledger.is_member(3, "mods").unwrap());
        assert!(!ledger.is_member(4, "mods").unwrap());
        assert_eq!(
            ledger.groups_of(3).unwrap(),
            BTreeSet::from(["admins".to_string(), "mods".to_string()])
        );
        assert!(ledger.groups_of(4).unwrap().is_empty());
        assert_eq!(tx.get_user(3).unwrap().unwrap().name, "3");
    }

    #[test]
    fn test_add_twice_fails() {
        let store = store_with_groups(&["mods"]);
        let tx = store.transaction(TIMEOUT).unwrap();
        let ledger = MembershipLedger::new(&*tx);

        ledger.add_member(1, "mods", false).unwrap();
        let err = ledger.add_member(1, "mods", true).unwrap_err();
        assert!(matches!(err, Error::AlreadyMember { user: 1, .. }));
        assert_eq!(ledger.members_of("mods").unwrap().len(), 1);
    }

    #[test]
    fn test_add_to_missing_group() {
        let store = store_with_groups(&[]);
        let tx = store.transaction(TIMEOUT).unwrap();
        let ledger = MembershipLedger::new(&*tx);

        let err = ledger.add_member(1, "ghosts", false).unwrap_err();
        assert!(matches!(err, Error::UnknownGroup(name) if name == "ghosts"));
    }

    #[test]
    fn test_remove_missing_membership() {
        let store = store_with_groups(&["mods"]);
        let tx = store.transaction(TIMEOUT).unwrap();
        let ledger = MembershipLedger::new(&*tx);
        let authority = Authority::with_override(OPERATOR);

        let err = ledger.remove_member(1, "mods", 2, &authority).unwrap_err();
        assert!(matches!(err, Error::NotMember { user: 1, .. }));
    }

    #[test]
    fn test_protected_membership_needs_override() {
        let store = store_with_groups(&["admins"]);
        let tx = store.transaction(TIMEOUT).unwrap();
        let ledger = MembershipLedger::new(&*tx);
        let authority = Authority::with_override(OPERATOR);

        ledger.add_member(1, "admins", true).unwrap();
        assert_eq!(ledger.first_protected_member("admins").unwrap(), Some(1));

        let err = ledger.remove_member(1, "admins", 2, &authority).unwrap_err();
        assert!(matches!(err, Error::ProtectedMembership { user: 1, .. }));
        let err = ledger.remove_member(1, "admins", 1, &authority).unwrap_err();
        assert!(matches!(err, Error::ProtectedMembership { .. }));

        let removed = ledger.remove_member(1, "admins", OPERATOR, &authority).unwrap();
        assert!(removed.protected);
        assert!(!ledger.is_member(1, "admins").unwrap());
    }

    #[test]
    fn test_no_override_configured() {
        let store = store_with_groups(&["admins"]);
        let tx = store.transaction(TIMEOUT).unwrap();
        let ledger = MembershipLedger::new(&*tx);

        ledger.add_member(1, "admins", true).unwrap();
        let err = ledger
            .remove_member(1, "admins", OPERATOR, &Authority::default())
            .unwrap_err();
        assert!(matches!(err, Error::ProtectedMembership { .. }));
    }
}
