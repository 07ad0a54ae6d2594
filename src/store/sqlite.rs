use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Params, Row, params};

use super::schema::SCHEMA;
use super::{Repository, Store, Transaction};
use crate::error::{Error, Result};
use crate::types::*;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Blocks the calling thread until the single connection frees up, so
    /// readers queue behind writers. Async callers go through
    /// `AppState::run`.
    fn lock(&self, timeout: Duration) -> Result<MutexGuard<'_, Connection>> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match self.conn.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(e)) => return Ok(e.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(Error::Timeout(timeout));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
            }
        }
    }

    fn begin(&self, timeout: Duration, statement: &str) -> Result<SqliteSession<'_>> {
        let conn = self.lock(timeout)?;
        conn.busy_timeout(timeout)?;
        conn.execute_batch(statement)
            .map_err(|e| busy_as_timeout(e, timeout))?;

        Ok(SqliteSession {
            conn,
            timeout,
            open: true,
        })
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn reader(&self, timeout: Duration) -> Result<Box<dyn Repository + '_>> {
        Ok(Box::new(self.begin(timeout, "BEGIN DEFERRED")?))
    }

    fn transaction(&self, timeout: Duration) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(self.begin(timeout, "BEGIN IMMEDIATE")?))
    }
}

/// Holds the connection for its whole lifetime, inside one SQLite transaction.
struct SqliteSession<'a> {
    conn: MutexGuard<'a, Connection>,
    timeout: Duration,
    open: bool,
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("Failed to roll back transaction: {e}");
            }
        }
    }
}

impl Transaction for SqliteSession<'_> {
    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| busy_as_timeout(e, self.timeout))?;
        self.open = false;
        Ok(())
    }
}

fn busy_as_timeout(err: rusqlite::Error, timeout: Duration) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            Error::Timeout(timeout)
        }
        other => Error::from(other),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl ToSql for RuleType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RuleType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        RuleType::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown rule type '{s}'").into()))
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Priority::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown priority '{s}'").into()))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        updated_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        name: row.get(0)?,
        created_at: parse_datetime(&row.get::<_, String>(1)?),
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        user_id: row.get(0)?,
        group_name: row.get(1)?,
        protected: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<ManagementEdge> {
    Ok(ManagementEdge {
        manager: row.get(0)?,
        managed: row.get(1)?,
    })
}

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<CommandPermission> {
    Ok(CommandPermission {
        command: row.get(0)?,
        group_name: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<AutolabelRule> {
    Ok(AutolabelRule {
        id: row.get(0)?,
        rule_type: row.get(1)?,
        repository: row.get(2)?,
        pattern: row.get(3)?,
        label: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn priority_from_row(row: &Row<'_>) -> rusqlite::Result<RepositoryPriority> {
    Ok(RepositoryPriority {
        repository: row.get(0)?,
        priority: row.get(1)?,
        updated_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

impl SqliteSession<'_> {
    fn query_one<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        self.conn
            .query_row(sql, params, map)
            .optional()
            .map_err(Error::from)
    }

    fn query_all<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        let items = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

impl Repository for SqliteSession<'_> {
    // User operations

    fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at",
            params![
                user.id,
                user.name,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.query_one(
            "SELECT id, name, created_at, updated_at FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
    }

    fn find_users_by_name(&self, name: &str) -> Result<Vec<User>> {
        self.query_all(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?1 ORDER BY id",
            params![name],
            user_from_row,
        )
    }

    // Group operations

    fn create_group(&self, group: &Group) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO chat_groups (name, created_at) VALUES (?1, ?2)",
            params![group.name, format_datetime(&group.created_at)],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::GroupExists(group.name.clone())),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_group(&self, name: &str) -> Result<Option<Group>> {
        self.query_one(
            "SELECT name, created_at FROM chat_groups WHERE name = ?1",
            params![name],
            group_from_row,
        )
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        self.query_all(
            "SELECT name, created_at FROM chat_groups ORDER BY name",
            [],
            group_from_row,
        )
    }

    fn delete_group(&self, name: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM chat_groups WHERE name = ?1", params![name])?;
        Ok(rows > 0)
    }

    // Membership operations

    fn get_membership(&self, user_id: UserId, group_name: &str) -> Result<Option<Membership>> {
        self.query_one(
            "SELECT user_id, group_name, protected, created_at
             FROM memberships WHERE user_id = ?1 AND group_name = ?2",
            params![user_id, group_name],
            membership_from_row,
        )
    }

    fn create_membership(&self, membership: &Membership) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO memberships (user_id, group_name, protected, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                membership.user_id,
                membership.group_name,
                membership.protected,
                format_datetime(&membership.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::AlreadyMember {
                user: membership.user_id,
                group: membership.group_name.clone(),
            }),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_membership(&self, user_id: UserId, group_name: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM memberships WHERE user_id = ?1 AND group_name = ?2",
            params![user_id, group_name],
        )?;
        Ok(rows > 0)
    }

    fn list_user_memberships(&self, user_id: UserId) -> Result<Vec<Membership>> {
        self.query_all(
            "SELECT user_id, group_name, protected, created_at
             FROM memberships WHERE user_id = ?1 ORDER BY group_name",
            params![user_id],
            membership_from_row,
        )
    }

    fn list_group_memberships(&self, group_name: &str) -> Result<Vec<Membership>> {
        self.query_all(
            "SELECT user_id, group_name, protected, created_at
             FROM memberships WHERE group_name = ?1 ORDER BY user_id",
            params![group_name],
            membership_from_row,
        )
    }

    // Management edge operations

    fn create_management_edge(&self, edge: &ManagementEdge) -> Result<bool> {
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO management_edges (manager, managed) VALUES (?1, ?2)",
            params![edge.manager, edge.managed],
        )?;
        Ok(rows > 0)
    }

    fn delete_management_edge(&self, manager: &str, managed: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM management_edges WHERE manager = ?1 AND managed = ?2",
            params![manager, managed],
        )?;
        Ok(rows > 0)
    }

    fn list_management_edges(&self) -> Result<Vec<ManagementEdge>> {
        self.query_all(
            "SELECT manager, managed FROM management_edges ORDER BY manager, managed",
            [],
            edge_from_row,
        )
    }

    // Command permission operations

    fn create_command_permission(&self, permission: &CommandPermission) -> Result<bool> {
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO command_permissions (command, group_name, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                permission.command,
                permission.group_name,
                format_datetime(&permission.created_at),
            ],
        )?;
        Ok(rows > 0)
    }

    fn delete_command_permission(&self, command: &str, group_name: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM command_permissions WHERE command = ?1 AND group_name = ?2",
            params![command, group_name],
        )?;
        Ok(rows > 0)
    }

    fn list_command_permissions(&self, command: &str) -> Result<Vec<CommandPermission>> {
        self.query_all(
            "SELECT command, group_name, created_at
             FROM command_permissions WHERE command = ?1 ORDER BY group_name",
            params![command],
            permission_from_row,
        )
    }

    fn list_group_command_permissions(
        &self,
        group_name: &str,
    ) -> Result<Vec<CommandPermission>> {
        self.query_all(
            "SELECT command, group_name, created_at
             FROM command_permissions WHERE group_name = ?1 ORDER BY command",
            params![group_name],
            permission_from_row,
        )
    }

    // Autolabel rule operations

    fn create_autolabel_rule(&self, rule: &AutolabelRule) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO autolabel_rules (id, rule_type, repository, pattern, label, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                rule.id,
                rule.rule_type,
                rule.repository,
                rule.pattern,
                rule.label,
                format_datetime(&rule.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::DuplicateRule),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_autolabel_rule(&self, id: &str) -> Result<Option<AutolabelRule>> {
        self.query_one(
            "SELECT id, rule_type, repository, pattern, label, created_at
             FROM autolabel_rules WHERE id = ?1",
            params![id],
            rule_from_row,
        )
    }

    fn delete_autolabel_rule(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM autolabel_rules WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_autolabel_rules(
        &self,
        repository: &str,
        rule_type: RuleType,
    ) -> Result<Vec<AutolabelRule>> {
        self.query_all(
            "SELECT id, rule_type, repository, pattern, label, created_at
             FROM autolabel_rules WHERE repository = ?1 AND rule_type = ?2
             ORDER BY pattern, label",
            params![repository, rule_type],
            rule_from_row,
        )
    }

    // Repository priority operations

    fn upsert_repository_priority(&self, priority: &RepositoryPriority) -> Result<()> {
        self.conn.execute(
            "INSERT INTO repository_priorities (repository, priority, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(repository) DO UPDATE SET
                priority = excluded.priority,
                updated_at = excluded.updated_at",
            params![
                priority.repository,
                priority.priority,
                format_datetime(&priority.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_repository_priority(&self, repository: &str) -> Result<Option<RepositoryPriority>> {
        self.query_one(
            "SELECT repository, priority, updated_at
             FROM repository_priorities WHERE repository = ?1",
            params![repository],
            priority_from_row,
        )
    }

    fn list_repository_priorities(&self, priority: Priority) -> Result<Vec<RepositoryPriority>> {
        self.query_all(
            "SELECT repository, priority, updated_at
             FROM repository_priorities WHERE priority = ?1 ORDER BY repository",
            params![priority],
            priority_from_row,
        )
    }
}
