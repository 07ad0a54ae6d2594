pub const SCHEMA: &str = r#"
-- Chat users, keyed by the chat platform's numeric id
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS chat_groups (
    name TEXT PRIMARY KEY,
    created_at TEXT DEFAULT (datetime('now'))
);

-- At most one membership per (user, group)
CREATE TABLE IF NOT EXISTS memberships (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    group_name TEXT NOT NULL REFERENCES chat_groups(name) ON DELETE CASCADE,
    protected INTEGER NOT NULL DEFAULT 0,  -- removable only by the override user
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, group_name)
);

-- Directed graph: manager may administer managed. Cycles are allowed.
CREATE TABLE IF NOT EXISTS management_edges (
    manager TEXT NOT NULL REFERENCES chat_groups(name) ON DELETE CASCADE,
    managed TEXT NOT NULL REFERENCES chat_groups(name) ON DELETE CASCADE,
    PRIMARY KEY (manager, managed)
);

-- Presence of a row lets members of the group run the command
CREATE TABLE IF NOT EXISTS command_permissions (
    command TEXT NOT NULL,
    group_name TEXT NOT NULL REFERENCES chat_groups(name) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (command, group_name)
);

CREATE TABLE IF NOT EXISTS autolabel_rules (
    id TEXT PRIMARY KEY,
    rule_type TEXT NOT NULL CHECK (rule_type IN ('linked_issue', 'branch_name')),
    repository TEXT NOT NULL,
    pattern TEXT NOT NULL,
    label TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(repository, rule_type, pattern, label)
);

-- Repositories without a row have the default priority
CREATE TABLE IF NOT EXISTS repository_priorities (
    repository TEXT PRIMARY KEY,
    priority TEXT NOT NULL CHECK (priority IN ('default', 'important', 'ignored')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
CREATE INDEX IF NOT EXISTS idx_memberships_group ON memberships(group_name);
CREATE INDEX IF NOT EXISTS idx_management_edges_managed ON management_edges(managed);
CREATE INDEX IF NOT EXISTS idx_command_permissions_group ON command_permissions(group_name);
CREATE INDEX IF NOT EXISTS idx_autolabel_rules_repository ON autolabel_rules(repository, rule_type);
CREATE INDEX IF NOT EXISTS idx_repository_priorities_priority ON repository_priorities(priority);
"#;
