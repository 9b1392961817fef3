pub const SCHEMA: &str = r#"
-- tiles table
CREATE TABLE IF NOT EXISTS tiles (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL,
    content TEXT NOT NULL,
    source TEXT,
    tags TEXT DEFAULT '[]',
    read INTEGER DEFAULT 0,
    starred INTEGER DEFAULT 0,
    archived INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_tiles_type ON tiles(type);
CREATE INDEX IF NOT EXISTS idx_tiles_created ON tiles(created_at);
CREATE INDEX IF NOT EXISTS idx_tiles_archived ON tiles(archived);

-- todos table
CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    assignee TEXT DEFAULT 'coby',
    completed INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    completed_at TEXT,
    created_by TEXT DEFAULT 'coby'
);

CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed);
CREATE INDEX IF NOT EXISTS idx_todos_assignee ON todos(assignee);

-- projects table
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    status TEXT DEFAULT 'active',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);

-- project_items table
CREATE TABLE IF NOT EXISTS project_items (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    acceptance_criteria TEXT DEFAULT '[]',
    status TEXT DEFAULT 'backlog',
    priority INTEGER DEFAULT 3,
    assignee TEXT DEFAULT 'coby',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    started_at TEXT,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_project_items_project ON project_items(project_id);
CREATE INDEX IF NOT EXISTS idx_project_items_status ON project_items(status);

-- project_docs table
CREATE TABLE IF NOT EXISTS project_docs (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    doc_type TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_project_docs_project ON project_docs(project_id);
CREATE INDEX IF NOT EXISTS idx_project_docs_type ON project_docs(doc_type);

-- messages table (chat log)
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);
"#;

/// Additive migrations applied in order on every startup. Re-running one that
/// already took effect fails (duplicate column) and the failure is ignored.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE tiles ADD COLUMN pinned INTEGER DEFAULT 0",
    "ALTER TABLE tiles ADD COLUMN saved_for_later INTEGER DEFAULT 0",
    "ALTER TABLE tiles ADD COLUMN reactions TEXT DEFAULT '[]'",
    "CREATE INDEX IF NOT EXISTS idx_tiles_pinned ON tiles(pinned)",
    "ALTER TABLE todos ADD COLUMN due_date TEXT",
    "CREATE INDEX IF NOT EXISTS idx_todos_due_date ON todos(due_date)",
    "ALTER TABLE todos ADD COLUMN project_item_id TEXT",
    "CREATE INDEX IF NOT EXISTS idx_todos_project_item ON todos(project_item_id)",
    "ALTER TABLE todos ADD COLUMN github_id TEXT",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_todos_github_id ON todos(github_id)",
];
