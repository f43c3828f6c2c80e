use std::collections::HashSet;
use std::path::Path;

use log::info;
use rusqlite::{Connection, Transaction};

use crate::error::{Error, Result};

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id   INTEGER REFERENCES todos(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    completed   INTEGER NOT NULL DEFAULT 0,
    sort_order  INTEGER NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    priority    INTEGER NOT NULL DEFAULT 0,
    due_date    TEXT
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT
);
";

/// Columns that older databases may be missing, with the declaration used to
/// add them.
const LATE_TODO_COLUMNS: &[(&str, &str)] = &[
    ("sort_order", "INTEGER NOT NULL DEFAULT 0"),
    ("description", "TEXT NOT NULL DEFAULT ''"),
    ("priority", "INTEGER NOT NULL DEFAULT 0"),
    ("due_date", "TEXT"),
];

struct Migration {
    version: i64,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_todos_and_settings",
        up: create_tables,
    },
    Migration {
        version: 2,
        name: "backfill_todo_columns",
        up: backfill_todo_columns,
    },
    Migration {
        version: 3,
        name: "index_todos_parent",
        up: index_todos_parent,
    },
];

/// Schema version written to `PRAGMA user_version` once all migrations ran.
pub const SCHEMA_VERSION: i64 = 3;

fn create_tables(tx: &Transaction) -> Result<()> {
    tx.execute_batch(CREATE_TABLES)?;
    Ok(())
}

fn backfill_todo_columns(tx: &Transaction) -> Result<()> {
    let existing = table_columns(tx, "todos")?;
    for (name, decl) in LATE_TODO_COLUMNS {
        if existing.contains(*name) {
            continue;
        }
        tx.execute_batch(&format!("ALTER TABLE todos ADD COLUMN {name} {decl}"))?;
        info!("added missing column todos.{name}");
    }
    Ok(())
}

fn index_todos_parent(tx: &Transaction) -> Result<()> {
    tx.execute_batch("CREATE INDEX IF NOT EXISTS idx_todos_parent ON todos(parent_id)")?;
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    rows.collect::<rusqlite::Result<_>>().map_err(Into::into)
}

fn set_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Bring the schema up to [`SCHEMA_VERSION`]. Each pending step runs in its
/// own transaction together with the version bump, so a crash mid-way never
/// records a step that did not apply.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(Error::Migration(format!(
            "database schema version {current} is newer than this build ({SCHEMA_VERSION})"
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        (migration.up)(&tx)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        tx.commit()?;
        info!(
            "applied schema migration {} ({})",
            migration.version, migration.name
        );
    }
    Ok(())
}

/// Run `f` inside a named savepoint. Works standalone and nested inside an
/// outer transaction; an error rolls back everything `f` wrote.
pub fn savepoint<T>(
    conn: &Connection,
    name: &str,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;
    match f(conn) {
        Ok(v) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(v)
        }
        Err(e) => {
            let _ = conn.execute_batch(&format!("ROLLBACK TO {name}"));
            let _ = conn.execute_batch(&format!("RELEASE {name}"));
            Err(e)
        }
    }
}

/// Owns the single connection every operation goes through.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and migrate it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = open(path)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        set_pragmas(&conn)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

#[cfg(test)]
pub fn open_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    set_pragmas(&conn)?;
    migrate(&mut conn)?;
    Ok(conn)
}
