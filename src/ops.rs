use std::collections::BTreeSet;

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::savepoint;
use crate::error::{Error, Result};
use crate::model::{NewTask, ReorderIntent, Task, TaskPatch};
use crate::validate::{detect_parent_cycle, normalize_parent, task_exists, validate_title};

const TASK_COLUMNS: &str =
    "id, parent_id, title, completed, sort_order, description, priority, due_date";

// Rows written before the NOT NULL defaults existed may still hold NULLs.
fn read_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        title: row.get(2)?,
        completed: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
        sort_order: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        description: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        priority: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        due_date: row.get(7)?,
    })
}

const INSERT_TASK: &str = "
INSERT INTO todos (title, parent_id, completed, sort_order, description, priority, due_date)
VALUES (?1, ?2, 0, 0, ?3, ?4, ?5)
";

const SET_POSITION: &str = "UPDATE todos SET parent_id = ?1, sort_order = ?2 WHERE id = ?3";

// UNION (not UNION ALL) so the walk terminates even over a damaged, looping
// parent chain.
const SET_COMPLETED_SUBTREE: &str = "
WITH RECURSIVE subtree(id) AS (
    SELECT id FROM todos WHERE id = ?1
    UNION
    SELECT t.id FROM todos t INNER JOIN subtree s ON t.parent_id = s.id
)
UPDATE todos SET completed = ?2 WHERE id IN (SELECT id FROM subtree)
";

const COUNT_SUBTREE: &str = "
WITH RECURSIVE subtree(id) AS (
    SELECT id FROM todos WHERE id = ?1
    UNION
    SELECT t.id FROM todos t INNER JOIN subtree s ON t.parent_id = s.id
)
SELECT COUNT(*) FROM subtree
";

const DELETE_SUBTREE: &str = "
WITH RECURSIVE subtree(id) AS (
    SELECT id FROM todos WHERE id = ?1
    UNION
    SELECT t.id FROM todos t INNER JOIN subtree s ON t.parent_id = s.id
)
DELETE FROM todos WHERE id IN (SELECT id FROM subtree)
";

fn parent_of(conn: &Connection, id: i64) -> Result<Option<i64>> {
    let parent: Option<Option<i64>> = conn
        .query_row("SELECT parent_id FROM todos WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(parent.flatten())
}

fn require_parent(conn: &Connection, parent_id: i64) -> Result<()> {
    if !task_exists(conn, parent_id)? {
        return Err(Error::validation(format!(
            "parent task {parent_id} not found"
        )));
    }
    Ok(())
}

pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let query = format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = ?1");
    let task = conn.query_row(&query, [id], read_task_row).optional()?;
    Ok(task)
}

/// Every task, siblings in display order: `sort_order` then `id`.
pub fn list_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let query = format!("SELECT {TASK_COLUMNS} FROM todos ORDER BY sort_order ASC, id ASC");
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], read_task_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

pub fn create_task(conn: &Connection, task: &NewTask) -> Result<Task> {
    validate_title(&task.title)?;
    let parent_id = normalize_parent(task.parent_id);
    if let Some(p) = parent_id {
        require_parent(conn, p)?;
    }
    conn.execute(
        INSERT_TASK,
        params![
            task.title,
            parent_id,
            task.description,
            task.priority,
            task.due_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    let query = format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = ?1");
    let created = conn.query_row(&query, [id], read_task_row)?;
    Ok(created)
}

/// Apply the fields present in `patch`. Returns the number of rows changed,
/// which is zero when `id` does not exist.
pub fn patch_task(conn: &Connection, id: i64, patch: &TaskPatch) -> Result<usize> {
    if patch.is_empty() {
        return Err(Error::validation("No update fields provided"));
    }

    let mut sets = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(title) = &patch.title {
        validate_title(title)?;
        sets.push("title = ?");
        values.push(Value::Text(title.clone()));
    }
    if let Some(completed) = patch.completed {
        sets.push("completed = ?");
        values.push(Value::Integer(i64::from(completed)));
    }
    if let Some(description) = &patch.description {
        sets.push("description = ?");
        values.push(Value::Text(description.clone()));
    }
    if let Some(priority) = patch.priority {
        sets.push("priority = ?");
        values.push(Value::Integer(priority));
    }
    if let Some(due_date) = &patch.due_date {
        sets.push("due_date = ?");
        values.push(due_date.clone().map_or(Value::Null, Value::Text));
    }
    values.push(Value::Integer(id));

    let sql = format!("UPDATE todos SET {} WHERE id = ?", sets.join(", "));
    let rows = conn.execute(&sql, params_from_iter(values))?;
    Ok(rows)
}

/// Set `completed` on `id` and all of its descendants in one statement.
pub fn set_completed_recursive(conn: &Connection, id: i64, completed: bool) -> Result<usize> {
    savepoint(conn, "status_recursive", |conn| {
        let rows = conn.execute(SET_COMPLETED_SUBTREE, params![id, completed])?;
        debug!("set completed={completed} on {rows} task(s) under {id}");
        Ok(rows)
    })
}

/// Move tasks to new parents and positions. Intents apply in order, so a
/// later intent for the same id wins. The batch is rejected as a whole if
/// any intent names a missing task or parent, or if the resulting parent
/// links contain a loop.
pub fn reorder_tasks(conn: &Connection, intents: &[ReorderIntent]) -> Result<()> {
    savepoint(conn, "reorder", |conn| {
        let mut stmt = conn.prepare_cached(SET_POSITION)?;
        let mut moved = BTreeSet::new();

        for intent in intents {
            if !task_exists(conn, intent.id)? {
                return Err(Error::validation(format!("task {} not found", intent.id)));
            }
            let parent_id = normalize_parent(intent.parent_id);
            if let Some(p) = parent_id {
                require_parent(conn, p)?;
            }
            stmt.execute(params![parent_id, intent.sort_order, intent.id])?;
            moved.insert(intent.id);
        }

        // Checked against the final layout: a batch may pass through an
        // intermediate loop as long as it ends as a forest.
        for &id in &moved {
            if let Some(parent) = parent_of(conn, id)? {
                if detect_parent_cycle(conn, id, parent)? {
                    return Err(Error::validation(format!(
                        "moving task {id} under {parent} would create a cycle"
                    )));
                }
            }
        }

        debug!("reordered {} task(s)", moved.len());
        Ok(())
    })
}

/// Delete `id` and its whole subtree. Returns the number of tasks removed.
pub fn delete_task(conn: &Connection, id: i64) -> Result<usize> {
    savepoint(conn, "delete_subtree", |conn| {
        // Rows removed by the foreign-key cascade are not reported by
        // sqlite3_changes, so size the subtree up front.
        let count: i64 = conn.query_row(COUNT_SUBTREE, [id], |row| row.get(0))?;
        conn.execute(DELETE_SUBTREE, [id])?;
        debug!("deleted {count} task(s) under {id}");
        Ok(count as usize)
    })
}
