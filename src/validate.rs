use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

/// A title must contain something other than whitespace.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("Title is required"));
    }
    Ok(())
}

/// Parent ids of zero mean "no parent", matching what clients send for root
/// level tasks.
pub fn normalize_parent(parent_id: Option<i64>) -> Option<i64> {
    parent_id.filter(|&p| p != 0)
}

pub fn task_exists(conn: &Connection, id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM todos WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Detect if `task_id` under `parent_id` forms a loop: walking up from
/// `parent_id` reaches `task_id`. Stops if the walk revisits a node, so a
/// pre-existing loop elsewhere cannot hang the check.
pub fn detect_parent_cycle(conn: &Connection, task_id: i64, parent_id: i64) -> Result<bool> {
    if task_id == parent_id {
        return Ok(true);
    }
    let mut visited = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(id) = current {
        if !visited.insert(id) {
            return Ok(false);
        }
        let parent: Option<Option<i64>> = conn
            .query_row("SELECT parent_id FROM todos WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        match parent.flatten() {
            Some(p) if p == task_id => return Ok(true),
            next => current = next,
        }
    }
    Ok(false)
}
