use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub completed: bool,
    pub sort_order: i64,
    pub description: String,
    pub priority: i64,
    pub due_date: Option<String>,
}

/// Fields accepted when creating a task. New tasks always start open with
/// `sort_order = 0`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub parent_id: Option<i64>,
    pub description: String,
    pub priority: i64,
    pub due_date: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn under(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// A partial update. `None` leaves the column alone; `due_date: Some(None)`
/// clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub due_date: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// One entry of a bulk reorder. `parent_id: None` moves the task to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderIntent {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub sort_order: i64,
}
