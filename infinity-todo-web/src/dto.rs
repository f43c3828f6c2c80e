//! Request and response bodies for the JSON API.
//!
//! Requests reject unknown fields, so a misspelled key fails loudly instead
//! of being dropped.

use std::collections::BTreeMap;

use infinity_todo::model::{NewTask, ReorderIntent, TaskPatch};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub due_date: Option<String>,
}

impl From<CreateTodoRequest> for NewTask {
    fn from(req: CreateTodoRequest) -> Self {
        NewTask {
            title: req.title.unwrap_or_default(),
            parent_id: req.parent_id,
            description: req.description.unwrap_or_default(),
            priority: req.priority.unwrap_or(0),
            due_date: req.due_date.filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    /// Absent leaves the due date alone, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
}

fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl From<PatchTodoRequest> for TaskPatch {
    fn from(req: PatchTodoRequest) -> Self {
        TaskPatch {
            title: req.title,
            completed: req.completed,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusRequest {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderRequest {
    pub updates: Vec<ReorderUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderUpdate {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub sort_order: Option<i64>,
}

impl From<&ReorderUpdate> for ReorderIntent {
    fn from(update: &ReorderUpdate) -> Self {
        ReorderIntent {
            id: update.id,
            parent_id: update.parent_id,
            sort_order: update.sort_order.unwrap_or(0),
        }
    }
}

pub type SettingsRequest = BTreeMap<String, Value>;

/// Settings are stored as text, rendered the way earlier releases of the
/// app stringified them: strings verbatim, arrays as their elements joined
/// with `,` (`null` elements empty), objects as `[object Object]`, and
/// integral numbers without a fraction (`1.0` becomes `1`).
pub fn setting_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => setting_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

pub fn settings_text(req: &SettingsRequest) -> BTreeMap<String, String> {
    req.iter()
        .map(|(key, value)| (key.clone(), setting_text(value)))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: PatchTodoRequest = serde_json::from_value(json!({"priority": 2})).unwrap();
        assert_eq!(absent.due_date, None);

        let cleared: PatchTodoRequest =
            serde_json::from_value(json!({"due_date": null})).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: PatchTodoRequest =
            serde_json::from_value(json!({"due_date": "2026-12-24"})).unwrap();
        assert_eq!(set.due_date, Some(Some("2026-12-24".into())));
    }

    #[test]
    fn empty_patch_body_maps_to_empty_patch() {
        let req: PatchTodoRequest = serde_json::from_value(json!({})).unwrap();
        assert!(TaskPatch::from(req).is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_value::<CreateTodoRequest>(json!({"title": "t", "colour": 1}))
            .is_err());
        assert!(serde_json::from_value::<PatchTodoRequest>(json!({"sort_order": 1})).is_err());
    }

    #[test]
    fn create_defaults() {
        let req: CreateTodoRequest = serde_json::from_value(json!({"title": "t"})).unwrap();
        let task = NewTask::from(req);
        assert_eq!(task.title, "t");
        assert_eq!(task.description, "");
        assert_eq!(task.priority, 0);
        assert!(task.parent_id.is_none());
    }

    #[test]
    fn empty_due_date_on_create_is_none() {
        let req: CreateTodoRequest =
            serde_json::from_value(json!({"title": "t", "due_date": ""})).unwrap();
        assert!(NewTask::from(req).due_date.is_none());

        let req: CreateTodoRequest =
            serde_json::from_value(json!({"title": "t", "due_date": "2026-12-24"})).unwrap();
        assert_eq!(NewTask::from(req).due_date.as_deref(), Some("2026-12-24"));
    }

    #[test]
    fn reorder_requires_an_array() {
        assert!(serde_json::from_value::<ReorderRequest>(json!({"updates": {"id": 1}})).is_err());
        assert!(serde_json::from_value::<ReorderRequest>(json!({})).is_err());

        let req: ReorderRequest =
            serde_json::from_value(json!({"updates": [{"id": 4}, {"id": 5, "parent_id": 4, "sort_order": 2}]}))
                .unwrap();
        let intents: Vec<ReorderIntent> = req.updates.iter().map(ReorderIntent::from).collect();
        assert_eq!(
            intents,
            vec![
                ReorderIntent { id: 4, parent_id: None, sort_order: 0 },
                ReorderIntent { id: 5, parent_id: Some(4), sort_order: 2 },
            ]
        );
    }

    #[test]
    fn setting_values_become_text() {
        assert_eq!(setting_text(&json!("dark")), "dark");
        assert_eq!(setting_text(&json!(true)), "true");
        assert_eq!(setting_text(&json!(12)), "12");
        assert_eq!(setting_text(&json!(null)), "null");
        assert_eq!(setting_text(&json!(1.5)), "1.5");
        assert_eq!(setting_text(&json!(2.0)), "2");
        assert_eq!(setting_text(&json!([1, 2])), "1,2");
        assert_eq!(setting_text(&json!(["a", null, [3, 4]])), "a,,3,4");
        assert_eq!(setting_text(&json!({"k": 1})), "[object Object]");
    }
}
