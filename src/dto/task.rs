use crate::domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// DTO for adding a task to a project
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct NewTask {
    #[validate(length(min = 1, max = 200))]
    pub task_name: String,
    #[serde(default)]
    pub priority: Option<String>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            name: value.task_name,
            priority: value.priority,
        }
    }
}

/// DTO for partially updating a task. Every field tracks whether the request
/// supplied it: for `priority`, an absent field deserializes to `None` while an
/// explicit `"priority": null` deserializes to `Some(None)` and clears the
/// stored value.
#[derive(Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200))]
    pub task_name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub priority: Option<Option<String>>,
    pub completed: Option<bool>,
}

/// Wraps a deserialized value in `Some` so a field's presence survives even when
/// its value is null. Combined with `#[serde(default)]`, absence stays `None`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<UpdateTask> for domain::task::TaskUpdate {
    fn from(value: UpdateTask) -> Self {
        domain::task::TaskUpdate {
            name: value.task_name,
            priority: value.priority,
            completed: value.completed,
        }
    }
}

/// A task as returned from the API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct Task {
    pub task_id: i32,
    pub task_name: String,
    pub created_at: DateTime<Utc>,
    pub priority: Option<String>,
    pub completed: bool,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            task_id: value.id.raw(),
            task_name: value.name,
            created_at: value.created_at,
            priority: value.priority,
            completed: value.completed,
        }
    }
}

/// Payload listing a project's tasks
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TaskListPayload {
    pub tasks: Vec<Task>,
}

/// Payload containing the ID of a task that was just created
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct CreatedTaskPayload {
    pub task_id: i32,
}
