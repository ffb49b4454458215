use crate::domain;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for creating a new project via the API
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct NewProject {
    #[validate(length(min = 1, max = 20))]
    pub project_name: String,
}

/// A project as listed on the caller's board
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct ProjectSummary {
    pub project_id: i32,
    pub project_name: String,
}

impl From<domain::membership::ProjectSummary> for ProjectSummary {
    fn from(value: domain::membership::ProjectSummary) -> Self {
        ProjectSummary {
            project_id: value.id.raw(),
            project_name: value.name,
        }
    }
}

/// Payload listing the caller's projects
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct ProjectListPayload {
    pub projects: Vec<ProjectSummary>,
}

/// Payload containing the ID of a project that was just created
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct CreatedProjectPayload {
    pub project_id: i32,
}

/// DTO naming the user to add to a project
#[derive(Deserialize, Validate)]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct NewMember {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
}

/// Payload listing a project's members
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct MemberListPayload {
    pub users: Vec<String>,
}
