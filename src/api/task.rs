use crate::domain::auth::Identity;
use crate::domain::task::driving_ports::{TaskError, TaskPort};
use crate::domain::{ProjectId, TaskId};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiError, Json, NoPayload, OkBody, ok, ok_with};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, patch};
use std::sync::Arc;
use tracing::error;
use validator::Validate;

/// Builds a router for project-scoped task routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/projects/:project_id/tasks",
            get(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path(project_id): Path<String>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    list_tasks(&identity, &project_id, &mut ext_cxn, &task_service).await
                },
            )
            .post(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path(project_id): Path<String>,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    add_task(&identity, &project_id, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/projects/:project_id/tasks/:task_id",
            patch(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path((project_id, task_id)): Path<(String, String)>,
                 Json(update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(
                        &identity,
                        &project_id,
                        &task_id,
                        update,
                        &mut ext_cxn,
                        &task_service,
                    )
                    .await
                },
            )
            .delete(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path((project_id, task_id)): Path<(String, String)>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(&identity, &project_id, &task_id, &mut ext_cxn, &task_service)
                        .await
                },
            ),
        )
}

fn caller_of(identity: &Identity) -> Result<&str, ApiError> {
    domain::access::require_authenticated(identity)
        .map_err(|_| ApiError::Unauthenticated("You are not logged in".to_owned()))
}

fn parse_project_id(raw: &str) -> Result<ProjectId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid project ID".to_owned()))
}

fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid task ID".to_owned()))
}

impl From<TaskError> for ApiError {
    fn from(value: TaskError) -> Self {
        match value {
            TaskError::ProjectNotFound => ApiError::NotFound("There is no such project".to_owned()),
            TaskError::CallerNotMember => {
                ApiError::Forbidden("You don't have access to such project".to_owned())
            }
            TaskError::TaskNotInProject => {
                ApiError::NotFound("There is no such task in the project".to_owned())
            }
            TaskError::PortError(err) => {
                error!("Task operation failure: {err}");
                ApiError::Internal
            }
        }
    }
}

/// Lists the tasks of a project the caller belongs to
async fn list_tasks(
    identity: &Identity,
    raw_project_id: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<OkBody<dto::task::TaskListPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let task_read = persistence::db_task_driven_ports::DbTaskReader {};

    let tasks = task_service
        .tasks_in_project(caller, project_id, ext_cxn, &p_detect, &m_read, &task_read)
        .await
        .map_err(ApiError::from)?;
    Ok(ok_with(dto::task::TaskListPayload {
        tasks: tasks.into_iter().map(dto::task::Task::from).collect(),
    }))
}

/// Adds a task to a project the caller belongs to
async fn add_task(
    identity: &Identity,
    raw_project_id: &str,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<OkBody<dto::task::CreatedTaskPayload>>), ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;
    new_task.validate().map_err(ApiError::from)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};
    let domain_task = domain::task::NewTask::from(new_task);

    let task_id = task_service
        .add_task(
            caller,
            project_id,
            &domain_task,
            ext_cxn,
            &p_detect,
            &m_read,
            &task_write,
        )
        .await
        .map_err(ApiError::from)?;
    Ok((
        StatusCode::CREATED,
        ok_with(dto::task::CreatedTaskPayload {
            task_id: task_id.raw(),
        }),
    ))
}

/// Applies a partial update to a task, leaving omitted fields untouched
async fn update_task(
    identity: &Identity,
    raw_project_id: &str,
    raw_task_id: &str,
    update: dto::task::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<OkBody<NoPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;
    let task_id = parse_task_id(raw_task_id)?;
    update.validate().map_err(ApiError::from)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let task_read = persistence::db_task_driven_ports::DbTaskReader {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};
    let domain_update = domain::task::TaskUpdate::from(update);

    task_service
        .update_task(
            caller,
            project_id,
            task_id,
            &domain_update,
            ext_cxn,
            &p_detect,
            &m_read,
            &task_read,
            &task_write,
        )
        .await
        .map_err(ApiError::from)?;
    Ok(ok())
}

/// Deletes a task from a project the caller belongs to
async fn delete_task(
    identity: &Identity,
    raw_project_id: &str,
    raw_task_id: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<OkBody<NoPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;
    let task_id = parse_task_id(raw_task_id)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let task_read = persistence::db_task_driven_ports::DbTaskReader {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};

    task_service
        .delete_task(
            caller,
            project_id,
            task_id,
            ext_cxn,
            &p_detect,
            &m_read,
            &task_read,
            &task_write,
        )
        .await
        .map_err(ApiError::from)?;
    Ok(ok())
}
