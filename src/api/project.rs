use crate::domain::auth::Identity;
use crate::domain::membership::driving_ports::{
    AddMemberError, MemberListError, MembershipPort, RemoveMemberError,
};
use crate::domain::project::driving_ports::{DeleteProjectError, ProjectPort};
use crate::domain::{ProjectId, access};
use crate::external_connections::{ExternalConnectivity, Transactable};
use crate::routing_utils::{ApiError, Json, NoPayload, OkBody, ok, ok_with};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

/// Builds a router for project and membership routes
pub fn project_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/projects",
            get(
                |State(app_data): AppState, Extension(identity): Extension<Identity>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let membership_service = domain::membership::MembershipService {};

                    list_projects(&identity, &mut ext_cxn, &membership_service).await
                },
            )
            .post(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Json(new_project): Json<dto::project::NewProject>| async move {
                    let ext_cxn = app_data.ext_cxn.clone();
                    let project_service = domain::project::ProjectService {};

                    create_project(&identity, new_project, &ext_cxn, &project_service).await
                },
            ),
        )
        .route(
            "/projects/:project_id",
            delete(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path(project_id): Path<String>| async move {
                    let ext_cxn = app_data.ext_cxn.clone();
                    let project_service = domain::project::ProjectService {};

                    delete_project(&identity, &project_id, &ext_cxn, &project_service).await
                },
            ),
        )
        .route(
            "/projects/:project_id/users",
            get(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path(project_id): Path<String>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let membership_service = domain::membership::MembershipService {};

                    list_members(&identity, &project_id, &mut ext_cxn, &membership_service).await
                },
            )
            .post(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path(project_id): Path<String>,
                 Json(new_member): Json<dto::project::NewMember>| async move {
                    let ext_cxn = app_data.ext_cxn.clone();
                    let membership_service = domain::membership::MembershipService {};

                    add_member(
                        &identity,
                        &project_id,
                        new_member,
                        &ext_cxn,
                        &membership_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/projects/:project_id/users/:username",
            delete(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Path((project_id, username)): Path<(String, String)>| async move {
                    let ext_cxn = app_data.ext_cxn.clone();
                    let membership_service = domain::membership::MembershipService {};

                    remove_member(
                        &identity,
                        &project_id,
                        &username,
                        &ext_cxn,
                        &membership_service,
                    )
                    .await
                },
            ),
        )
}

/// Resolves the caller's username or produces the standard 401 response
fn caller_of(identity: &Identity) -> Result<&str, ApiError> {
    access::require_authenticated(identity)
        .map_err(|_| ApiError::Unauthenticated("You are not logged in".to_owned()))
}

/// Parses a project id from a request path
fn parse_project_id(raw: &str) -> Result<ProjectId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid project ID".to_owned()))
}

impl From<MemberListError> for ApiError {
    fn from(value: MemberListError) -> Self {
        match value {
            MemberListError::ProjectNotFound => {
                ApiError::NotFound("There is no such project".to_owned())
            }
            MemberListError::CallerNotMember => {
                ApiError::Forbidden("You don't have access to such project".to_owned())
            }
            MemberListError::PortError(err) => {
                error!("Member list failure: {err}");
                ApiError::Internal
            }
        }
    }
}

impl From<AddMemberError> for ApiError {
    fn from(value: AddMemberError) -> Self {
        match value {
            AddMemberError::ProjectNotFound => {
                ApiError::NotFound("There is no such project".to_owned())
            }
            AddMemberError::CallerNotMember => {
                ApiError::Forbidden("You don't have access to such project".to_owned())
            }
            AddMemberError::UserNotFound => {
                ApiError::NotFound("There is no user with such username".to_owned())
            }
            AddMemberError::AlreadyMember => {
                ApiError::Conflict("User is already a member of the project".to_owned())
            }
            AddMemberError::PortError(err) => {
                error!("Member add failure: {err}");
                ApiError::Internal
            }
        }
    }
}

impl From<RemoveMemberError> for ApiError {
    fn from(value: RemoveMemberError) -> Self {
        match value {
            RemoveMemberError::ProjectNotFound => {
                ApiError::NotFound("There is no such project".to_owned())
            }
            RemoveMemberError::CallerNotMember => {
                ApiError::Forbidden("You don't have access to such project".to_owned())
            }
            RemoveMemberError::TargetNotMember => {
                ApiError::NotFound("Such user is not in the project".to_owned())
            }
            RemoveMemberError::PortError(err) => {
                error!("Member removal failure: {err}");
                ApiError::Internal
            }
        }
    }
}

impl From<DeleteProjectError> for ApiError {
    fn from(value: DeleteProjectError) -> Self {
        match value {
            DeleteProjectError::ProjectNotFound => {
                ApiError::NotFound("There is no such project".to_owned())
            }
            DeleteProjectError::CallerNotMember => {
                ApiError::Forbidden("You don't have access to such project".to_owned())
            }
            DeleteProjectError::PortError(err) => {
                error!("Project delete failure: {err}");
                ApiError::Internal
            }
        }
    }
}

/// Lists the projects the caller belongs to
async fn list_projects(
    identity: &Identity,
    ext_cxn: &mut impl ExternalConnectivity,
    membership_service: &impl MembershipPort,
) -> Result<Json<OkBody<dto::project::ProjectListPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    info!("Listing projects for {caller}");

    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let projects_result = membership_service
        .projects_of(caller, ext_cxn, &m_read)
        .await;
    let projects = match projects_result {
        Ok(projects) => projects,
        Err(err) => {
            error!("Project list failure: {err}");
            return Err(ApiError::Internal.into());
        }
    };

    Ok(ok_with(dto::project::ProjectListPayload {
        projects: projects
            .into_iter()
            .map(dto::project::ProjectSummary::from)
            .collect(),
    }))
}

/// Creates a project owned by the caller
async fn create_project(
    identity: &Identity,
    new_project: dto::project::NewProject,
    ext_cxn: &impl Transactable,
    project_service: &impl ProjectPort,
) -> Result<(StatusCode, Json<OkBody<dto::project::CreatedProjectPayload>>), ErrorResponse> {
    let caller = caller_of(identity)?;
    new_project.validate().map_err(ApiError::from)?;
    info!("User {caller} creating project");

    let p_write = persistence::db_project_driven_ports::DbProjectWriter {};
    let m_write = persistence::db_membership_driven_ports::DbMembershipWriter {};

    let create_result = project_service
        .create(caller, &new_project.project_name, ext_cxn, &p_write, &m_write)
        .await;
    match create_result {
        Ok(project_id) => Ok((
            StatusCode::CREATED,
            ok_with(dto::project::CreatedProjectPayload {
                project_id: project_id.raw(),
            }),
        )),
        Err(err) => {
            error!("Project create failure: {err}");
            Err(ApiError::Internal.into())
        }
    }
}

/// Deletes a project along with its tasks and memberships
async fn delete_project(
    identity: &Identity,
    raw_project_id: &str,
    ext_cxn: &impl Transactable,
    project_service: &impl ProjectPort,
) -> Result<Json<OkBody<NoPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let p_write = persistence::db_project_driven_ports::DbProjectWriter {};

    project_service
        .delete(caller, project_id, ext_cxn, &p_detect, &m_read, &p_write)
        .await
        .map_err(ApiError::from)?;
    Ok(ok())
}

/// Lists the members of a project the caller belongs to
async fn list_members(
    identity: &Identity,
    raw_project_id: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    membership_service: &impl MembershipPort,
) -> Result<Json<OkBody<dto::project::MemberListPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};

    let members = membership_service
        .members_of(caller, project_id, ext_cxn, &p_detect, &m_read)
        .await
        .map_err(ApiError::from)?;
    Ok(ok_with(dto::project::MemberListPayload { users: members }))
}

/// Adds an existing user to a project the caller belongs to
async fn add_member(
    identity: &Identity,
    raw_project_id: &str,
    new_member: dto::project::NewMember,
    ext_cxn: &impl Transactable,
    membership_service: &impl MembershipPort,
) -> Result<(StatusCode, Json<OkBody<NoPayload>>), ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;
    new_member.validate().map_err(ApiError::from)?;

    let u_detect = persistence::db_credential_driven_ports::DbDetectUser {};
    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let m_write = persistence::db_membership_driven_ports::DbMembershipWriter {};

    membership_service
        .add_member(
            caller,
            &new_member.username,
            project_id,
            ext_cxn,
            &u_detect,
            &p_detect,
            &m_read,
            &m_write,
        )
        .await
        .map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, ok()))
}

/// Removes a member from a project. Removing the last member deletes the
/// project itself.
async fn remove_member(
    identity: &Identity,
    raw_project_id: &str,
    username: &str,
    ext_cxn: &impl Transactable,
    membership_service: &impl MembershipPort,
) -> Result<Json<OkBody<NoPayload>>, ErrorResponse> {
    let caller = caller_of(identity)?;
    let project_id = parse_project_id(raw_project_id)?;

    let p_detect = persistence::db_project_driven_ports::DbProjectDetect {};
    let m_read = persistence::db_membership_driven_ports::DbMembershipReader {};
    let m_write = persistence::db_membership_driven_ports::DbMembershipWriter {};
    let p_write = persistence::db_project_driven_ports::DbProjectWriter {};

    membership_service
        .remove_member(
            caller, username, project_id, ext_cxn, &p_detect, &m_read, &m_write, &p_write,
        )
        .await
        .map_err(ApiError::from)?;
    Ok(ok())
}
