use crate::api::session::{self, SessionStore};
use crate::domain::auth::driving_ports::{AuthPort, AuthenticateError, RegisterError};
use crate::domain::auth::Identity;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiError, Json, NoPayload, OkBody, ok, ok_with};
use crate::{AppState, SharedData, domain, dto, password, persistence};
use axum::Router;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::ErrorResponse;
use axum::routing::{get, post};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

/// Builds a router for account and session routes
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/signup",
            post(
                |State(app_data): AppState, Json(new_user): Json<dto::user::NewUser>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {};

                    signup(new_user, &mut ext_cxn, &auth_service).await
                },
            ),
        )
        .route(
            "/login",
            post(
                |State(app_data): AppState,
                 Extension(identity): Extension<Identity>,
                 Json(credentials): Json<dto::user::Credentials>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {};

                    login(
                        credentials,
                        identity,
                        &app_data.sessions,
                        &mut ext_cxn,
                        &auth_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/logout",
            get(|State(app_data): AppState, headers: HeaderMap| async move {
                logout(&headers, &app_data.sessions).await
            }),
        )
}

/// Registers a new account. Signing up does not start a session; clients log in
/// separately.
async fn signup(
    new_user: dto::user::NewUser,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl AuthPort,
) -> Result<(StatusCode, Json<OkBody<NoPayload>>), ErrorResponse> {
    info!("Signup attempt for {new_user}");
    new_user.validate().map_err(ApiError::from)?;

    let passwords = password::Argon2Passwords {};
    let cred_read = persistence::db_credential_driven_ports::DbCredentialReader {};
    let cred_write = persistence::db_credential_driven_ports::DbCredentialWriter {};
    let domain_user = domain::auth::NewUser::from(new_user);

    let register_result = auth_service
        .register(&domain_user, ext_cxn, &passwords, &cred_read, &cred_write)
        .await;
    match register_result {
        Ok(()) => Ok((StatusCode::CREATED, ok())),
        Err(RegisterError::UsernameTaken) => Err(ApiError::Conflict(
            "User with such login already exists".to_owned(),
        )
        .into()),
        Err(RegisterError::PortError(err)) => {
            error!("Signup failure: {err}");
            Err(ApiError::Internal.into())
        }
    }
}

/// Verifies credentials and starts a session, returning its bearer token.
/// Logging in twice is rejected; the caller must log out first.
async fn login(
    credentials: dto::user::Credentials,
    identity: Identity,
    sessions: &SessionStore,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl AuthPort,
) -> Result<Json<OkBody<dto::user::SessionPayload>>, ErrorResponse> {
    if let Identity::Authenticated(current_user) = identity {
        info!("Rejected login for {credentials} while signed in as {current_user}");
        return Err(ApiError::Conflict("You are already logged in".to_owned()).into());
    }

    let passwords = password::Argon2Passwords {};
    let cred_read = persistence::db_credential_driven_ports::DbCredentialReader {};
    let domain_credentials = domain::auth::Credentials::from(credentials);

    let auth_result = auth_service
        .authenticate(&domain_credentials, ext_cxn, &passwords, &cred_read)
        .await;
    match auth_result {
        Ok(()) => {
            let token = sessions.begin(&domain_credentials.username).await;
            info!("User {} logged in", domain_credentials.username);
            Ok(ok_with(dto::user::SessionPayload { token }))
        }
        Err(AuthenticateError::UnknownUsername) => {
            Err(ApiError::NotFound("Wrong login".to_owned()).into())
        }
        Err(AuthenticateError::WrongPassword) => {
            Err(ApiError::Unauthenticated("Wrong password".to_owned()).into())
        }
        Err(AuthenticateError::PortError(err)) => {
            error!("Login failure: {err}");
            Err(ApiError::Internal.into())
        }
    }
}

/// Ends the caller's session
async fn logout(
    headers: &HeaderMap,
    sessions: &SessionStore,
) -> Result<Json<OkBody<NoPayload>>, ErrorResponse> {
    let Some(token) = session::bearer_token(headers) else {
        return Err(ApiError::Unauthenticated("You are not logged in".to_owned()).into());
    };

    if sessions.end(token).await {
        Ok(ok())
    } else {
        Err(ApiError::Unauthenticated("You are not logged in".to_owned()).into())
    }
}
