use crate::AppState;
use crate::domain::auth::Identity;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Server-side session store mapping opaque bearer tokens to usernames. This is
/// the whole identity adapter; the core only ever sees the resolved [Identity].
pub struct SessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issues a fresh session token for a user who just authenticated
    pub async fn begin(&self, username: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        self.sessions
            .write()
            .await
            .insert(token.clone(), username.to_owned());

        debug!("Started session for {username}");
        token
    }

    /// Resolves a token to an identity. Unknown tokens resolve to
    /// [Identity::Anonymous] so a stale session looks the same as no session.
    pub async fn identity_of(&self, token: &str) -> Identity {
        match self.sessions.read().await.get(token) {
            Some(username) => Identity::Authenticated(username.clone()),
            None => Identity::Anonymous,
        }
    }

    /// Ends a session, reporting whether the token was actually active
    pub async fn end(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

/// Pulls the bearer token out of an Authorization header, if one was sent
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Middleware which resolves the caller's identity exactly once per request and
/// attaches it as a request extension. Handlers then receive an explicit
/// [Identity] value instead of consulting ambient session state.
pub async fn resolve_identity(
    State(app_data): AppState,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(request.headers()) {
        Some(token) => app_data.sessions.identity_of(token).await,
        None => Identity::Anonymous,
    };
    request.extensions_mut().insert(identity);

    next.run(request).await
}
