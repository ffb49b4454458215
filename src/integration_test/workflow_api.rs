use super::test_util;
use crate::api::session::SessionStore;
use crate::{SharedData, persistence, router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(pool: PgPool) -> Router {
    router(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(pool),
        sessions: SessionStore::new(),
    }))
}

/// Fires one request at the app, returning the response status and parsed body
async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should complete");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    };

    (status, parsed)
}

async fn signup_and_login(app: &Router, login: &str, password: &str) -> String {
    let (status, _) = send_json(
        app,
        "POST",
        "/signup",
        None,
        Some(json!({"login": login, "password": password})),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status);

    let (status, body) = send_json(
        app,
        "POST",
        "/login",
        None,
        Some(json!({"login": login, "password": password})),
    )
    .await;
    assert_eq!(StatusCode::OK, status);
    body["token"]
        .as_str()
        .expect("login should issue a token")
        .to_owned()
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn project_and_task_lifecycle() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_app(db);

        let alice = signup_and_login(&app, "alice", "hunter22").await;
        let bob = signup_and_login(&app, "bob", "hunter22").await;

        // Alice creates a project and sees it on her board
        let (status, body) = send_json(
            &app,
            "POST",
            "/projects",
            Some(&alice),
            Some(json!({"projectName": "Trip"})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let project_id = body["projectId"].as_i64().expect("project id expected");

        let (status, body) = send_json(&app, "GET", "/projects", Some(&alice), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!("Trip"), body["projects"][0]["projectName"]);

        // A task without a priority starts incomplete with a null priority
        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/projects/{project_id}/tasks"),
            Some(&alice),
            Some(json!({"taskName": "Buy milk"})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let task_id = body["taskId"].as_i64().expect("task id expected");

        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/projects/{project_id}/tasks"),
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!(false), body["tasks"][0]["completed"]);
        assert_eq!(Value::Null, body["tasks"][0]["priority"]);

        // Completing the task with an explicit false afterward sticks
        let (status, _) = send_json(
            &app,
            "PATCH",
            &format!("/projects/{project_id}/tasks/{task_id}"),
            Some(&alice),
            Some(json!({"completed": true, "priority": "high"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (status, _) = send_json(
            &app,
            "PATCH",
            &format!("/projects/{project_id}/tasks/{task_id}"),
            Some(&alice),
            Some(json!({"completed": false})),
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (_, body) = send_json(
            &app,
            "GET",
            &format!("/projects/{project_id}/tasks"),
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(json!(false), body["tasks"][0]["completed"]);
        assert_eq!(json!("high"), body["tasks"][0]["priority"]);

        // Alice invites bob; bob then removes alice and the project survives
        let (status, _) = send_json(
            &app,
            "POST",
            &format!("/projects/{project_id}/users"),
            Some(&alice),
            Some(json!({"username": "bob"})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);

        let (status, _) = send_json(
            &app,
            "DELETE",
            &format!("/projects/{project_id}/users/alice"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/projects/{project_id}/users"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!(["bob"]), body["users"]);

        // Bob leaving as the last member cascades the project and its tasks away
        let (status, _) = send_json(
            &app,
            "DELETE",
            &format!("/projects/{project_id}/users/bob"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (status, body) = send_json(&app, "GET", "/projects", Some(&bob), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!([]), body["projects"]);

        let (status, _) = send_json(
            &app,
            "GET",
            &format!("/projects/{project_id}/tasks"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn authentication_failures() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_app(db);

        let (status, _) = send_json(
            &app,
            "POST",
            "/signup",
            None,
            Some(json!({"login": "alice", "password": "hunter22"})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);

        // Duplicate signup is rejected with a precise message
        let (status, body) = send_json(
            &app,
            "POST",
            "/signup",
            None,
            Some(json!({"login": "alice", "password": "different"})),
        )
        .await;
        assert_eq!(StatusCode::CONFLICT, status);
        assert_eq!(json!("User with such login already exists"), body["msg"]);

        // Wrong password, repeatedly, with no lockout
        for _ in 0..3 {
            let (status, body) = send_json(
                &app,
                "POST",
                "/login",
                None,
                Some(json!({"login": "alice", "password": "wrong"})),
            )
            .await;
            assert_eq!(StatusCode::UNAUTHORIZED, status);
            assert_eq!(json!("Wrong password"), body["msg"]);
        }

        // Unknown login is a distinct failure
        let (status, body) = send_json(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"login": "nobody", "password": "hunter22"})),
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(json!("Wrong login"), body["msg"]);

        // The correct password still works afterward
        let (status, _) = send_json(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({"login": "alice", "password": "hunter22"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn membership_guards_every_project_route() {
    test_util::prepare_db_and_test(|db| async move {
        let app = test_app(db);

        let alice = signup_and_login(&app, "alice", "hunter22").await;
        let mallory = signup_and_login(&app, "mallory", "hunter22").await;

        let (_, body) = send_json(
            &app,
            "POST",
            "/projects",
            Some(&alice),
            Some(json!({"projectName": "Trip"})),
        )
        .await;
        let project_id = body["projectId"].as_i64().expect("project id expected");

        for (method, uri, request_body) in [
            ("GET", format!("/projects/{project_id}/tasks"), None),
            (
                "POST",
                format!("/projects/{project_id}/tasks"),
                Some(json!({"taskName": "Sabotage"})),
            ),
            ("GET", format!("/projects/{project_id}/users"), None),
            (
                "POST",
                format!("/projects/{project_id}/users"),
                Some(json!({"username": "mallory"})),
            ),
            (
                "DELETE",
                format!("/projects/{project_id}/users/alice"),
                None,
            ),
            ("DELETE", format!("/projects/{project_id}"), None),
        ] {
            let (status, body) =
                send_json(&app, method, &uri, Some(&mallory), request_body).await;
            assert_eq!(
                StatusCode::FORBIDDEN,
                status,
                "{method} {uri} should be forbidden for non-members"
            );
            assert_eq!(json!("You don't have access to such project"), body["msg"]);
        }

        // Anonymous requests are turned away before membership is even consulted
        let (status, _) = send_json(&app, "GET", "/projects", None, None).await;
        assert_eq!(StatusCode::UNAUTHORIZED, status);

        // Malformed project ids never reach the store
        let (status, body) =
            send_json(&app, "GET", "/projects/badId/tasks", Some(&alice), None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(json!("Invalid project ID"), body["msg"]);
    });
}
