use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;
use serde::Serialize;
use validator::ValidationErrors;

/// Envelope for every successful response: `{"status": "ok", ...payload}`
#[derive(Serialize)]
#[cfg_attr(test, derive(serde::Deserialize, Debug))]
pub struct OkBody<T> {
    pub status: String,
    #[serde(flatten)]
    pub payload: T,
}

/// Wraps a payload in the success envelope
pub fn ok_with<T: Serialize>(payload: T) -> Json<OkBody<T>> {
    Json(OkBody {
        status: "ok".to_owned(),
        payload,
    })
}

/// Payload-free success marker
#[derive(Serialize)]
#[cfg_attr(test, derive(serde::Deserialize, Debug))]
pub struct NoPayload {}

/// Bare `{"status": "ok"}` response
pub fn ok() -> Json<OkBody<NoPayload>> {
    ok_with(NoPayload {})
}

/// Wire shape of every failure: `{"status": "error", "msg": ...}`
#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorBody {
    pub status: String,
    pub msg: String,
}

/// API failure classes from the service's error taxonomy, each mapped onto an
/// HTTP status code. [ApiError::Internal] carries no message so store internals
/// never leak to clients.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ),
        };

        (
            status,
            Json(ErrorBody {
                status: "error".to_owned(),
                msg,
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(value: ValidationErrors) -> Self {
        ApiError::Validation(format!("Submitted data was invalid: {value}"))
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(ErrorBody {
                status: "error".to_owned(),
                msg: format!("Malformed request body: {}", self.parse_problem),
            }),
        )
            .into_response()
    }
}
