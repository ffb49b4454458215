use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for creating a new account via the API. Only the login is printable so
/// passwords never reach the logs.
#[derive(Deserialize, Display, Validate)]
#[display("{login}")]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct NewUser {
    #[validate(length(min = 1, max = 50))]
    pub login: String,
    #[validate(length(min = 4, max = 50))]
    pub password: String,
}

impl From<NewUser> for domain::auth::NewUser {
    fn from(value: NewUser) -> Self {
        domain::auth::NewUser {
            username: value.login,
            password: value.password,
        }
    }
}

/// DTO for logging in. No length constraints here; a wrong-shaped password
/// should fail authentication, not validation.
#[derive(Deserialize, Display)]
#[display("{login}")]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl From<Credentials> for domain::auth::Credentials {
    fn from(value: Credentials) -> Self {
        domain::auth::Credentials {
            username: value.login,
            password: value.password,
        }
    }
}

/// Session token issued on login, presented back as a bearer token
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct SessionPayload {
    pub token: String,
}
