use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;

/// The caller identity resolved once at the request boundary and passed
/// explicitly into core operations. There is no third state: a request is
/// either anonymous or carries a known username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(String),
}

impl Identity {
    pub fn username(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(username) => Some(username.as_str()),
        }
    }
}

/// A username paired with its stored password verifier
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct StoredCredentials {
    pub username: String,
    pub password_hash: String,
}

#[cfg_attr(test, derive(Clone))]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

#[cfg_attr(test, derive(Clone))]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub mod driven_ports {
    use super::*;

    /// Opaque one-way password scheme. The core never inspects verifier contents,
    /// it only round-trips them through this port.
    pub trait PasswordScheme: Sync {
        fn derive_verifier(&self, password: &str) -> Result<String, anyhow::Error>;

        /// Returns Ok(false) for a wrong password. A scheme failure is an Err so
        /// the two outcomes are never conflated.
        fn verify(&self, password: &str, stored_verifier: &str)
        -> Result<bool, anyhow::Error>;
    }

    pub trait CredentialReader: Sync {
        async fn credentials_for(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<StoredCredentials>, anyhow::Error>;
    }

    pub trait CredentialWriter: Sync {
        async fn save_credentials(
            &self,
            credentials: &StoredCredentials,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }

    pub trait DetectUser: Sync {
        async fn user_exists(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error("a user with that login already exists")]
        UsernameTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum AuthenticateError {
        #[error("no user with that login exists")]
        UnknownUsername,
        #[error("the supplied password was incorrect")]
        WrongPassword,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        async fn register(
            &self,
            new_user: &NewUser,
            ext_cxn: &mut impl ExternalConnectivity,
            passwords: &impl driven_ports::PasswordScheme,
            cred_read: &impl driven_ports::CredentialReader,
            cred_write: &impl driven_ports::CredentialWriter,
        ) -> Result<(), RegisterError>;

        async fn authenticate(
            &self,
            credentials: &Credentials,
            ext_cxn: &mut impl ExternalConnectivity,
            passwords: &impl driven_ports::PasswordScheme,
            cred_read: &impl driven_ports::CredentialReader,
        ) -> Result<(), AuthenticateError>;
    }
}

pub struct AuthService {}

#[derive(Debug, Error)]
pub(crate) enum UserExistsErr {
    #[error("user \"{0}\" does not exist")]
    UserDoesNotExist(String),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Confirms a username is registered before it gets referenced from another
/// relation, e.g. when granting project membership.
pub(crate) async fn verify_user_exists(
    username: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    user_detect: &impl driven_ports::DetectUser,
) -> Result<(), UserExistsErr> {
    let does_user_exist = user_detect.user_exists(username, ext_cxn).await?;

    if does_user_exist {
        Ok(())
    } else {
        Err(UserExistsErr::UserDoesNotExist(username.to_owned()))
    }
}

impl driving_ports::AuthPort for AuthService {
    async fn register(
        &self,
        new_user: &NewUser,
        ext_cxn: &mut impl ExternalConnectivity,
        passwords: &impl driven_ports::PasswordScheme,
        cred_read: &impl driven_ports::CredentialReader,
        cred_write: &impl driven_ports::CredentialWriter,
    ) -> Result<(), driving_ports::RegisterError> {
        // The duplicate check happens here rather than relying on the store's
        // unique constraint so the error stays a precise business failure.
        let existing = cred_read
            .credentials_for(&new_user.username, &mut *ext_cxn)
            .await
            .context("Looking up login during signup")?;
        if existing.is_some() {
            return Err(driving_ports::RegisterError::UsernameTaken);
        }

        let verifier = passwords
            .derive_verifier(&new_user.password)
            .context("Deriving password verifier during signup")?;
        cred_write
            .save_credentials(
                &StoredCredentials {
                    username: new_user.username.clone(),
                    password_hash: verifier,
                },
                &mut *ext_cxn,
            )
            .await
            .context("Saving credentials for a new user")?;

        Ok(())
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        ext_cxn: &mut impl ExternalConnectivity,
        passwords: &impl driven_ports::PasswordScheme,
        cred_read: &impl driven_ports::CredentialReader,
    ) -> Result<(), driving_ports::AuthenticateError> {
        let stored = cred_read
            .credentials_for(&credentials.username, &mut *ext_cxn)
            .await
            .context("Looking up login during authentication")?
            .ok_or(driving_ports::AuthenticateError::UnknownUsername)?;

        let password_matches = passwords
            .verify(&credentials.password, &stored.password_hash)
            .context("Verifying password against stored verifier")?;
        if password_matches {
            Ok(())
        } else {
            Err(driving_ports::AuthenticateError::WrongPassword)
        }
    }
}
