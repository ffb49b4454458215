use super::Count;
use crate::domain;
use crate::domain::auth::StoredCredentials;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};

pub struct DbCredentialReader {}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    username: String,
    password_hash: String,
}

impl From<CredentialsRow> for StoredCredentials {
    fn from(value: CredentialsRow) -> Self {
        StoredCredentials {
            username: value.username,
            password_hash: value.password_hash,
        }
    }
}

impl domain::auth::driven_ports::CredentialReader for DbCredentialReader {
    async fn credentials_for(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<StoredCredentials>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let credentials = sqlx::query_as::<_, CredentialsRow>(
            "SELECT au.username, au.password_hash FROM app_user au WHERE au.username = $1",
        )
        .bind(username)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("Fetching credentials by login")?;

        Ok(credentials.map(StoredCredentials::from))
    }
}

pub struct DbCredentialWriter {}

impl domain::auth::driven_ports::CredentialWriter for DbCredentialWriter {
    async fn save_credentials(
        &self,
        credentials: &StoredCredentials,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("INSERT INTO app_user(username, password_hash) VALUES ($1, $2)")
            .bind(&credentials.username)
            .bind(&credentials.password_hash)
            .execute(cxn.borrow_connection())
            .await
            .context("Inserting new user credentials")?;

        Ok(())
    }
}

pub struct DbDetectUser {}

impl domain::auth::driven_ports::DetectUser for DbDetectUser {
    async fn user_exists(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let users_with_name =
            sqlx::query_as::<_, Count>("SELECT count(*) AS count FROM app_user au WHERE au.username = $1")
                .bind(username)
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Detecting user by login")?;

        Ok(users_with_name.count() > 0)
    }
}
