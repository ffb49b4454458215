use super::Count;
use crate::domain;
use crate::domain::ProjectId;
use crate::domain::membership::ProjectSummary;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};

pub struct DbMembershipReader {}

#[derive(sqlx::FromRow)]
struct ProjectSummaryRow {
    id: i32,
    name: String,
}

impl From<ProjectSummaryRow> for ProjectSummary {
    fn from(value: ProjectSummaryRow) -> Self {
        ProjectSummary {
            id: ProjectId::new(value.id),
            name: value.name,
        }
    }
}

impl domain::membership::driven_ports::MembershipReader for DbMembershipReader {
    async fn projects_of(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<ProjectSummary>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let projects: Vec<ProjectSummary> = sqlx::query_as::<_, ProjectSummaryRow>(
            "SELECT p.id, p.name FROM project p \
             JOIN project_member pm ON pm.project_id = p.id \
             WHERE pm.username = $1",
        )
        .bind(username)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("Fetching a user's projects")?
        .into_iter()
        .map(ProjectSummary::from)
        .collect();

        Ok(projects)
    }

    async fn members_of(
        &self,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<String>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let members = sqlx::query_scalar::<_, String>(
            "SELECT pm.username FROM project_member pm WHERE pm.project_id = $1",
        )
        .bind(project_id.raw())
        .fetch_all(cxn.borrow_connection())
        .await
        .context("Fetching project members")?;

        Ok(members)
    }

    async fn is_member(
        &self,
        username: &str,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let memberships = sqlx::query_as::<_, Count>(
            "SELECT count(*) AS count FROM project_member pm \
             WHERE pm.username = $1 AND pm.project_id = $2",
        )
        .bind(username)
        .bind(project_id.raw())
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Checking membership")?;

        Ok(memberships.count() > 0)
    }
}

pub struct DbMembershipWriter {}

impl domain::membership::driven_ports::MembershipWriter for DbMembershipWriter {
    async fn add_member(
        &self,
        username: &str,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("INSERT INTO project_member(username, project_id) VALUES ($1, $2)")
            .bind(username)
            .bind(project_id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Inserting membership row")?;

        Ok(())
    }

    async fn remove_member(
        &self,
        username: &str,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("DELETE FROM project_member WHERE username = $1 AND project_id = $2")
            .bind(username)
            .bind(project_id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Deleting membership row")?;

        Ok(())
    }
}
