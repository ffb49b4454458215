use super::{Count, NewId};
use crate::domain;
use crate::domain::ProjectId;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};

pub struct DbProjectDetect {}

impl domain::project::driven_ports::ProjectDetect for DbProjectDetect {
    async fn project_exists(
        &self,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let projects_with_id =
            sqlx::query_as::<_, Count>("SELECT count(*) AS count FROM project p WHERE p.id = $1")
                .bind(project_id.raw())
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Detecting project by ID")?;

        Ok(projects_with_id.count() > 0)
    }
}

pub struct DbProjectWriter {}

impl domain::project::driven_ports::ProjectWriter for DbProjectWriter {
    async fn create_project(
        &self,
        name: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<ProjectId, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let new_project =
            sqlx::query_as::<_, NewId>("INSERT INTO project(name) VALUES ($1) RETURNING project.id")
                .bind(name)
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Inserting new project")?;

        Ok(ProjectId::new(new_project.id))
    }

    /// Removes the project and the rows it owns. Runs three statements, so
    /// callers hold a transaction whenever this accompanies other writes.
    async fn delete_project(
        &self,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("DELETE FROM project_task WHERE project_id = $1")
            .bind(project_id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Deleting a project's tasks")?;
        sqlx::query("DELETE FROM project_member WHERE project_id = $1")
            .bind(project_id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Deleting a project's memberships")?;
        sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(project_id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Deleting a project row")?;

        Ok(())
    }
}
