use crate::domain::membership::driven_ports::{MembershipReader, MembershipWriter};
use crate::domain::{ProjectId, access};
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use anyhow::Context;
use thiserror::Error;
use tracing::info;

pub mod driven_ports {
    use super::*;

    pub trait ProjectDetect: Sync {
        async fn project_exists(
            &self,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    /// Write half of project persistence. A project strictly owns its memberships
    /// and tasks, so [ProjectWriter::delete_project] removes all three relations.
    /// Callers are expected to hold a transaction when a delete accompanies other
    /// changes.
    pub trait ProjectWriter: Sync {
        async fn create_project(
            &self,
            name: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<ProjectId, anyhow::Error>;

        async fn delete_project(
            &self,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum DeleteProjectError {
        #[error("the requested project does not exist")]
        ProjectNotFound,
        #[error("the caller does not have access to the project")]
        CallerNotMember,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    impl From<ProjectExistsErr> for DeleteProjectError {
        fn from(value: ProjectExistsErr) -> Self {
            match value {
                ProjectExistsErr::ProjectDoesNotExist(_) => DeleteProjectError::ProjectNotFound,
                ProjectExistsErr::PortError(err) => {
                    DeleteProjectError::from(err.context("Deleting a project"))
                }
            }
        }
    }

    impl From<access::AccessError> for DeleteProjectError {
        fn from(value: access::AccessError) -> Self {
            match value {
                access::AccessError::Unauthenticated | access::AccessError::NotAMember(_) => {
                    DeleteProjectError::CallerNotMember
                }
                access::AccessError::PortError(err) => {
                    DeleteProjectError::from(err.context("Deleting a project"))
                }
            }
        }
    }

    pub trait ProjectPort {
        async fn create(
            &self,
            owner: &str,
            name: &str,
            tx_source: &impl Transactable,
            p_write: &impl driven_ports::ProjectWriter,
            m_write: &impl MembershipWriter,
        ) -> Result<ProjectId, anyhow::Error>;

        async fn delete(
            &self,
            caller: &str,
            project_id: ProjectId,
            tx_source: &impl Transactable,
            p_detect: &impl driven_ports::ProjectDetect,
            m_read: &impl MembershipReader,
            p_write: &impl driven_ports::ProjectWriter,
        ) -> Result<(), DeleteProjectError>;
    }
}

#[derive(Debug, Error)]
pub(crate) enum ProjectExistsErr {
    #[error("project {0} does not exist")]
    ProjectDoesNotExist(ProjectId),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Confirms a project id refers to a live project. An unknown project is a
/// distinct not-found outcome rather than a generic store failure.
pub(crate) async fn verify_project_exists(
    project_id: ProjectId,
    ext_cxn: &mut impl ExternalConnectivity,
    p_detect: &impl driven_ports::ProjectDetect,
) -> Result<(), ProjectExistsErr> {
    let does_project_exist = p_detect.project_exists(project_id, ext_cxn).await?;

    if does_project_exist {
        Ok(())
    } else {
        Err(ProjectExistsErr::ProjectDoesNotExist(project_id))
    }
}

pub struct ProjectService {}

impl driving_ports::ProjectPort for ProjectService {
    /// Creates the project row and the creator's membership row in one
    /// transaction. Either both persist or neither does, so a project can never
    /// be observed without its first member.
    async fn create(
        &self,
        owner: &str,
        name: &str,
        tx_source: &impl Transactable,
        p_write: &impl driven_ports::ProjectWriter,
        m_write: &impl MembershipWriter,
    ) -> Result<ProjectId, anyhow::Error> {
        let mut tx = tx_source
            .start_transaction()
            .await
            .context("Starting project creation transaction")?;

        let project_id = p_write
            .create_project(name, &mut tx)
            .await
            .context("Inserting project row")?;
        m_write
            .add_member(owner, project_id, &mut tx)
            .await
            .context("Inserting creator membership")?;

        tx.commit().await.context("Committing project creation")?;

        info!("User {owner} created project {project_id}");
        Ok(project_id)
    }

    async fn delete(
        &self,
        caller: &str,
        project_id: ProjectId,
        tx_source: &impl Transactable,
        p_detect: &impl driven_ports::ProjectDetect,
        m_read: &impl MembershipReader,
        p_write: &impl driven_ports::ProjectWriter,
    ) -> Result<(), driving_ports::DeleteProjectError> {
        let mut tx = tx_source
            .start_transaction()
            .await
            .context("Starting project delete transaction")?;

        verify_project_exists(project_id, &mut tx, p_detect).await?;
        access::require_membership(caller, project_id, &mut tx, m_read).await?;

        p_write
            .delete_project(project_id, &mut tx)
            .await
            .context("Deleting project with its memberships and tasks")?;

        tx.commit().await.context("Committing project delete")?;

        info!("User {caller} deleted project {project_id}");
        Ok(())
    }
}
