use crate::domain::auth::driven_ports::DetectUser;
use crate::domain::project::driven_ports::{ProjectDetect, ProjectWriter};
use crate::domain::{ProjectId, access, auth, project};
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use anyhow::Context;
use thiserror::Error;
use tracing::{error, info};

/// A project a user belongs to, as listed on their board
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

pub mod driven_ports {
    use super::*;

    pub trait MembershipReader: Sync {
        async fn projects_of(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<ProjectSummary>, anyhow::Error>;

        async fn members_of(
            &self,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<String>, anyhow::Error>;

        /// The single authority on project access, consulted by the access gate
        async fn is_member(
            &self,
            username: &str,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    /// Write half of the membership relation. The store does not guard against
    /// duplicate pairs itself; the service checks first so error reporting stays
    /// precise.
    pub trait MembershipWriter: Sync {
        async fn add_member(
            &self,
            username: &str,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn remove_member(
            &self,
            username: &str,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum MemberListError {
        #[error("the requested project does not exist")]
        ProjectNotFound,
        #[error("the caller does not have access to the project")]
        CallerNotMember,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum AddMemberError {
        #[error("the requested project does not exist")]
        ProjectNotFound,
        #[error("the caller does not have access to the project")]
        CallerNotMember,
        #[error("the user to add does not exist")]
        UserNotFound,
        #[error("the user is already a member of the project")]
        AlreadyMember,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum RemoveMemberError {
        #[error("the requested project does not exist")]
        ProjectNotFound,
        #[error("the caller does not have access to the project")]
        CallerNotMember,
        #[error("the user to remove is not a member of the project")]
        TargetNotMember,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    impl From<project::ProjectExistsErr> for MemberListError {
        fn from(value: project::ProjectExistsErr) -> Self {
            match value {
                project::ProjectExistsErr::ProjectDoesNotExist(_) => {
                    MemberListError::ProjectNotFound
                }
                project::ProjectExistsErr::PortError(err) => {
                    MemberListError::from(err.context("Listing project members"))
                }
            }
        }
    }

    impl From<access::AccessError> for MemberListError {
        fn from(value: access::AccessError) -> Self {
            match value {
                access::AccessError::Unauthenticated | access::AccessError::NotAMember(_) => {
                    MemberListError::CallerNotMember
                }
                access::AccessError::PortError(err) => {
                    MemberListError::from(err.context("Listing project members"))
                }
            }
        }
    }

    impl From<project::ProjectExistsErr> for AddMemberError {
        fn from(value: project::ProjectExistsErr) -> Self {
            match value {
                project::ProjectExistsErr::ProjectDoesNotExist(_) => {
                    AddMemberError::ProjectNotFound
                }
                project::ProjectExistsErr::PortError(err) => {
                    AddMemberError::from(err.context("Adding a project member"))
                }
            }
        }
    }

    impl From<access::AccessError> for AddMemberError {
        fn from(value: access::AccessError) -> Self {
            match value {
                access::AccessError::Unauthenticated | access::AccessError::NotAMember(_) => {
                    AddMemberError::CallerNotMember
                }
                access::AccessError::PortError(err) => {
                    AddMemberError::from(err.context("Adding a project member"))
                }
            }
        }
    }

    impl From<auth::UserExistsErr> for AddMemberError {
        fn from(value: auth::UserExistsErr) -> Self {
            match value {
                auth::UserExistsErr::UserDoesNotExist(username) => {
                    error!("User {username} didn't exist when being added to a project.");
                    AddMemberError::UserNotFound
                }
                auth::UserExistsErr::PortError(err) => {
                    AddMemberError::from(err.context("Adding a project member"))
                }
            }
        }
    }

    impl From<project::ProjectExistsErr> for RemoveMemberError {
        fn from(value: project::ProjectExistsErr) -> Self {
            match value {
                project::ProjectExistsErr::ProjectDoesNotExist(_) => {
                    RemoveMemberError::ProjectNotFound
                }
                project::ProjectExistsErr::PortError(err) => {
                    RemoveMemberError::from(err.context("Removing a project member"))
                }
            }
        }
    }

    impl From<access::AccessError> for RemoveMemberError {
        fn from(value: access::AccessError) -> Self {
            match value {
                access::AccessError::Unauthenticated | access::AccessError::NotAMember(_) => {
                    RemoveMemberError::CallerNotMember
                }
                access::AccessError::PortError(err) => {
                    RemoveMemberError::from(err.context("Removing a project member"))
                }
            }
        }
    }

    /// Outcome of a successful member removal
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MembershipRemoval {
        MemberRemoved,
        /// The removed member was the last one, so the project and everything it
        /// owned went away with the membership row
        ProjectDeleted,
    }

    pub trait MembershipPort {
        async fn projects_of(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            m_read: &impl driven_ports::MembershipReader,
        ) -> Result<Vec<ProjectSummary>, anyhow::Error>;

        async fn members_of(
            &self,
            caller: &str,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
            p_detect: &impl ProjectDetect,
            m_read: &impl driven_ports::MembershipReader,
        ) -> Result<Vec<String>, MemberListError>;

        async fn add_member(
            &self,
            caller: &str,
            new_member: &str,
            project_id: ProjectId,
            tx_source: &impl Transactable,
            u_detect: &impl DetectUser,
            p_detect: &impl ProjectDetect,
            m_read: &impl driven_ports::MembershipReader,
            m_write: &impl driven_ports::MembershipWriter,
        ) -> Result<(), AddMemberError>;

        async fn remove_member(
            &self,
            caller: &str,
            member: &str,
            project_id: ProjectId,
            tx_source: &impl Transactable,
            p_detect: &impl ProjectDetect,
            m_read: &impl driven_ports::MembershipReader,
            m_write: &impl driven_ports::MembershipWriter,
            p_write: &impl ProjectWriter,
        ) -> Result<MembershipRemoval, RemoveMemberError>;
    }
}

pub struct MembershipService {}

impl driving_ports::MembershipPort for MembershipService {
    async fn projects_of(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        m_read: &impl driven_ports::MembershipReader,
    ) -> Result<Vec<ProjectSummary>, anyhow::Error> {
        let projects_result = m_read.projects_of(username, ext_cxn).await;
        if let Err(ref port_err) = projects_result {
            error!("Project list failure for {username}: {port_err}");
        }

        projects_result.context("Failed fetching a user's projects")
    }

    async fn members_of(
        &self,
        caller: &str,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
        p_detect: &impl ProjectDetect,
        m_read: &impl driven_ports::MembershipReader,
    ) -> Result<Vec<String>, driving_ports::MemberListError> {
        project::verify_project_exists(project_id, &mut *ext_cxn, p_detect).await?;
        access::require_membership(caller, project_id, &mut *ext_cxn, m_read).await?;

        Ok(m_read
            .members_of(project_id, &mut *ext_cxn)
            .await
            .context("Fetching project members")?)
    }

    /// All checks and the insert run on one transaction so a concurrent cascade
    /// delete of the same project serializes against the addition. Either the
    /// project survives with its new member or the whole project is gone; an
    /// orphaned membership row is not a possible outcome.
    async fn add_member(
        &self,
        caller: &str,
        new_member: &str,
        project_id: ProjectId,
        tx_source: &impl Transactable,
        u_detect: &impl DetectUser,
        p_detect: &impl ProjectDetect,
        m_read: &impl driven_ports::MembershipReader,
        m_write: &impl driven_ports::MembershipWriter,
    ) -> Result<(), driving_ports::AddMemberError> {
        let mut tx = tx_source
            .start_transaction()
            .await
            .context("Starting member add transaction")?;

        project::verify_project_exists(project_id, &mut tx, p_detect).await?;
        access::require_membership(caller, project_id, &mut tx, m_read).await?;
        auth::verify_user_exists(new_member, &mut tx, u_detect).await?;

        let already_member = m_read
            .is_member(new_member, project_id, &mut tx)
            .await
            .context("Checking for an existing membership")?;
        if already_member {
            return Err(driving_ports::AddMemberError::AlreadyMember);
        }

        m_write
            .add_member(new_member, project_id, &mut tx)
            .await
            .context("Inserting membership row")?;

        tx.commit().await.context("Committing member add")?;

        info!("User {caller} added {new_member} to project {project_id}");
        Ok(())
    }

    /// The crux of membership consistency: deleting the membership row, counting
    /// what's left, and cascading the project delete all happen inside a single
    /// transaction. Any early return drops the transaction handle, which rolls
    /// everything back, so no intermediate state (a project with zero members)
    /// is ever committed.
    async fn remove_member(
        &self,
        caller: &str,
        member: &str,
        project_id: ProjectId,
        tx_source: &impl Transactable,
        p_detect: &impl ProjectDetect,
        m_read: &impl driven_ports::MembershipReader,
        m_write: &impl driven_ports::MembershipWriter,
        p_write: &impl ProjectWriter,
    ) -> Result<driving_ports::MembershipRemoval, driving_ports::RemoveMemberError> {
        let mut tx = tx_source
            .start_transaction()
            .await
            .context("Starting member removal transaction")?;

        project::verify_project_exists(project_id, &mut tx, p_detect).await?;
        access::require_membership(caller, project_id, &mut tx, m_read).await?;

        let target_is_member = m_read
            .is_member(member, project_id, &mut tx)
            .await
            .context("Checking the target user's membership")?;
        if !target_is_member {
            return Err(driving_ports::RemoveMemberError::TargetNotMember);
        }

        m_write
            .remove_member(member, project_id, &mut tx)
            .await
            .context("Deleting membership row")?;

        let remaining_members = m_read
            .members_of(project_id, &mut tx)
            .await
            .context("Counting remaining members")?;
        let outcome = if remaining_members.is_empty() {
            p_write
                .delete_project(project_id, &mut tx)
                .await
                .context("Cascading project delete after its last member left")?;
            driving_ports::MembershipRemoval::ProjectDeleted
        } else {
            driving_ports::MembershipRemoval::MemberRemoved
        };

        tx.commit().await.context("Committing member removal")?;

        match outcome {
            driving_ports::MembershipRemoval::ProjectDeleted => {
                info!("Project {project_id} deleted along with its last member {member}")
            }
            driving_ports::MembershipRemoval::MemberRemoved => {
                info!("User {caller} removed {member} from project {project_id}")
            }
        }
        Ok(outcome)
    }
}
