use crate::domain::membership::driven_ports::MembershipReader;
use crate::domain::project::driven_ports::ProjectDetect;
use crate::domain::{ProjectId, TaskId, access, project};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    /// Set server-side when the task is created
    pub created_at: DateTime<Utc>,
    pub priority: Option<String>,
    pub completed: bool,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTask {
    pub name: String,
    pub priority: Option<String>,
}

/// Partial update where every field records whether the request supplied it.
/// `priority: Some(None)` clears the stored priority while `None` leaves it
/// untouched, so an explicitly-set falsy value (`completed: false`, a null
/// priority) is never mistaken for an omitted field.
#[derive(Default)]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub priority: Option<Option<String>>,
    pub completed: Option<bool>,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader: Sync {
        async fn tasks_of(
            &self,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;

        async fn task_by_id(
            &self,
            task_id: TaskId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        /// The authority on whether a task lives inside a given project
        async fn belongs_to(
            &self,
            task_id: TaskId,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    pub trait TaskWriter: Sync {
        async fn add_task(
            &self,
            project_id: ProjectId,
            new_task: &NewTask,
            created_at: DateTime<Utc>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TaskId, anyhow::Error>;

        /// Writes a full task row back. Used after a read-merge so unrelated
        /// fields keep their stored values.
        async fn save_task(
            &self,
            task: &Task,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete_task(
            &self,
            task_id: TaskId,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("the requested project does not exist")]
        ProjectNotFound,
        #[error("the caller does not have access to the project")]
        CallerNotMember,
        #[error("the requested task does not exist in the project")]
        TaskNotInProject,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    impl From<project::ProjectExistsErr> for TaskError {
        fn from(value: project::ProjectExistsErr) -> Self {
            match value {
                project::ProjectExistsErr::ProjectDoesNotExist(_) => TaskError::ProjectNotFound,
                project::ProjectExistsErr::PortError(err) => {
                    TaskError::from(err.context("Accessing project tasks"))
                }
            }
        }
    }

    impl From<access::AccessError> for TaskError {
        fn from(value: access::AccessError) -> Self {
            match value {
                access::AccessError::Unauthenticated | access::AccessError::NotAMember(_) => {
                    TaskError::CallerNotMember
                }
                access::AccessError::PortError(err) => {
                    TaskError::from(err.context("Accessing project tasks"))
                }
            }
        }
    }

    pub trait TaskPort {
        async fn tasks_in_project(
            &self,
            caller: &str,
            project_id: ProjectId,
            ext_cxn: &mut impl ExternalConnectivity,
            p_detect: &impl ProjectDetect,
            m_read: &impl MembershipReader,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;

        async fn add_task(
            &self,
            caller: &str,
            project_id: ProjectId,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            p_detect: &impl ProjectDetect,
            m_read: &impl MembershipReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TaskId, TaskError>;

        async fn update_task(
            &self,
            caller: &str,
            project_id: ProjectId,
            task_id: TaskId,
            update: &TaskUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
            p_detect: &impl ProjectDetect,
            m_read: &impl MembershipReader,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;

        async fn delete_task(
            &self,
            caller: &str,
            project_id: ProjectId,
            task_id: TaskId,
            ext_cxn: &mut impl ExternalConnectivity,
            p_detect: &impl ProjectDetect,
            m_read: &impl MembershipReader,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_in_project(
        &self,
        caller: &str,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
        p_detect: &impl ProjectDetect,
        m_read: &impl MembershipReader,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Vec<Task>, driving_ports::TaskError> {
        project::verify_project_exists(project_id, &mut *ext_cxn, p_detect).await?;
        access::require_membership(caller, project_id, &mut *ext_cxn, m_read).await?;

        let tasks = task_read
            .tasks_of(project_id, &mut *ext_cxn)
            .await
            .context("Fetching a project's tasks")?;
        Ok(tasks)
    }

    async fn add_task(
        &self,
        caller: &str,
        project_id: ProjectId,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        p_detect: &impl ProjectDetect,
        m_read: &impl MembershipReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<TaskId, driving_ports::TaskError> {
        project::verify_project_exists(project_id, &mut *ext_cxn, p_detect).await?;
        access::require_membership(caller, project_id, &mut *ext_cxn, m_read).await?;

        let task_id = task_write
            .add_task(project_id, new_task, Utc::now(), &mut *ext_cxn)
            .await
            .context("Inserting a new task")?;

        info!("User {caller} added task {task_id} to project {project_id}");
        Ok(task_id)
    }

    /// Read-then-merge-then-write. Fields absent from [update] keep their stored
    /// values; concurrent updates to the same task resolve as last-writer-wins.
    async fn update_task(
        &self,
        caller: &str,
        project_id: ProjectId,
        task_id: TaskId,
        update: &TaskUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
        p_detect: &impl ProjectDetect,
        m_read: &impl MembershipReader,
        task_read: &impl driven_ports::TaskReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), driving_ports::TaskError> {
        project::verify_project_exists(project_id, &mut *ext_cxn, p_detect).await?;
        access::require_membership(caller, project_id, &mut *ext_cxn, m_read).await?;

        let task_in_project = task_read
            .belongs_to(task_id, project_id, &mut *ext_cxn)
            .await
            .context("Checking a task's project before update")?;
        if !task_in_project {
            return Err(driving_ports::TaskError::TaskNotInProject);
        }

        let Some(mut task) = task_read
            .task_by_id(task_id, &mut *ext_cxn)
            .await
            .context("Reading a task before update")?
        else {
            return Err(driving_ports::TaskError::TaskNotInProject);
        };

        if let Some(ref name) = update.name {
            task.name = name.clone();
        }
        if let Some(ref priority) = update.priority {
            task.priority = priority.clone();
        }
        if let Some(completed) = update.completed {
            task.completed = completed;
        }

        task_write
            .save_task(&task, &mut *ext_cxn)
            .await
            .context("Writing back an updated task")?;
        Ok(())
    }

    async fn delete_task(
        &self,
        caller: &str,
        project_id: ProjectId,
        task_id: TaskId,
        ext_cxn: &mut impl ExternalConnectivity,
        p_detect: &impl ProjectDetect,
        m_read: &impl MembershipReader,
        task_read: &impl driven_ports::TaskReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), driving_ports::TaskError> {
        project::verify_project_exists(project_id, &mut *ext_cxn, p_detect).await?;
        access::require_membership(caller, project_id, &mut *ext_cxn, m_read).await?;

        let task_in_project = task_read
            .belongs_to(task_id, project_id, &mut *ext_cxn)
            .await
            .context("Checking a task's project before delete")?;
        if !task_in_project {
            return Err(driving_ports::TaskError::TaskNotInProject);
        }

        task_write
            .delete_task(task_id, &mut *ext_cxn)
            .await
            .context("Deleting a task")?;

        info!("User {caller} deleted task {task_id} from project {project_id}");
        Ok(())
    }
}
