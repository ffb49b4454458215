use super::{Count, NewId};
use crate::domain;
use crate::domain::task::{NewTask, Task};
use crate::domain::{ProjectId, TaskId};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};

pub struct DbTaskReader {}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    project_id: i32,
    name: String,
    created_at: DateTime<Utc>,
    priority: Option<String>,
    completed: bool,
}

impl From<TaskRow> for Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: TaskId::new(value.id),
            project_id: ProjectId::new(value.project_id),
            name: value.name,
            created_at: value.created_at,
            priority: value.priority,
            completed: value.completed,
        }
    }
}

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_of(
        &self,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = sqlx::query_as::<_, TaskRow>(
            "SELECT pt.* FROM project_task pt WHERE pt.project_id = $1",
        )
        .bind(project_id.raw())
        .fetch_all(cxn.borrow_connection())
        .await
        .context("Fetching tasks for a project")?
        .into_iter()
        .map(Task::from)
        .collect();

        Ok(tasks)
    }

    async fn task_by_id(
        &self,
        task_id: TaskId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task = sqlx::query_as::<_, TaskRow>("SELECT pt.* FROM project_task pt WHERE pt.id = $1")
            .bind(task_id.raw())
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("Fetching a task by ID")?;

        Ok(task.map(Task::from))
    }

    async fn belongs_to(
        &self,
        task_id: TaskId,
        project_id: ProjectId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let matching_tasks = sqlx::query_as::<_, Count>(
            "SELECT count(*) AS count FROM project_task pt WHERE pt.id = $1 AND pt.project_id = $2",
        )
        .bind(task_id.raw())
        .bind(project_id.raw())
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Checking a task's project")?;

        Ok(matching_tasks.count() > 0)
    }
}

pub struct DbTaskWriter {}

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn add_task(
        &self,
        project_id: ProjectId,
        new_task: &NewTask,
        created_at: DateTime<Utc>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TaskId, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let new_id = sqlx::query_as::<_, NewId>(
            "INSERT INTO project_task(project_id, name, created_at, priority) \
             VALUES ($1, $2, $3, $4) RETURNING project_task.id",
        )
        .bind(project_id.raw())
        .bind(&new_task.name)
        .bind(created_at)
        .bind(new_task.priority.as_deref())
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Inserting a new task")?;

        Ok(TaskId::new(new_id.id))
    }

    async fn save_task(&self, task: &Task, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("UPDATE project_task SET name = $1, priority = $2, completed = $3 WHERE id = $4")
            .bind(&task.name)
            .bind(task.priority.as_deref())
            .bind(task.completed)
            .bind(task.id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Updating a task")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: TaskId,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("DELETE FROM project_task WHERE id = $1")
            .bind(task_id.raw())
            .execute(cxn.borrow_connection())
            .await
            .context("Deleting a task")?;

        Ok(())
    }
}
