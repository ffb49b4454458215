use crate::domain::auth::driven_ports::DetectUser;
use crate::domain::membership::ProjectSummary;
use crate::domain::task::Task;
use crate::domain::{ProjectId, TaskId, membership, project, task};
use crate::external_connections::ExternalConnectivity;
use anyhow::anyhow;
use chrono::Utc;
use std::sync::RwLock;

/// Connectivity represents the "connected" state of a mocked driven port and provides
/// common behavior for returning an error if the port is configured to be in a disconnected state.
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Return an error if connectivity is in a "disconnected" state
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not connect to service!")),
        }
    }
}

/// FakeImplementation is a quick drop-in property that helps mock a function and capture
/// arguments the function is called with. Useful for mocking async trait functions, where
/// popular mocking tools still fall over.
///
/// * [Args] is the argument set captured on each call
/// * [Ret] is the configured return value
pub struct FakeImplementation<Args, Ret> {
    saved_arguments: Vec<Args>,
    return_value: Option<Ret>,
}

impl<Args, Ret> FakeImplementation<Args, Ret> {
    pub fn new() -> FakeImplementation<Args, Ret> {
        FakeImplementation {
            saved_arguments: Vec::new(),
            return_value: None,
        }
    }

    /// Saves arguments from a single invocation of the FakeImplementation
    pub fn save_arguments(&mut self, arguments: Args) {
        self.saved_arguments.push(arguments)
    }

    /// Returns the list of arguments passed on every call to this FakeImplementation
    pub fn calls(&self) -> &[Args] {
        self.saved_arguments.as_slice()
    }
}

#[allow(dead_code)]
impl<Args, Ret> FakeImplementation<Args, Ret>
where
    Ret: Clone,
{
    /// Set the value that should be returned when this FakeImplementation is invoked
    pub fn set_return_value(&mut self, return_value: Ret) {
        self.return_value = Some(return_value)
    }

    /// Retrieve the configured return value for this FakeImplementation
    pub fn return_value(&self) -> Ret {
        match self.return_value {
            None => panic!("Tried to return from a function where the return value wasn't set!"),
            Some(ref ret_val) => ret_val.clone(),
        }
    }
}

impl<Args, Success, Fail> FakeImplementation<Args, Result<Success, Fail>>
where
    Success: Clone,
    Fail: Clone,
{
    /// Set the result that should be returned when this FakeImplementation is invoked.
    /// [Result] does not implement [Clone], so this function can be used when the contained values
    /// can be cloned.
    pub fn set_returned_result(&mut self, return_value: Result<Success, Fail>) {
        match return_value {
            Ok(ok_result) => self.return_value = Some(Ok(ok_result)),
            Err(err) => self.return_value = Some(Err(err)),
        }
    }

    /// Retrieve the result that should be returned when this FakeImplementation is invoked (for [Result]s)
    pub fn return_value_result(&self) -> Result<Success, Fail> {
        match self.return_value {
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(err.clone()),
            None => panic!("Tried to return from a function where the return value wasn't set!"),
        }
    }
}

#[allow(dead_code)]
impl<Args, Success> FakeImplementation<Args, anyhow::Result<Success>>
where
    Success: Clone,
{
    /// Set the result that should be returned when this FakeImplementation is invoked.
    /// This is used in a special case for [anyhow::Result], since [anyhow::Error] does not
    /// implement [Clone].
    pub fn set_returned_anyhow(&mut self, return_value: anyhow::Result<Success>) {
        match return_value {
            Ok(ok_result) => self.return_value = Some(Ok(ok_result)),
            Err(err) => self.return_value = Some(Err(anyhow!(format!("{}", err)))),
        }
    }

    /// Retrieve the result that should be returned when this FakeImplementation is invoked (for [anyhow::Result]s)
    pub fn return_value_anyhow(&self) -> anyhow::Result<Success> {
        match self.return_value {
            None => panic!("Tried to return from a function where the value wasn't set!"),
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(anyhow!(format!("{}", err))),
        }
    }
}

/// In-memory stand-in for the relational store, shared by the membership, project,
/// and task driven ports so cross-store behavior like the last-member cascade can
/// be exercised without a database.
pub struct InMemoryBoard {
    pub users: Vec<String>,
    pub projects: Vec<ProjectSummary>,
    pub memberships: Vec<(String, ProjectId)>,
    pub tasks: Vec<Task>,
    pub connectivity: Connectivity,
    highest_project_id: i32,
    highest_task_id: i32,
}

impl InMemoryBoard {
    pub fn new() -> InMemoryBoard {
        InMemoryBoard {
            users: Vec::new(),
            projects: Vec::new(),
            memberships: Vec::new(),
            tasks: Vec::new(),
            connectivity: Connectivity::Connected,
            highest_project_id: 0,
            highest_task_id: 0,
        }
    }

    pub fn with_users(usernames: &[&str]) -> InMemoryBoard {
        let mut board = InMemoryBoard::new();
        board.users = usernames.iter().map(|name| (*name).to_owned()).collect();
        board
    }

    /// Test setup helper which registers a project along with its initial members
    pub fn add_project(&mut self, name: &str, members: &[&str]) -> ProjectId {
        self.highest_project_id += 1;
        let id = ProjectId::new(self.highest_project_id);
        self.projects.push(ProjectSummary {
            id,
            name: name.to_owned(),
        });
        for member in members {
            self.memberships.push(((*member).to_owned(), id));
        }
        id
    }

    /// Test setup helper which registers a task under an existing project
    pub fn add_task(&mut self, project_id: ProjectId, name: &str) -> TaskId {
        self.highest_task_id += 1;
        let id = TaskId::new(self.highest_task_id);
        self.tasks.push(Task {
            id,
            project_id,
            name: name.to_owned(),
            created_at: Utc::now(),
            priority: None,
            completed: false,
        });
        id
    }

    pub fn new_locked() -> RwLock<InMemoryBoard> {
        RwLock::new(InMemoryBoard::new())
    }
}

impl membership::driven_ports::MembershipReader for RwLock<InMemoryBoard> {
    async fn projects_of(
        &self,
        username: &str,
        _: &mut impl ExternalConnectivity,
    ) -> Result<Vec<ProjectSummary>, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board
            .memberships
            .iter()
            .filter(|(member, _)| member == username)
            .filter_map(|(_, project_id)| {
                board
                    .projects
                    .iter()
                    .find(|project| project.id == *project_id)
                    .cloned()
            })
            .collect())
    }

    async fn members_of(
        &self,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<Vec<String>, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board
            .memberships
            .iter()
            .filter(|(_, member_project)| *member_project == project_id)
            .map(|(member, _)| member.clone())
            .collect())
    }

    async fn is_member(
        &self,
        username: &str,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board
            .memberships
            .iter()
            .any(|(member, member_project)| member == username && *member_project == project_id))
    }
}

impl membership::driven_ports::MembershipWriter for RwLock<InMemoryBoard> {
    async fn add_member(
        &self,
        username: &str,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<(), anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        board.memberships.push((username.to_owned(), project_id));
        Ok(())
    }

    async fn remove_member(
        &self,
        username: &str,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<(), anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        let membership_index = board
            .memberships
            .iter()
            .position(|(member, member_project)| {
                member == username && *member_project == project_id
            });
        if let Some(index) = membership_index {
            board.memberships.remove(index);
        }
        Ok(())
    }
}

impl project::driven_ports::ProjectDetect for RwLock<InMemoryBoard> {
    async fn project_exists(
        &self,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board.projects.iter().any(|project| project.id == project_id))
    }
}

impl project::driven_ports::ProjectWriter for RwLock<InMemoryBoard> {
    async fn create_project(
        &self,
        name: &str,
        _: &mut impl ExternalConnectivity,
    ) -> Result<ProjectId, anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        board.highest_project_id += 1;
        let id = ProjectId::new(board.highest_project_id);
        board.projects.push(ProjectSummary {
            id,
            name: name.to_owned(),
        });
        Ok(id)
    }

    async fn delete_project(
        &self,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<(), anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        board.tasks.retain(|task| task.project_id != project_id);
        board
            .memberships
            .retain(|(_, member_project)| *member_project != project_id);
        board.projects.retain(|project| project.id != project_id);
        Ok(())
    }
}

impl DetectUser for RwLock<InMemoryBoard> {
    async fn user_exists(
        &self,
        username: &str,
        _: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board.users.iter().any(|user| user == username))
    }
}

impl task::driven_ports::TaskReader for RwLock<InMemoryBoard> {
    async fn tasks_of(
        &self,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board
            .tasks
            .iter()
            .filter(|task| task.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn task_by_id(
        &self,
        task_id: TaskId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board.tasks.iter().find(|task| task.id == task_id).cloned())
    }

    async fn belongs_to(
        &self,
        task_id: TaskId,
        project_id: ProjectId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let board = self.read().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        Ok(board
            .tasks
            .iter()
            .any(|task| task.id == task_id && task.project_id == project_id))
    }
}

impl task::driven_ports::TaskWriter for RwLock<InMemoryBoard> {
    async fn add_task(
        &self,
        project_id: ProjectId,
        new_task: &task::NewTask,
        created_at: chrono::DateTime<Utc>,
        _: &mut impl ExternalConnectivity,
    ) -> Result<TaskId, anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        board.highest_task_id += 1;
        let id = TaskId::new(board.highest_task_id);
        board.tasks.push(Task {
            id,
            project_id,
            name: new_task.name.clone(),
            created_at,
            priority: new_task.priority.clone(),
            completed: false,
        });
        Ok(id)
    }

    async fn save_task(
        &self,
        task: &Task,
        _: &mut impl ExternalConnectivity,
    ) -> Result<(), anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        let task_index = board.tasks.iter().position(|stored| stored.id == task.id);
        if let Some(index) = task_index {
            board.tasks[index] = task.clone();
        }
        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: TaskId,
        _: &mut impl ExternalConnectivity,
    ) -> Result<(), anyhow::Error> {
        let mut board = self.write().expect("board rwlock poisoned");
        board.connectivity.blow_up_if_disconnected()?;

        board.tasks.retain(|task| task.id != task_id);
        Ok(())
    }
}
