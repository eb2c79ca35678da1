use crate::error::{BoardError, Result};
use crate::storage::{self, Storage};
use crate::task::{NewTask, Priority, Project, Task, TaskStatus, TaskUpdate};
use chrono::{Local, NaiveDate, Utc};
use tracing::{debug, info};

/// The task store. Owns the in-memory project and writes it back to storage
/// after every mutation.
pub struct KanbanBoard {
    project: Project,
    storage: Box<dyn Storage>,
}

impl KanbanBoard {
    /// Load the persisted project (or the default one) and run the startup
    /// overdue sweep.
    pub fn open(storage: Box<dyn Storage>) -> Result<Self> {
        let project = storage::load_project(&*storage);
        let mut board = Self { project, storage };
        let swept = board.sweep_overdue(Local::now().date_naive())?;
        info!(tasks = board.project.tasks.len(), swept, "opened board");
        Ok(board)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn tasks(&self) -> &[Task] {
        &self.project.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.project.task(id)
    }

    pub fn len(&self) -> usize {
        self.project.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.project.tasks.is_empty()
    }

    fn save(&mut self) -> Result<()> {
        storage::save_project(&mut *self.storage, &self.project)
    }

    fn next_id(&self) -> String {
        let mut id = Utc::now().timestamp_millis();
        while self.project.task(&id.to_string()).is_some() {
            id += 1;
        }
        id.to_string()
    }

    pub fn add_task(&mut self, data: NewTask) -> Result<&Task> {
        if data.progress > 100 {
            return Err(BoardError::InvalidProgress(data.progress));
        }
        let id = self.next_id();
        let now = Utc::now();
        self.project.tasks.push(data.into_task(id.clone(), now));
        self.project.updated_at = now;
        self.save()?;
        debug!(%id, "added task");
        let idx = self.project.tasks.len() - 1;
        Ok(&self.project.tasks[idx])
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<&Task> {
        if let Some(progress) = update.progress.filter(|p| *p > 100) {
            return Err(BoardError::InvalidProgress(progress));
        }
        let idx = self
            .project
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        let now = Utc::now();
        let task = &mut self.project.tasks[idx];
        update.apply(task);
        task.updated_at = now;
        self.project.updated_at = now;
        self.save()?;
        debug!(%id, "updated task");
        Ok(&self.project.tasks[idx])
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let idx = self
            .project
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        let removed = self.project.tasks.remove(idx);
        self.project.updated_at = Utc::now();
        self.save()?;
        debug!(%id, "deleted task");
        Ok(removed)
    }

    pub fn move_task(&mut self, id: &str, status: TaskStatus) -> Result<&Task> {
        self.update_task(id, TaskUpdate::status(status))
    }

    /// Reclassify every unfinished task whose end date is before `today` as
    /// overdue. Returns how many tasks changed.
    pub fn sweep_overdue(&mut self, today: NaiveDate) -> Result<usize> {
        let now = Utc::now();
        let mut changed = 0;
        for task in &mut self.project.tasks {
            if task.is_past_due(today) && task.status != TaskStatus::Overdue {
                task.status = TaskStatus::Overdue;
                task.updated_at = now;
                changed += 1;
            }
        }
        if changed > 0 {
            self.project.updated_at = now;
            self.save()?;
            info!(changed, "marked tasks overdue");
        }
        Ok(changed)
    }

    /// Set the project name and/or description. Nothing is written when
    /// both are `None`.
    pub fn rename_project(&mut self, name: Option<String>, description: Option<String>) -> Result<()> {
        if name.is_none() && description.is_none() {
            return Ok(());
        }
        if let Some(name) = name {
            self.project.name = name;
        }
        if let Some(description) = description {
            self.project.description = description;
        }
        self.project.updated_at = Utc::now();
        self.save()
    }

    /// Swap in a whole project, e.g. one read from an export file. The
    /// project must pass [`Project::validate`]; the store is untouched if not.
    pub fn replace_project(&mut self, project: Project) -> Result<()> {
        project.validate()?;
        self.project = project;
        self.save()?;
        info!(tasks = self.project.tasks.len(), "replaced project");
        Ok(())
    }
}

/// One board column: the tasks sharing a status, in list order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

impl<'a> Column<'a> {
    pub fn title(&self) -> &'static str {
        self.status.title()
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn urgent(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.priority == Priority::Urgent)
            .count()
    }
}

/// Partition tasks into the four fixed columns (todo, doing, done, overdue).
pub fn group_by_status<'a, I>(tasks: I) -> Vec<Column<'a>>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut columns: Vec<Column<'a>> = TaskStatus::ALL
        .iter()
        .map(|&status| Column {
            status,
            tasks: Vec::new(),
        })
        .collect();
    for task in tasks {
        columns[task.status.index()].tasks.push(task);
    }
    columns
}
