use crate::error::BoardError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PROJECT_ID: &str = "1";
pub const DEFAULT_PROJECT_NAME: &str = "Meu Projeto";
pub const DEFAULT_PROJECT_DESCRIPTION: &str = "Sistema de controle de tarefas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Doing,
    Done,
    Overdue,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::Done,
        TaskStatus::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
            TaskStatus::Overdue => "overdue",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::Doing => "Doing",
            TaskStatus::Done => "Done",
            TaskStatus::Overdue => "Overdue",
        }
    }

    pub fn index(self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::Doing => 1,
            TaskStatus::Done => 2,
            TaskStatus::Overdue => 3,
        }
    }

    /// Neighbouring column, clamped at both ends of the board.
    pub fn shifted(self, direction: isize) -> TaskStatus {
        let idx = (self.index() as isize + direction).clamp(0, Self::ALL.len() as isize - 1);
        Self::ALL[idx as usize]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "doing" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            "overdue" => Ok(TaskStatus::Overdue),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: String, // empty when unassigned
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub progress: u8, // percent, 0..=100
}

impl Task {
    /// Whole days between the start and end dates, never negative.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().max(0)
    }

    /// Days left until the end date; negative once it has passed.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days()
    }

    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.end_date < today && self.status != TaskStatus::Done
    }
}

/// Everything a caller supplies when creating a task; the store fills in
/// the identifier and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tags: Vec<String>,
    pub progress: u8,
}

impl NewTask {
    /// A todo task of medium priority spanning `start..=end`.
    pub fn new(title: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            assignee: String::new(),
            start_date,
            end_date,
            tags: Vec::new(),
            progress: 0,
        }
    }

    pub(crate) fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            assignee: self.assignee,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: now,
            updated_at: now,
            tags: self.tags,
            progress: self.progress,
        }
    }
}

/// Field-level partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
    pub progress: Option<u8>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee) = self.assignee {
            task.assignee = assignee;
        }
        if let Some(start_date) = self.start_date {
            task.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            task.end_date = end_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(progress) = self.progress {
            task.progress = progress;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: DEFAULT_PROJECT_ID.to_string(),
            name: DEFAULT_PROJECT_NAME.to_string(),
            description: DEFAULT_PROJECT_DESCRIPTION.to_string(),
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Check the invariants the store relies on for data it did not write
    /// itself: progress within 0..=100 and unique task ids.
    pub fn validate(&self) -> Result<(), BoardError> {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if task.progress > 100 {
                return Err(BoardError::InvalidProgress(task.progress));
            }
            if !seen.insert(task.id.as_str()) {
                return Err(BoardError::DuplicateId(task.id.clone()));
            }
        }
        Ok(())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date `{s}`, expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn status_shift_clamps_at_board_edges() {
        assert_eq!(TaskStatus::Todo.shifted(-1), TaskStatus::Todo);
        assert_eq!(TaskStatus::Todo.shifted(1), TaskStatus::Doing);
        assert_eq!(TaskStatus::Overdue.shifted(1), TaskStatus::Overdue);
        assert_eq!(TaskStatus::Done.shifted(-2), TaskStatus::Todo);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("DOING".parse::<TaskStatus>(), Ok(TaskStatus::Doing));
        assert_eq!("Urgent".parse::<Priority>(), Ok(Priority::Urgent));
        assert!("later".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn task_serializes_with_camel_case_fields() {
        let now = "2025-01-02T03:04:05Z".parse().unwrap();
        let task = NewTask::new("Write docs", date("2025-01-01"), date("2025-01-05"))
            .into_task("42".into(), now);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["startDate"], "2025-01-01");
        assert_eq!(json["endDate"], "2025-01-05");
        assert_eq!(json["status"], "todo");
        assert_eq!(json["priority"], "medium");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn duration_is_never_negative() {
        let now = Utc::now();
        let mut task = NewTask::new("t", date("2025-03-10"), date("2025-03-12"))
            .into_task("1".into(), now);
        assert_eq!(task.duration_days(), 2);
        task.end_date = date("2025-03-01");
        assert_eq!(task.duration_days(), 0);
    }

    #[test]
    fn days_remaining_goes_negative_after_end() {
        let task = NewTask::new("t", date("2025-03-01"), date("2025-03-10"))
            .into_task("1".into(), Utc::now());
        assert_eq!(task.days_remaining(date("2025-03-07")), 3);
        assert_eq!(task.days_remaining(date("2025-03-12")), -2);
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut task = NewTask::new("t", date("2025-03-01"), date("2025-03-10"))
            .into_task("1".into(), Utc::now());
        let update = TaskUpdate {
            assignee: Some("ana".into()),
            progress: Some(40),
            ..TaskUpdate::default()
        };
        update.apply(&mut task);
        assert_eq!(task.assignee, "ana");
        assert_eq!(task.progress, 40);
        assert_eq!(task.title, "t");
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn validate_rejects_progress_over_100() {
        let mut project = Project::default();
        let mut task = NewTask::new("t", date("2025-03-01"), date("2025-03-10"))
            .into_task("1".into(), Utc::now());
        task.progress = 150;
        project.tasks.push(task);
        assert!(matches!(project.validate(), Err(BoardError::InvalidProgress(150))));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut project = Project::default();
        for title in ["a", "b"] {
            let task = NewTask::new(title, date("2025-03-01"), date("2025-03-10"))
                .into_task("9".into(), Utc::now());
            project.tasks.push(task);
        }
        assert!(matches!(project.validate(), Err(BoardError::DuplicateId(id)) if id == "9"));
    }

    #[test]
    fn validate_accepts_well_formed_project() {
        let mut project = Project::default();
        for (id, progress) in [("1", 0), ("2", 100)] {
            let mut task = NewTask::new(id, date("2025-03-01"), date("2025-03-10"))
                .into_task(id.into(), Utc::now());
            task.progress = progress;
            project.tasks.push(task);
        }
        assert!(project.validate().is_ok());
    }

    #[test]
    fn default_project_matches_seed_values() {
        let project = Project::default();
        assert_eq!(project.id, "1");
        assert_eq!(project.name, "Meu Projeto");
        assert!(project.tasks.is_empty());
    }
}
