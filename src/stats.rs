use crate::task::{Priority, Task, TaskStatus};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub doing: usize,
    pub done: usize,
    pub overdue: usize,
}

impl StatusCounts {
    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::Doing => self.doing,
            TaskStatus::Done => self.done,
            TaskStatus::Overdue => self.overdue,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub urgent: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Urgent => self.urgent,
        }
    }
}

/// Aggregate numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub urgent: usize,
    pub completion_rate: f64,
    pub avg_progress: f64,
    pub assignees: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
}

impl DashboardStats {
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut by_status = StatusCounts::default();
        let mut by_priority = PriorityCounts::default();
        let mut assignees = HashSet::new();
        let mut progress_sum: u64 = 0;
        let mut total = 0;

        for task in tasks {
            total += 1;
            progress_sum += u64::from(task.progress);
            match task.status {
                TaskStatus::Todo => by_status.todo += 1,
                TaskStatus::Doing => by_status.doing += 1,
                TaskStatus::Done => by_status.done += 1,
                TaskStatus::Overdue => by_status.overdue += 1,
            }
            match task.priority {
                Priority::Low => by_priority.low += 1,
                Priority::Medium => by_priority.medium += 1,
                Priority::High => by_priority.high += 1,
                Priority::Urgent => by_priority.urgent += 1,
            }
            if !task.assignee.is_empty() {
                assignees.insert(task.assignee.as_str());
            }
        }

        let (completion_rate, avg_progress) = if total > 0 {
            (
                by_status.done as f64 / total as f64 * 100.0,
                progress_sum as f64 / total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            total,
            completed: by_status.done,
            in_progress: by_status.doing,
            overdue: by_status.overdue,
            urgent: by_priority.urgent,
            completion_rate,
            avg_progress,
            assignees: assignees.len(),
            by_status,
            by_priority,
        }
    }

    /// Share of `count` in the total, as a percentage.
    pub fn percent_of(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{parse_date, NewTask};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn task(status: TaskStatus, priority: Priority, assignee: &str, progress: u8) -> Task {
        let mut t = NewTask::new(
            "t",
            parse_date("2025-01-01").unwrap(),
            parse_date("2025-01-31").unwrap(),
        );
        t.status = status;
        t.priority = priority;
        t.assignee = assignee.into();
        t.progress = progress;
        t.into_task("x".into(), Utc::now())
    }

    #[test]
    fn empty_list_has_zero_rates() {
        let stats = DashboardStats::from_tasks(std::iter::empty());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.avg_progress, 0.0);
        assert_eq!(stats.percent_of(0), 0.0);
    }

    #[test]
    fn counts_and_rates() {
        let tasks = vec![
            task(TaskStatus::Done, Priority::Urgent, "ana", 100),
            task(TaskStatus::Doing, Priority::High, "bia", 50),
            task(TaskStatus::Todo, Priority::Urgent, "ana", 0),
            task(TaskStatus::Overdue, Priority::Low, "", 10),
        ];
        let stats = DashboardStats::from_tasks(&tasks);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.urgent, 2);
        assert_eq!(stats.completion_rate, 25.0);
        assert_eq!(stats.avg_progress, 40.0);
        assert_eq!(stats.assignees, 2);
        assert_eq!(
            stats.by_status,
            StatusCounts {
                todo: 1,
                doing: 1,
                done: 1,
                overdue: 1
            }
        );
        assert_eq!(stats.by_priority.get(Priority::Urgent), 2);
        assert_eq!(stats.by_priority.get(Priority::Medium), 0);
        assert_eq!(stats.percent_of(stats.by_priority.urgent), 50.0);
    }

    #[test]
    fn completion_rate_stays_within_bounds() {
        for done in 0..=5 {
            let tasks: Vec<Task> = (0..5)
                .map(|i| {
                    let status = if i < done { TaskStatus::Done } else { TaskStatus::Todo };
                    task(status, Priority::Medium, "", 0)
                })
                .collect();
            let rate = DashboardStats::from_tasks(&tasks).completion_rate;
            assert!((0.0..=100.0).contains(&rate), "rate {rate} out of range");
        }
    }
}
