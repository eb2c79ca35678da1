use crate::task::{Priority, Task};

/// Free-text search combined with an optional exact priority match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub priority: Option<Priority>, // None = all priorities
}

impl TaskFilter {
    pub fn new(search: impl Into<String>, priority: Option<Priority>) -> Self {
        Self {
            search: search.into(),
            priority,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.priority.is_some()
    }

    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.search.to_lowercase();
        matches_search(task, &needle) && self.priority.map_or(true, |p| task.priority == p)
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let needle = self.search.to_lowercase();
        tasks
            .iter()
            .filter(|t| matches_search(t, &needle) && self.priority.map_or(true, |p| t.priority == p))
            .collect()
    }

    /// Step through all priorities, then back to none.
    pub fn cycle_priority(&mut self) {
        self.priority = match self.priority {
            None => Some(Priority::Urgent),
            Some(Priority::Urgent) => Some(Priority::High),
            Some(Priority::High) => Some(Priority::Medium),
            Some(Priority::Medium) => Some(Priority::Low),
            Some(Priority::Low) => None,
        };
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.assignee.to_lowercase().contains(needle)
}

/// Parses a priority filter argument; `all` means no filter.
pub fn parse_priority_filter(s: &str) -> Result<Option<Priority>, String> {
    if s.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{parse_date, NewTask};
    use chrono::Utc;

    fn task(id: &str, title: &str, description: &str, assignee: &str, priority: Priority) -> Task {
        let mut t = NewTask::new(
            title,
            parse_date("2025-01-01").unwrap(),
            parse_date("2025-01-02").unwrap(),
        );
        t.description = description.into();
        t.assignee = assignee.into();
        t.priority = priority;
        t.into_task(id.into(), Utc::now())
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "Fix login bug", "", "Ana", Priority::Urgent),
            task("2", "Write docs", "Cover the LOGIN flow", "", Priority::Low),
            task("3", "Plan sprint", "", "Bruno", Priority::High),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let tasks = sample();
        let filter = TaskFilter::default();
        assert!(!filter.is_active());
        assert_eq!(ids(&filter.apply(&tasks)), vec!["1", "2", "3"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let tasks = sample();
        assert_eq!(ids(&TaskFilter::new("login", None).apply(&tasks)), vec!["1", "2"]);
        assert_eq!(ids(&TaskFilter::new("bRuNo", None).apply(&tasks)), vec!["3"]);
        assert!(TaskFilter::new("nothing", None).apply(&tasks).is_empty());
    }

    #[test]
    fn search_and_priority_combine() {
        let tasks = sample();
        let filter = TaskFilter::new("login", Some(Priority::Low));
        assert_eq!(ids(&filter.apply(&tasks)), vec!["2"]);
        assert!(filter.matches(&tasks[1]));
        assert!(!filter.matches(&tasks[0]));
    }

    #[test]
    fn priority_cycle_returns_to_all() {
        let mut filter = TaskFilter::default();
        let mut seen = Vec::new();
        for _ in 0..5 {
            filter.cycle_priority();
            seen.push(filter.priority);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen.last(), Some(&None));
        assert!(seen.contains(&Some(Priority::Medium)));
    }

    #[test]
    fn parse_all_means_no_filter() {
        assert_eq!(parse_priority_filter("all"), Ok(None));
        assert_eq!(parse_priority_filter("high"), Ok(Some(Priority::High)));
        assert!(parse_priority_filter("whenever").is_err());
    }
}
