use crate::cli::{
    AddArgs, Cli, Commands, EditArgs, ExportArgs, FilterArgs, GanttArgs, ImportArgs, ListArgs,
    MoveArgs, RenameArgs,
};
use crate::config::Config;
use crate::error::{BoardError, Result};
use crate::export;
use crate::gantt::GanttLayout;
use crate::kanban_board::{group_by_status, KanbanBoard};
use crate::stats::DashboardStats;
use crate::storage::FileStorage;
use crate::task::{NewTask, Priority, Task, TaskStatus, TaskUpdate};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;

/// Run a one-shot command against the board stored in `data_dir`.
pub fn dispatch(command: Commands, cli: &Cli, config: &Config, data_dir: &Path) -> Result<()> {
    let mut board = KanbanBoard::open(Box::new(FileStorage::new(data_dir)))?;
    let today = Local::now().date_naive();
    let json = cli.json;

    match command {
        Commands::Add(args) => cmd_add(&mut board, args, today, json),
        Commands::Edit(args) => cmd_edit(&mut board, args, json),
        Commands::Move(MoveArgs { id, status }) => {
            let task = board.move_task(&id, status)?;
            emit(json, task, || format!("moved {} to {}", task.id, task.status))
        }
        Commands::Delete(arg) => {
            let task = board.delete_task(&arg.id)?;
            emit(json, &task, || format!("deleted {} {}", task.id, task.title))
        }
        Commands::Show(arg) => {
            let task = board
                .task(&arg.id)
                .ok_or_else(|| BoardError::TaskNotFound(arg.id.clone()))?;
            emit(json, task, || format_task_detail(task, today))
        }
        Commands::List(args) => cmd_list(&board, &args, json),
        Commands::Board(args) => cmd_board(&board, &args, today, json),
        Commands::Stats(args) => {
            let filter = args.to_filter();
            let stats = DashboardStats::from_tasks(filter.apply(board.tasks()));
            emit(json, &stats, || format_stats(&stats))
        }
        Commands::Gantt(args) => cmd_gantt(&board, &args, today, json),
        Commands::Sweep => {
            let changed = board.sweep_overdue(today)?;
            emit(json, &json!({ "changed": changed }), || {
                format!("{changed} task(s) marked overdue")
            })
        }
        Commands::Export(args) => cmd_export(&board, &args, config, json),
        Commands::Import(args) => cmd_import(&mut board, &args, json),
        Commands::Rename(RenameArgs { name, description }) => {
            board.rename_project(name, description)?;
            let project = board.project();
            emit(
                json,
                &json!({ "name": project.name, "description": project.description }),
                || format!("project is now {}", project.name),
            )
        }
    }
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn cmd_add(board: &mut KanbanBoard, args: AddArgs, today: NaiveDate, json: bool) -> Result<()> {
    let start = args.start.unwrap_or(today);
    let end = args.end.unwrap_or(start);
    let data = NewTask {
        title: args.title,
        description: args.description,
        status: args.status,
        priority: args.priority,
        assignee: args.assignee,
        start_date: start,
        end_date: end,
        tags: args.tags,
        progress: args.progress,
    };
    let task = board.add_task(data)?;
    emit(json, task, || format!("added {} {}", task.id, task.title))
}

fn cmd_edit(board: &mut KanbanBoard, args: EditArgs, json: bool) -> Result<()> {
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(args.tags)
    };
    let update = TaskUpdate {
        title: args.title,
        description: args.description,
        status: args.status,
        priority: args.priority,
        assignee: args.assignee,
        start_date: args.start,
        end_date: args.end,
        tags,
        progress: args.progress,
    };
    let task = board.update_task(&args.id, update)?;
    emit(json, task, || format!("updated {} {}", task.id, task.title))
}

fn cmd_list(board: &KanbanBoard, args: &ListArgs, json: bool) -> Result<()> {
    let filter = args.filter.to_filter();
    let tasks: Vec<&Task> = filter
        .apply(board.tasks())
        .into_iter()
        .filter(|t| args.status.map_or(true, |s| t.status == s))
        .collect();
    emit(json, &tasks, || {
        if tasks.is_empty() {
            "no tasks".to_string()
        } else {
            tasks
                .iter()
                .map(|t| format_task_line(t))
                .collect::<Vec<_>>()
                .join("\n")
        }
    })
}

fn cmd_board(board: &KanbanBoard, args: &FilterArgs, today: NaiveDate, json: bool) -> Result<()> {
    let filter = args.to_filter();
    let columns = group_by_status(filter.apply(board.tasks()));
    if json {
        let value: Vec<_> = columns
            .iter()
            .map(|c| json!({ "status": c.status, "title": c.title(), "tasks": c.tasks }))
            .collect();
        return emit(true, &value, String::new);
    }

    let mut out = String::new();
    for column in &columns {
        let _ = writeln!(
            out,
            "== {} ({}, {} urgent) ==",
            column.title(),
            column.total(),
            column.urgent()
        );
        for task in &column.tasks {
            let _ = writeln!(
                out,
                "  {}  {}",
                format_task_line(task),
                format_days_remaining(task, today)
            );
        }
    }
    emit(false, &(), || out.trim_end().to_string())
}

fn cmd_gantt(board: &KanbanBoard, args: &GanttArgs, today: NaiveDate, json: bool) -> Result<()> {
    let filter = args.filter.to_filter();
    let layout = GanttLayout::from_tasks(filter.apply(board.tasks()), today);
    emit(json, &layout, || format_gantt(&layout, args.width))
}

fn cmd_export(board: &KanbanBoard, args: &ExportArgs, config: &Config, json: bool) -> Result<()> {
    let dir = config.resolve_export_dir(args.dir.as_deref());
    let path = export::export_project(board.project(), &dir, export::export_date())?;
    emit(json, &json!({ "path": path }), || {
        format!("exported to {}", path.display())
    })
}

fn cmd_import(board: &mut KanbanBoard, args: &ImportArgs, json: bool) -> Result<()> {
    let project = export::import_project(&args.file)?;
    board.replace_project(project)?;
    let count = board.len();
    emit(json, &json!({ "tasks": count }), || {
        format!("imported {count} task(s)")
    })
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "   ",
        Priority::Medium => "!  ",
        Priority::High => "!! ",
        Priority::Urgent => "!!!",
    }
}

pub fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "[{}] {} {} ({}) {}..{} {}%",
        task.id,
        priority_marker(task.priority),
        task.title,
        task.status,
        task.start_date,
        task.end_date,
        task.progress
    );
    if !task.assignee.is_empty() {
        let _ = write!(line, " @{}", task.assignee);
    }
    for tag in &task.tags {
        let _ = write!(line, " #{tag}");
    }
    line
}

pub fn format_days_remaining(task: &Task, today: NaiveDate) -> String {
    if task.status == TaskStatus::Done {
        return String::new();
    }
    match task.days_remaining(today) {
        0 => "due today".to_string(),
        1 => "1 day left".to_string(),
        n if n > 1 => format!("{n} days left"),
        -1 => "1 day late".to_string(),
        n => format!("{} days late", -n),
    }
}

pub fn format_task_detail(task: &Task, today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", task.title);
    let _ = writeln!(out, "  id:          {}", task.id);
    let _ = writeln!(out, "  status:      {}", task.status);
    let _ = writeln!(out, "  priority:    {}", task.priority);
    if !task.assignee.is_empty() {
        let _ = writeln!(out, "  assignee:    {}", task.assignee);
    }
    let _ = writeln!(
        out,
        "  schedule:    {} .. {} ({} days) {}",
        task.start_date,
        task.end_date,
        task.duration_days(),
        format_days_remaining(task, today)
    );
    let _ = writeln!(out, "  progress:    {}%", task.progress);
    if !task.tags.is_empty() {
        let _ = writeln!(out, "  tags:        {}", task.tags.join(", "));
    }
    let _ = writeln!(out, "  created:     {}", task.created_at.to_rfc3339());
    let _ = writeln!(out, "  updated:     {}", task.updated_at.to_rfc3339());
    if !task.description.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", task.description);
    }
    out.trim_end().to_string()
}

pub fn format_stats(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tasks:        {}", stats.total);
    let _ = writeln!(
        out,
        "completed:    {} ({:.1}%)",
        stats.completed, stats.completion_rate
    );
    let _ = writeln!(out, "in progress:  {}", stats.in_progress);
    let _ = writeln!(out, "overdue:      {}", stats.overdue);
    let _ = writeln!(out, "urgent:       {}", stats.urgent);
    let _ = writeln!(out, "assignees:    {}", stats.assignees);
    let _ = writeln!(out, "avg progress: {:.1}%", stats.avg_progress);
    let _ = writeln!(out);
    let _ = writeln!(out, "by status:");
    for status in TaskStatus::ALL {
        let count = stats.by_status.get(status);
        let _ = writeln!(
            out,
            "  {:<8} {:>3} ({:.1}%)",
            status.as_str(),
            count,
            stats.percent_of(count)
        );
    }
    let _ = writeln!(out, "by priority:");
    for priority in Priority::ALL {
        let count = stats.by_priority.get(priority);
        let _ = writeln!(
            out,
            "  {:<8} {:>3} ({:.1}%)",
            priority.as_str(),
            count,
            stats.percent_of(count)
        );
    }
    out.trim_end().to_string()
}

const GANTT_LABEL_WIDTH: usize = 24;

pub fn format_gantt(layout: &GanttLayout, width: usize) -> String {
    if layout.is_empty() {
        return "no tasks to show".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<label$} {} .. {} ({} days)",
        "",
        layout.start,
        layout.end,
        layout.total_days,
        label = GANTT_LABEL_WIDTH
    );
    for row in &layout.rows {
        let (start, len) = row.cells(width);
        let fill = if row.status == TaskStatus::Done { '=' } else { '#' };
        let mut bar = String::with_capacity(width);
        bar.extend(std::iter::repeat(' ').take(start));
        bar.extend(std::iter::repeat(fill).take(len));
        bar.extend(std::iter::repeat(' ').take(width - start - len));
        let label: String = row.title.chars().take(GANTT_LABEL_WIDTH).collect();
        let _ = writeln!(
            out,
            "{:<label_w$} |{}| {}d",
            label,
            bar,
            row.duration_days,
            label_w = GANTT_LABEL_WIDTH
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::parse_date;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn sample_task() -> Task {
        let mut t = NewTask::new("Review PR", date("2025-02-01"), date("2025-02-05"));
        t.priority = Priority::High;
        t.assignee = "ana".into();
        t.tags = vec!["code".into()];
        t.progress = 60;
        t.into_task("17".into(), Utc::now())
    }

    #[test]
    fn task_line_shows_key_fields() {
        let line = format_task_line(&sample_task());
        assert_eq!(
            line,
            "[17] !!  Review PR (todo) 2025-02-01..2025-02-05 60% @ana #code"
        );
    }

    #[test]
    fn days_remaining_wording() {
        let task = sample_task();
        assert_eq!(format_days_remaining(&task, date("2025-02-05")), "due today");
        assert_eq!(format_days_remaining(&task, date("2025-02-04")), "1 day left");
        assert_eq!(format_days_remaining(&task, date("2025-02-01")), "4 days left");
        assert_eq!(format_days_remaining(&task, date("2025-02-06")), "1 day late");
        assert_eq!(format_days_remaining(&task, date("2025-02-09")), "4 days late");
    }

    #[test]
    fn stats_text_lists_every_bucket() {
        let tasks = vec![sample_task()];
        let text = format_stats(&DashboardStats::from_tasks(&tasks));
        assert!(text.contains("tasks:        1"));
        assert!(text.contains("todo"));
        assert!(text.contains("overdue"));
        assert!(text.contains("high       1 (100.0%)"));
    }

    #[test]
    fn gantt_text_draws_bars_within_width() {
        let tasks = vec![sample_task()];
        let layout = GanttLayout::from_tasks(&tasks, date("2025-01-01"));
        let text = format_gantt(&layout, 30);
        let row = text.lines().nth(1).unwrap();
        let bar = row.split('|').nth(1).unwrap();
        assert_eq!(bar.chars().count(), 30);
        assert!(bar.contains('#'));
        assert!(row.ends_with("4d"));
    }

    #[test]
    fn empty_gantt_says_so() {
        let layout = GanttLayout::from_tasks(std::iter::empty(), date("2025-01-01"));
        assert_eq!(format_gantt(&layout, 30), "no tasks to show");
    }
}
