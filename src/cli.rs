use crate::filter::{parse_priority_filter, TaskFilter};
use crate::task::{parse_date, Priority, TaskStatus};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "taskboard", about = "Local Kanban board, timeline and dashboard", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the project file
    #[arg(long, global = true, env = "TASKBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: <config dir>/taskboard/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// Change fields of a task
    Edit(EditArgs),
    /// Move a task to another column
    Move(MoveArgs),
    /// Delete a task
    Delete(IdArg),
    /// Show one task
    Show(IdArg),
    /// List tasks
    List(ListArgs),
    /// Show tasks grouped into board columns
    Board(FilterArgs),
    /// Show dashboard statistics
    Stats(FilterArgs),
    /// Show the timeline
    Gantt(GanttArgs),
    /// Mark tasks past their end date as overdue
    Sweep,
    /// Write the project to a JSON file
    Export(ExportArgs),
    /// Replace the project with one read from a JSON export
    Import(ImportArgs),
    /// Rename the project or change its description
    Rename(RenameArgs),
}

#[derive(Args)]
pub struct IdArg {
    /// Task id
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, value_enum, default_value_t = TaskStatus::Todo)]
    pub status: TaskStatus,
    #[arg(long, value_enum, default_value_t = Priority::Medium)]
    pub priority: Priority,
    #[arg(long, default_value = "")]
    pub assignee: String,
    /// Start date, YYYY-MM-DD (default: today)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    /// End date, YYYY-MM-DD (default: start date)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Progress percentage
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub progress: u8,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task id
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
    /// Replace the tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub progress: Option<u8>,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Task id
    pub id: String,
    /// Target column
    #[arg(value_enum)]
    pub status: TaskStatus,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Case-insensitive text matched against title, description and assignee
    #[arg(long, short = 's', default_value = "")]
    pub search: String,
    /// Priority to keep, or `all`
    // fully qualified so clap passes the parsed Option through untouched
    #[arg(long, short = 'p', value_parser = parse_priority_filter, default_value = "all")]
    pub priority: ::std::option::Option<Priority>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> TaskFilter {
        TaskFilter::new(self.search.clone(), self.priority)
    }
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Only tasks in this column
    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,
}

#[derive(Args)]
pub struct GanttArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Width of the bar area in characters
    #[arg(long, default_value_t = 60)]
    pub width: usize,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Target directory (default: export_dir from config, else the current directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file produced by `export`
    pub file: PathBuf,
}

#[derive(Args)]
pub struct RenameArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_defaults() {
        let cli = Cli::try_parse_from(["taskboard", "add", "Write tests", "--tag", "qa", "--tag", "ci"]).unwrap();
        let Some(Commands::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.title, "Write tests");
        assert_eq!(args.status, TaskStatus::Todo);
        assert_eq!(args.priority, Priority::Medium);
        assert_eq!(args.tags, vec!["qa", "ci"]);
        assert_eq!(args.start, None);
    }

    #[test]
    fn priority_filter_accepts_all() {
        let cli = Cli::try_parse_from(["taskboard", "list", "--priority", "all"]).unwrap();
        let Some(Commands::List(args)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filter.priority, None);

        let cli = Cli::try_parse_from(["taskboard", "list", "-p", "urgent"]).unwrap();
        let Some(Commands::List(args)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filter.priority, Some(Priority::Urgent));
    }

    #[test]
    fn progress_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["taskboard", "add", "t", "--progress", "150"]).is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["taskboard", "add", "t", "--start", "31/12/2025"]).is_err());
    }
}
