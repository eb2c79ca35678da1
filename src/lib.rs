//! A single-user task board: Kanban columns, a Gantt-style timeline and a
//! dashboard over one locally stored project.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod gantt;
pub mod kanban_board;
pub mod logging;
pub mod stats;
pub mod storage;
pub mod sweep;
pub mod task;
pub mod ui;

pub use error::{BoardError, Result};
pub use kanban_board::KanbanBoard;
pub use task::{NewTask, Priority, Project, Task, TaskStatus, TaskUpdate};
