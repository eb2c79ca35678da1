use crate::error::{BoardError, Result};
use crate::storage::{atomic_write, parse_project};
use crate::task::Project;
use chrono::{NaiveDate, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `<name with whitespace runs as underscores>_<YYYY-MM-DD>.json`
pub fn export_file_name(project_name: &str, date: NaiveDate) -> String {
    let mut name = String::with_capacity(project_name.len());
    let mut in_space = false;
    for c in project_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(c);
            in_space = false;
        }
    }
    format!("{}_{}.json", name, date.format("%Y-%m-%d"))
}

pub fn to_json(project: &Project) -> Result<String> {
    Ok(serde_json::to_string_pretty(project)?)
}

/// Parse an exported project. Out-of-range progress or repeated task ids
/// are rejected.
pub fn from_json(data: &str) -> Result<Project> {
    parse_project(data)
}

/// Date stamped into export file names: the current UTC calendar date.
pub fn export_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// Write the project into `dir` and return the path of the new file.
pub fn export_project(project: &Project, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| BoardError::io(dir, e))?;
    let path = dir.join(export_file_name(&project.name, date));
    let data = to_json(project)?;
    atomic_write(&path, data.as_bytes()).map_err(|e| BoardError::io(&path, e))?;
    info!(path = %path.display(), tasks = project.tasks.len(), "exported project");
    Ok(path)
}

pub fn import_project(path: &Path) -> Result<Project> {
    let data = fs::read_to_string(path).map_err(|e| BoardError::io(path, e))?;
    from_json(&data)
}
