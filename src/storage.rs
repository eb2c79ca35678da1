use crate::error::{BoardError, Result};
use crate::task::Project;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Key the whole project is stored under.
pub const STORAGE_KEY: &str = "task-management-data";

/// A flat key-value store holding serialized values.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BoardError::io(path, e)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| BoardError::io(&self.dir, e))?;
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes()).map_err(|e| BoardError::io(&path, e))?;
        debug!(path = %path.display(), bytes = value.len(), "wrote storage key");
        Ok(())
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// In-memory storage, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut storage = Self::new();
        storage.entries.insert(key.to_string(), value.to_string());
        storage
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load the stored project. Missing, unreadable, malformed or invalid data
/// falls back to the default project.
pub fn load_project<S: Storage + ?Sized>(storage: &S) -> Project {
    match storage.read(STORAGE_KEY) {
        Ok(Some(data)) => match parse_project(&data) {
            Ok(project) => project,
            Err(err) => {
                warn!(error = %err, "stored project is malformed, starting from defaults");
                Project::default()
            }
        },
        Ok(None) => {
            debug!("no stored project, starting from defaults");
            Project::default()
        }
        Err(err) => {
            warn!(error = %err, "could not read stored project, starting from defaults");
            Project::default()
        }
    }
}

/// Deserialize a project and check its invariants.
pub fn parse_project(data: &str) -> Result<Project> {
    let project: Project = serde_json::from_str(data)?;
    project.validate()?;
    Ok(project)
}

pub fn save_project<S: Storage + ?Sized>(storage: &mut S, project: &Project) -> Result<()> {
    let data = serde_json::to_string(project)?;
    storage.write(STORAGE_KEY, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{parse_date, NewTask};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_project() -> Project {
        let mut project = Project::default();
        let task = NewTask::new(
            "Ship it",
            parse_date("2025-04-01").unwrap(),
            parse_date("2025-04-08").unwrap(),
        )
        .into_task("1000".into(), Utc::now());
        project.tasks.push(task);
        project
    }

    #[test]
    fn missing_key_gives_default_project() {
        let storage = MemoryStorage::new();
        let project = load_project(&storage);
        assert_eq!(project.name, "Meu Projeto");
        assert!(project.tasks.is_empty());
    }

    #[test]
    fn corrupt_data_gives_default_project() {
        let storage = MemoryStorage::with_entry(STORAGE_KEY, "{not json");
        let project = load_project(&storage);
        assert_eq!(project.id, "1");
        assert!(project.tasks.is_empty());
    }

    #[test]
    fn invalid_stored_project_gives_default_project() {
        let mut project = sample_project();
        project.tasks[0].progress = 150;
        let data = serde_json::to_string(&project).unwrap();
        let storage = MemoryStorage::with_entry(STORAGE_KEY, &data);
        let loaded = load_project(&storage);
        assert_eq!(loaded.id, "1");
        assert!(loaded.tasks.is_empty());

        let mut project = sample_project();
        let twin = project.tasks[0].clone();
        project.tasks.push(twin);
        let data = serde_json::to_string(&project).unwrap();
        let storage = MemoryStorage::with_entry(STORAGE_KEY, &data);
        assert!(load_project(&storage).tasks.is_empty());
    }

    #[test]
    fn file_storage_round_trips_project() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(tmp.path().join("nested"));
        let project = sample_project();
        save_project(&mut storage, &project).unwrap();

        assert!(storage.path_for(STORAGE_KEY).exists());
        assert_eq!(load_project(&storage), project);
    }

    #[test]
    fn file_storage_read_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());
        assert!(storage.read("absent").unwrap().is_none());
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
