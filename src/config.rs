use crate::error::{BoardError, Result};
use crate::sweep::DEFAULT_SWEEP_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "taskboard";
const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub sweep_interval_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            export_dir: None,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Read the config from `path`, or from the per-user config location
    /// when no path is given. Only an explicit path has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BoardError::io(path, e))?;
        Ok(toml::from_str(&text)?)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Where the project file lives; `override_dir` comes from the command line.
    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".taskboard"))
    }

    pub fn resolve_export_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "sweep_interval_secs = 5\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.sweep_interval(), Duration::from_secs(5));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn full_file_parses() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"data_dir = "/srv/board"
export_dir = "/srv/exports"
sweep_interval_secs = 120
log_level = "debug"
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(
            config,
            Config {
                data_dir: Some(PathBuf::from("/srv/board")),
                export_dir: Some(PathBuf::from("/srv/exports")),
                sweep_interval_secs: 120,
                log_level: "debug".into(),
            }
        );
        assert_eq!(config.resolve_data_dir(None), PathBuf::from("/srv/board"));
        assert_eq!(config.resolve_export_dir(None), PathBuf::from("/srv/exports"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "sweep_interval_secs = \"soon\"").unwrap();
        assert!(matches!(Config::load(Some(path.as_path())), Err(BoardError::Config(_))));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        assert!(matches!(Config::load(Some(path.as_path())), Err(BoardError::Io { .. })));
    }

    #[test]
    fn command_line_dir_wins() {
        let config = Config {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_data_dir(Some(Path::new("/from/cli"))),
            PathBuf::from("/from/cli")
        );
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = Config {
            sweep_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
