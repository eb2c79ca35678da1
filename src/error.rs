use std::path::PathBuf;

/// Error type for board operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("no task with id {0}")]
    TaskNotFound(String),
    #[error("progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),
    #[error("task id {0} is used more than once")]
    DuplicateId(String),
    #[error("{0}")]
    InvalidDate(String),
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid project data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not parse config: {0}")]
    Config(#[from] toml::de::Error),
}

impl BoardError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BoardError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
