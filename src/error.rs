use std::io;
use std::path::{Path, PathBuf};

/// Everything that can stop an invocation
///
/// There is no local recovery: any of these is printed by `main` and the process exits 1.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("usage: {0}")]
    Usage(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("resource exceeded: {0}")]
    ResourceExceeded(String),
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("{}: missing {field} directive", .path.display())]
    MissingField { path: PathBuf, field: &'static str },
    #[error("{} is empty", .0.display())]
    EmptyInput(PathBuf),
    #[error("{count} records is too many, at most 9999 are supported")]
    TooManyRecords { count: usize },
    #[error("declined: {0}")]
    ConfirmationDeclined(String),
    #[error("input closed while waiting for an answer")]
    PromptAborted,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("template error: {0}")]
    Template(#[from] tinytemplate::error::Error),
    #[error("{}: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },
    #[error("serialising records: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl JobError {
    /// An io error on `path`, so the message says which file
    pub fn file(path: &Path) -> impl FnOnce(io::Error) -> JobError + '_ {
        move |source| JobError::File { path: path.to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;
