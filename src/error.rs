use thiserror::Error;

/// Every failure the engine can report. All of these are recoverable by the
/// caller; none leave the store in an unusable state, though `Exhausted`
/// raised mid-write leaves the file truncated (see [`crate::FileSystem::write`]).
#[derive(Error, Debug)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("file or directory already exists: {0}")]
    AlreadyExists(String),
    #[error("{0} is a directory")]
    IsDirectory(String),
    #[error("block pool exhausted")]
    Exhausted,
    #[error("snapshot destination unwritable")]
    Io(#[from] std::io::Error),
}
