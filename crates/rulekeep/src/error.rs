use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulekeepError {
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("File operation error: {0}")]
    FileOps(#[from] FileOpsError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Validation errors. These are detected before a rule ever reaches the
/// scheduler or the preview path.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rules file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rules JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid rule '{id}': {reason}")]
    Invalid { id: String, reason: String },

    #[error("Invalid regex '{pattern}' in rule '{id}': {reason}")]
    InvalidRegex {
        id: String,
        pattern: String,
        reason: String,
    },
}

/// A failed or rejected step inside one file's action pipeline. These are
/// recovered locally: the pipeline for that file stops, other files continue.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("File operation failed: {0}")]
    FileOps(#[from] FileOpsError),

    #[error("Permanent deletion is disabled in settings")]
    PermanentDeleteDisabled,

    #[error("OCR is disabled in settings")]
    OcrDisabled,

    #[error("Script exited with status {code}: {command}")]
    ScriptFailed { command: String, code: i32 },

    #[error("Destination pattern resolved to an empty path: '{pattern}'")]
    EmptyDestination { pattern: String },
}

#[derive(Error, Debug)]
pub enum FileOpsError {
    #[error("Failed to read metadata for '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file from '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete '{path}': {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move '{path}' to trash: {message}")]
    Trash { path: PathBuf, message: String },

    #[error("Failed to archive '{path}': {message}")]
    Archive { path: PathBuf, message: String },

    #[error("Failed to unarchive '{path}': {message}")]
    Unarchive { path: PathBuf, message: String },

    #[error("Failed to run command '{command}': {source}")]
    Script {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{target}': {source}")]
    Launch {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No available name for '{path}' after exhausting suffixes")]
    ConflictExhausted { path: PathBuf },

    #[error("Operation '{operation}' is not supported by this backend")]
    Unsupported { operation: String },
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, RulekeepError>;
