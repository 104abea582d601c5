use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::FileOpsError;

/// Script execution seam for `shellScript` conditions and `runScript`
/// actions. Commands run unsandboxed; rules are trusted input.
pub trait ScriptRunner: Send + Sync {
    /// Runs the command with the file's current path appended as `$1` and
    /// returns the exit code. A signal-terminated process reports -1.
    fn run(&self, command: &str, file: &Path) -> std::result::Result<i32, FileOpsError>;
}

/// Runs commands through `sh -c`, mirroring how a user would invoke them
/// from a terminal.
pub struct ShellScriptRunner;

impl ScriptRunner for ShellScriptRunner {
    fn run(&self, command: &str, file: &Path) -> std::result::Result<i32, FileOpsError> {
        debug!("Running script: {}", command);

        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .arg("sh")
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| FileOpsError::Script {
                command: command.to_string(),
                source: e,
            })?;

        Ok(status.code().unwrap_or(-1))
    }
}
