use std::fmt;
use std::path::PathBuf;
use std::process::{Command as ProcessCommand, ExitStatus};

use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to run command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// A rendered command line and the directories it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub command: String,
    /// Directory to run in; `None` runs in `run_dir`.
    pub cwd: Option<PathBuf>,
    /// Directory `qs` was invoked from, exported as `QS_RUN_DIR`.
    pub run_dir: PathBuf,
}

impl ShellCommand {
    /// Run the command with `sh -c`, inheriting stdio.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Spawn` if the shell could not be started.
    pub fn run(&self) -> Result<ExitStatus, ExecError> {
        let cwd = self.cwd.as_ref().unwrap_or(&self.run_dir);
        debug!("Running `{}` in {}", self.command, cwd.display());
        let status = ProcessCommand::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(cwd)
            .env("QS_RUN_DIR", &self.run_dir)
            .status()
            .map_err(|e| ExecError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;
        debug!("Command exited with {status}");
        Ok(status)
    }
}

/// The equivalent shell line, as printed by `--dry-run`.
impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cwd = self
            .cwd
            .as_ref()
            .map_or_else(|| ".".to_string(), |cwd| cwd.display().to_string());
        write!(
            f,
            "cd {cwd}; QS_RUN_DIR={}; {}",
            self.run_dir.display(),
            self.command
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dry_run_line() {
        let cmd = ShellCommand {
            command: "echo \"it would work!\"".to_string(),
            cwd: None,
            run_dir: PathBuf::from("/work"),
        };
        assert_eq!(
            cmd.to_string(),
            "cd .; QS_RUN_DIR=/work; echo \"it would work!\""
        );

        let cmd = ShellCommand {
            cwd: Some(PathBuf::from("/repo")),
            ..cmd
        };
        assert_eq!(
            cmd.to_string(),
            "cd /repo; QS_RUN_DIR=/work; echo \"it would work!\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_sets_directory_and_run_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let run_dir = root.join("workdir");
        std::fs::create_dir_all(&run_dir).unwrap();

        let cmd = ShellCommand {
            command: "pwd > out.txt && echo \"$QS_RUN_DIR\" >> out.txt".to_string(),
            cwd: Some(root.clone()),
            run_dir: run_dir.clone(),
        };
        assert!(cmd.run().unwrap().success());

        let out = std::fs::read_to_string(root.join("out.txt")).unwrap();
        assert_eq!(
            out,
            format!("{}\n{}\n", root.display(), run_dir.display())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_exit_status() {
        let temp = TempDir::new().unwrap();
        let cmd = ShellCommand {
            command: "exit 3".to_string(),
            cwd: None,
            run_dir: temp.path().to_path_buf(),
        };
        assert_eq!(cmd.run().unwrap().code(), Some(3));
    }

    #[test]
    fn test_missing_directory_is_a_spawn_error() {
        let cmd = ShellCommand {
            command: "true".to_string(),
            cwd: Some(PathBuf::from("/definitely/not/here")),
            run_dir: PathBuf::from("."),
        };
        assert!(matches!(cmd.run(), Err(ExecError::Spawn { .. })));
    }
}
