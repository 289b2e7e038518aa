//! Running external tools.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::{NetconfError, Result};

/// Runs a program and returns its combined stdout and stderr.
///
/// Spawn failures and non-zero exit statuses are both `CommandFailed`.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<String>;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<String> {
        let command = describe(program, args);
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| NetconfError::CommandFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!("{}:\n{}", command, combined.trim_end());

        if !output.status.success() {
            return Err(NetconfError::CommandFailed {
                command,
                message: format!("{}: {}", output.status, combined.trim()),
            });
        }

        Ok(combined)
    }
}

/// Render a command line for logs and errors.
pub fn describe(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let args = vec!["hostapd".to_string(), "stop".to_string()];
        assert_eq!(
            describe(Path::new("/usr/sbin/service"), &args),
            "/usr/sbin/service hostapd stop"
        );
    }

    #[tokio::test]
    async fn test_captures_output() {
        let out = SystemRunner
            .run(Path::new("sh"), &["-c".to_string(), "echo out; echo err >&2".to_string()])
            .await
            .unwrap();
        assert_eq!(out, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let err = SystemRunner
            .run(Path::new("sh"), &["-c".to_string(), "echo nope; exit 3".to_string()])
            .await
            .unwrap_err();
        match err {
            NetconfError::CommandFailed { command, message } => {
                assert!(command.starts_with("sh -c"));
                assert!(message.contains("nope"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let err = SystemRunner
            .run(Path::new("/nonexistent/hotplug-netconf-tool"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, NetconfError::CommandFailed { .. }));
    }
}
