use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Hard cap on one report invocation.
pub const SAMPLE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

/// Source of raw peer reports, injectable so the monitor loop can be
/// driven by scripted text in tests.
#[async_trait]
pub trait PeerSource: Send + Sync {
    async fn sample(&self) -> Result<String, CommandError>;
}

/// Production source: `wg show <interface>` under [`SAMPLE_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct WgShowCommand {
    program: PathBuf,
    interface: String,
}

impl WgShowCommand {
    pub fn new(program: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            interface: interface.into(),
        }
    }

    fn describe(&self) -> String {
        format!("{} show {}", self.program.display(), self.interface)
    }
}

#[async_trait]
impl PeerSource for WgShowCommand {
    async fn sample(&self) -> Result<String, CommandError> {
        let output = tokio::time::timeout(
            SAMPLE_TIMEOUT,
            Command::new(&self.program)
                .arg("show")
                .arg(&self.interface)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CommandError::TimedOut {
            command: self.describe(),
            timeout: SAMPLE_TIMEOUT,
        })?
        .map_err(|source| CommandError::Launch {
            command: self.describe(),
            source,
        })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: self.describe(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_trimmed_stdout() {
        let source = WgShowCommand::new("/bin/echo", "wg0");
        assert_eq!(source.sample().await.unwrap(), "show wg0");
    }

    #[tokio::test]
    async fn missing_program_is_a_launch_error() {
        let source = WgShowCommand::new("/nonexistent/wg", "wg0");
        assert!(matches!(
            source.sample().await,
            Err(CommandError::Launch { .. })
        ));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure() {
        let source = WgShowCommand::new("/bin/false", "wg0");
        assert!(matches!(
            source.sample().await,
            Err(CommandError::Failed { .. })
        ));
    }
}
