//! CLI command runner utilities.
//!
//! Async subprocess execution for the secondary usage source and the
//! startup dependency check. Unlike the HTTP client's fixed timeout, the
//! bound here is optional and defaults to none; the asymmetry is inherited
//! behavior, kept configurable at this seam.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::{Result, WidgetError};

/// Flag that suppresses the console window flash on Windows.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Output from a CLI command.
#[derive(Debug)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CliOutput {
    /// Check if command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a CLI command, capturing stdout and stderr.
///
/// A `timeout` of `None` lets the child run unbounded.
///
/// # Errors
///
/// Returns error if:
/// - The executable cannot be located
/// - The command fails to execute
/// - The command exceeds `timeout`, when one is given
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<CliOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WidgetError::ToolNotFound(program.to_string())
        } else {
            WidgetError::ProcessFailed {
                program: program.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let gather = async {
        // Read stdout and stderr concurrently to avoid deadlock.
        // If we read them sequentially and the child writes a lot to one stream,
        // its pipe buffer can fill up while we're waiting on the other stream,
        // causing the child to block and creating a deadlock.
        let stdout_handle = async {
            let mut stdout = String::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(stdout)
        };

        let stderr_handle = async {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                err.read_to_string(&mut stderr).await?;
            }
            Ok::<_, std::io::Error>(stderr)
        };

        let (stdout_result, stderr_result) = tokio::join!(stdout_handle, stderr_handle);
        let stdout = stdout_result?;
        let stderr = stderr_result?;

        let status = child.wait().await?;

        Ok::<_, std::io::Error>(CliOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
        })
    };

    let result = if let Some(limit) = timeout {
        let outcome = tokio::time::timeout(limit, gather).await;
        match outcome {
            Ok(inner) => inner,
            Err(_) => {
                // Timeout - kill the process
                let _ = child.kill().await;
                let _ = child.wait().await;
                return Err(WidgetError::ProcessFailed {
                    program: program.to_string(),
                    reason: format!("timed out after {}s", limit.as_secs()),
                });
            }
        }
    } else {
        gather.await
    };

    result.map_err(|e| WidgetError::ProcessFailed {
        program: program.to_string(),
        reason: e.to_string(),
    })
}

/// Run a CLI command and parse JSON output.
///
/// # Errors
///
/// Returns error if the command fails or output is not valid JSON.
pub async fn run_json_command<T: serde::de::DeserializeOwned>(
    program: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<T> {
    let output = run_command(program, args, timeout).await?;

    if !output.success() {
        return Err(WidgetError::ProcessFailed {
            program: program.to_string(),
            reason: format!("exit code {}: {}", output.exit_code, output.stderr.trim()),
        });
    }

    serde_json::from_str(&output.stdout).map_err(|e| {
        WidgetError::ParseResponse(format!(
            "{}: {}",
            e,
            output.stdout.chars().take(200).collect::<String>()
        ))
    })
}
