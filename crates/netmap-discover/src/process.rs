//! System utility invocation.
//!
//! Utilities run under `tokio::process::Command` so they never block the
//! async runtime.

use std::process::Output;

use tokio::process::Command;

use crate::error::{DiscoverError, Result};

/// Run `program args...` and collect its output, whatever the exit status.
pub async fn run(program: &str, args: &[String]) -> Result<Output> {
    Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| DiscoverError::CommandLaunch {
            command: program.to_string(),
            source,
        })
}

/// Run and require a zero exit status; returns stdout (lossy UTF-8).
pub async fn run_checked(program: &str, args: &[String]) -> Result<String> {
    let output = run(program, args).await?;

    if !output.status.success() {
        return Err(DiscoverError::CommandFailed {
            command: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let err = run("netmap-no-such-binary", &[]).await.unwrap_err();
        assert!(matches!(err, DiscoverError::CommandLaunch { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let err = run_checked("sh", &["-c".to_string(), "echo boom >&2; exit 3".to_string()])
            .await
            .unwrap_err();
        match err {
            DiscoverError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stdout_is_returned() {
        let out = run_checked("sh", &["-c".to_string(), "echo hello".to_string()])
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }
}
