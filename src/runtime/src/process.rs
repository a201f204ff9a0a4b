//! Batch child-process supervision.
//!
//! The child inherits the local stdio and is waited on synchronously.
//! Waiting is the only suspension point and the only place an interrupt
//! is turned into termination: SIGTERM, a grace period, then SIGKILL. The
//! child is always reaped before a result is reported.

use std::future::Future;
use std::time::Duration;

use tokio::process::{Child, Command};
use wft_runner_core::error::{Result, RunnerError};
use wft_runner_core::{BatchCommand, RunResult, FAILURE_EXIT};

/// Time a terminated child gets to exit before it is killed.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(10);

/// Spawn `command` and wait for it, terminating it if `interrupt` fires first.
pub async fn run_to_completion<F>(command: &BatchCommand, interrupt: F) -> Result<RunResult>
where
    F: Future<Output = ()>,
{
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| RunnerError::Engine(format!("failed to launch `{}`: {}", command.program, e)))?;

    tracing::debug!(pid = ?child.id(), "Launched container process");

    tokio::select! {
        status = child.wait() => {
            let status = status?;
            // No code means the child died from a signal.
            let exit_code = status.code().unwrap_or(FAILURE_EXIT);
            Ok(RunResult::completed(exit_code))
        }
        _ = interrupt => {
            terminate(&mut child, TERMINATE_GRACE).await?;
            tracing::warn!("Workflow tests terminated by user");
            Ok(RunResult::interrupted())
        }
    }
}

/// Ask the child to stop, escalating to a kill after `grace`.
async fn terminate(child: &mut Child, grace: Duration) -> Result<()> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: pid belongs to a child we spawned and have not reaped yet.
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return Ok(());
        }
        tracing::debug!(pid, "Child ignored SIGTERM, killing");
    }

    #[cfg(not(unix))]
    let _ = grace;

    child.kill().await?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn shell(script: &str) -> BatchCommand {
        BatchCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[tokio::test]
    async fn test_exit_code_zero() {
        let result = run_to_completion(&shell("exit 0"), std::future::pending()).await.unwrap();
        assert_eq!(result, RunResult::completed(0));
    }

    #[tokio::test]
    async fn test_exit_code_passed_through() {
        let result = run_to_completion(&shell("exit 7"), std::future::pending()).await.unwrap();
        assert_eq!(result.exit_code, 7);
        assert!(!result.interrupted);
    }

    #[tokio::test]
    async fn test_interrupt_terminates_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("child.pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());

        // Interrupt once the child has recorded its pid.
        let watched = pid_file.clone();
        let interrupt = async move {
            loop {
                if let Ok(pid) = std::fs::read_to_string(&watched) {
                    if pid.ends_with('\n') {
                        break;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };

        let started = Instant::now();
        let result = run_to_completion(&shell(&script), interrupt).await.unwrap();

        assert!(result.interrupted);
        assert_eq!(result.exit_code, FAILURE_EXIT);
        assert!(started.elapsed() < Duration::from_secs(5));

        let pid: i32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        // SAFETY: signal 0 only checks for existence.
        let alive = unsafe { libc::kill(pid, 0) } == 0;
        assert!(!alive, "child {pid} still running");
    }

    #[tokio::test]
    async fn test_interrupt_escalates_when_term_is_ignored() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .unwrap();
        // Let the shell install its trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        terminate(&mut child, Duration::from_millis(200)).await.unwrap();
        let status = child.try_wait().unwrap();
        assert!(status.is_some());
    }

    #[tokio::test]
    async fn test_missing_program_is_engine_error() {
        let command = BatchCommand {
            program: "wft-runner-no-such-engine".to_string(),
            args: vec![],
        };
        let err = run_to_completion(&command, std::future::pending()).await.unwrap_err();
        assert!(matches!(err, RunnerError::Engine(_)));
    }
}
