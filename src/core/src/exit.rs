//! Run results and the final process exit status.

use crate::error::RunnerError;

/// Exit status of a successful run.
pub const SUCCESS_EXIT: i32 = 0;

/// Fixed exit status for interrupted or failed runs.
pub const FAILURE_EXIT: i32 = -1;

/// Outcome of one dispatched invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: i32,
    pub interrupted: bool,
}

impl RunResult {
    /// The child or container ran to completion.
    pub fn completed(exit_code: i32) -> Self {
        Self {
            exit_code,
            interrupted: false,
        }
    }

    /// The run was stopped by the user.
    pub fn interrupted() -> Self {
        Self {
            exit_code: FAILURE_EXIT,
            interrupted: true,
        }
    }

    /// Ran to completion with the success status.
    pub fn succeeded(&self) -> bool {
        !self.interrupted && self.exit_code == SUCCESS_EXIT
    }
}

/// Map a run result to the process exit status.
pub fn report(result: &RunResult) -> i32 {
    if result.interrupted {
        FAILURE_EXIT
    } else {
        result.exit_code
    }
}

/// Map the pipeline outcome to the process exit status, logging failures.
pub fn report_outcome(outcome: &Result<RunResult, RunnerError>) -> i32 {
    match outcome {
        Ok(result) => {
            let code = report(result);
            tracing::debug!(
                exit_code = code,
                interrupted = result.interrupted,
                succeeded = result.succeeded(),
                "Container terminated"
            );
            code
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Run failed");
            FAILURE_EXIT
        }
    }
}
