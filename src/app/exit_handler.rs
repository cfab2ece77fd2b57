//! Exit code logic for the mirror process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use chartfetch_core::RunSummary;

use crate::ProcessExit;

/// Determines the process exit outcome from a completed run.
///
/// Fatal errors never reach this point; they surface as `Err` from the
/// runtime and exit with [`ProcessExit::Failure`].
pub(crate) fn determine_exit_outcome(summary: &RunSummary) -> ProcessExit {
    if summary.is_clean() {
        ProcessExit::Success
    } else {
        ProcessExit::Partial
    }
}
