//! Stable process exit codes for the shell.

use cmdguard::codes;

/// The command ran and reported success.
pub const OK: i32 = 0;
/// Input did not match the command tree, config was invalid, or a guard or
/// handler failed hard.
pub const INVALID: i32 = 1;
/// A guard aborted the command, or the handler reported no success.
pub const DENIED: i32 = 2;

/// Map a command result code to a process exit code.
pub fn from_result(code: i32) -> i32 {
    if code > codes::NO_SUCCESS { OK } else { DENIED }
}
