//! Stable result codes returned by handlers and aborting guards.

/// Generic success for handlers with nothing more specific to report.
pub const SUCCESS: i32 = 1;
/// Default code carried by an abort that did not supply its own.
pub const NO_SUCCESS: i32 = 0;
