//! Stable exit codes for the `breakthrough` binary.

/// Every stage reached a terminal state.
pub const OK: i32 = 0;
/// Bad arguments, config, or model name, or another setup failure.
pub const INVALID: i32 = 1;
/// The operator quit before the last stage finished.
pub const ABORTED: i32 = 3;
