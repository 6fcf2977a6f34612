//! Stable exit codes for the `cheap-research` binary.

/// Session ended normally.
pub const OK: i32 = 0;
/// Startup failed: unreadable or invalid configuration, missing API key, or I/O errors.
pub const INVALID: i32 = 1;
/// The configuration file exists but has not been marked `initialized = true` yet.
pub const NOT_INITIALIZED: i32 = 2;
