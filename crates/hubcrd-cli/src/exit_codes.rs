//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - every document is valid
pub const SUCCESS: i32 = 0;

/// General error - CRD registration or manifest decoding failed
pub const ERROR: i32 = 1;

/// Validation error - at least one field error was reported
pub const VALIDATION_ERROR: i32 = 2;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
