//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - chart written or printed
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Decode error - an input document is not a Kubernetes object
pub const DECODE_ERROR: i32 = 2;

/// Transform error - an object could not be templated
pub const TRANSFORM_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Interrupted by SIGINT (128 + 2)
pub const INTERRUPTED: i32 = 130;
