//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Schema validation error - a value is missing, malformed or out of range
pub const SCHEMA_ERROR: i32 = 2;

/// Reference error - an ingress backend points at something unusable
pub const REFERENCE_ERROR: i32 = 3;

/// Pack error - invalid pack structure, Pack.yaml or environment
pub const PACK_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Conflict error - duplicate application or object names
pub const CONFLICT_ERROR: i32 = 6;
