/*!
 * Core Types
 * Common identifier types used across the crate
 */

/// Process ID type
pub type Pid = u32;

/// File identifier type (inode-style, stable for the lifetime of the file)
pub type FileId = u64;

/// Network port type
pub type Port = u16;

/// Signal number type
pub type Signal = u32;

/// Role-set generation counter, bumped on every reset/replace cycle
pub type Generation = u64;
