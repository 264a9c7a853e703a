/*!
 * Core Module
 * Shared types, errors, limits, and cancellation primitives
 */

pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

pub use errors::{Interrupted, LoadError};
pub use sync::CancelToken;
pub use types::{FileId, Generation, Pid, Port, Signal};
