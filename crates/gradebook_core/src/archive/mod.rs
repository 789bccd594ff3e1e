//! Archive engine: moves live records into the immutable archive store.

pub mod engine;
pub mod error;
mod request;

pub use engine::ArchiveEngine;
pub use error::{ArchiveError, ArchiveResult, ArchiveValidationError};
pub use request::{MAX_ACTOR_CHARS, MAX_REASON_CHARS};
