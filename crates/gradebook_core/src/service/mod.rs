//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Expose read paths and aggregates with archive-level error kinds.
//! - Stay storage-agnostic: services are generic over repository traits.

pub mod archive_query_service;
pub mod grade_service;

pub use archive_query_service::ArchiveQueryService;
pub use grade_service::{GradeService, GradeServiceError};
