//! Shared validation error and field checks for model types.

use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation errors for live entities and archive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    /// Identity field holds the nil UUID.
    NilId {
        entity: EntityKind,
        field: &'static str,
    },
    /// Required text is empty after trim.
    BlankField {
        entity: EntityKind,
        field: &'static str,
    },
    /// Text exceeds the column limit.
    FieldTooLong {
        entity: EntityKind,
        field: &'static str,
        max_chars: usize,
    },
    /// Group capacity must be at least one seat.
    InvalidCapacity(u32),
    EnrollmentYearOutOfRange(i32),
    /// Grade value is NaN, infinite or outside `0.0..=100.0`.
    GradeValueOutOfRange(f64),
    NegativeTimestamp {
        entity: EntityKind,
        field: &'static str,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId { entity, field } => write!(f, "{entity}.{field} must not be nil"),
            Self::BlankField { entity, field } => {
                write!(f, "{entity}.{field} must not be blank")
            }
            Self::FieldTooLong {
                entity,
                field,
                max_chars,
            } => write!(f, "{entity}.{field} exceeds {max_chars} characters"),
            Self::InvalidCapacity(value) => {
                write!(f, "group capacity must be positive, got {value}")
            }
            Self::EnrollmentYearOutOfRange(year) => {
                write!(f, "enrollment year {year} is outside 1900..=2200")
            }
            Self::GradeValueOutOfRange(value) => {
                write!(f, "grade value {value} is outside 0..=100")
            }
            Self::NegativeTimestamp { entity, field } => {
                write!(f, "{entity}.{field} must not be negative")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) const MAX_NAME_CHARS: usize = 200;
pub(crate) const MAX_CODE_CHARS: usize = 64;

pub(crate) fn require_id(
    entity: EntityKind,
    field: &'static str,
    id: Uuid,
) -> Result<(), ModelValidationError> {
    if id.is_nil() {
        return Err(ModelValidationError::NilId { entity, field });
    }
    Ok(())
}

pub(crate) fn require_text(
    entity: EntityKind,
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField { entity, field });
    }
    optional_text(entity, field, Some(value), max_chars)
}

pub(crate) fn optional_text(
    entity: EntityKind,
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    match value {
        Some(text) if text.chars().count() > max_chars => {
            Err(ModelValidationError::FieldTooLong {
                entity,
                field,
                max_chars,
            })
        }
        _ => Ok(()),
    }
}

pub(crate) fn require_timestamp(
    entity: EntityKind,
    field: &'static str,
    value: i64,
) -> Result<(), ModelValidationError> {
    if value < 0 {
        return Err(ModelValidationError::NegativeTimestamp { entity, field });
    }
    Ok(())
}

pub(crate) fn require_grade_value(value: f64) -> Result<(), ModelValidationError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ModelValidationError::GradeValueOutOfRange(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_rejects_whitespace_only() {
        let err = require_text(EntityKind::Student, "first_name", "   ", 10).unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::BlankField {
                entity: EntityKind::Student,
                field: "first_name"
            }
        );
    }

    #[test]
    fn optional_text_counts_chars_not_bytes() {
        assert!(optional_text(EntityKind::Teacher, "last_name", Some("Żółć"), 4).is_ok());
        assert!(optional_text(EntityKind::Teacher, "last_name", Some("Żółćx"), 4).is_err());
    }

    #[test]
    fn grade_value_rejects_nan_and_out_of_range() {
        assert!(require_grade_value(f64::NAN).is_err());
        assert!(require_grade_value(-0.5).is_err());
        assert!(require_grade_value(100.5).is_err());
        assert!(require_grade_value(0.0).is_ok());
        assert!(require_grade_value(100.0).is_ok());
    }
}
