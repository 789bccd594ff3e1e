//! Actor and reason normalization for archive calls.

use crate::archive::error::ArchiveValidationError;
use crate::model::archive::ArchiveStamp;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest accepted `archived_by`, in characters.
pub const MAX_ACTOR_CHARS: usize = 200;
/// Longest accepted `reason`, in characters.
pub const MAX_REASON_CHARS: usize = 1000;

static CONTROL_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Cc}").expect("valid control char regex"));

/// Validated audit fields shared by every record of one cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArchiveRequest {
    archived_by: String,
    reason: Option<String>,
}

impl ArchiveRequest {
    /// Trims both fields. A blank reason becomes `None`.
    pub(crate) fn new(archived_by: &str, reason: &str) -> Result<Self, ArchiveValidationError> {
        let actor = archived_by.trim();
        if actor.is_empty() {
            return Err(ArchiveValidationError::BlankActor);
        }
        if actor.chars().count() > MAX_ACTOR_CHARS {
            return Err(ArchiveValidationError::ActorTooLong {
                max_chars: MAX_ACTOR_CHARS,
            });
        }
        if CONTROL_CHAR_RE.is_match(actor) {
            return Err(ArchiveValidationError::InvalidActor(
                actor.escape_default().to_string(),
            ));
        }

        let reason = reason.trim();
        if reason.chars().count() > MAX_REASON_CHARS {
            return Err(ArchiveValidationError::ReasonTooLong {
                max_chars: MAX_REASON_CHARS,
            });
        }

        Ok(Self {
            archived_by: actor.to_string(),
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        })
    }

    pub(crate) fn stamp(&self, archived_at: i64) -> ArchiveStamp {
        ArchiveStamp {
            archived_by: self.archived_by.clone(),
            archived_at,
            reason: self.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchiveRequest, MAX_ACTOR_CHARS, MAX_REASON_CHARS};
    use crate::archive::error::ArchiveValidationError;

    #[test]
    fn trims_actor_and_drops_blank_reason() {
        let request = ArchiveRequest::new("  registrar ", "   ").unwrap();
        let stamp = request.stamp(42);
        assert_eq!(stamp.archived_by, "registrar");
        assert_eq!(stamp.reason, None);
        assert_eq!(stamp.archived_at, 42);
    }

    #[test]
    fn keeps_trimmed_reason() {
        let request = ArchiveRequest::new("registrar", " graduated\n").unwrap();
        assert_eq!(request.stamp(0).reason.as_deref(), Some("graduated"));
    }

    #[test]
    fn rejects_blank_actor() {
        assert_eq!(
            ArchiveRequest::new(" \t", "reason"),
            Err(ArchiveValidationError::BlankActor)
        );
    }

    #[test]
    fn rejects_actor_with_control_characters() {
        let err = ArchiveRequest::new("regis\u{7}trar", "").unwrap_err();
        assert!(matches!(err, ArchiveValidationError::InvalidActor(_)));
    }

    #[test]
    fn accepts_unicode_actor() {
        assert!(ArchiveRequest::new("Dr. Zoë O'Brien", "").is_ok());
    }

    #[test]
    fn enforces_length_limits() {
        let actor = "a".repeat(MAX_ACTOR_CHARS + 1);
        assert_eq!(
            ArchiveRequest::new(&actor, ""),
            Err(ArchiveValidationError::ActorTooLong {
                max_chars: MAX_ACTOR_CHARS
            })
        );

        let reason = "r".repeat(MAX_REASON_CHARS + 1);
        assert_eq!(
            ArchiveRequest::new("registrar", &reason),
            Err(ArchiveValidationError::ReasonTooLong {
                max_chars: MAX_REASON_CHARS
            })
        );
    }
}
