//! Grade aggregation over live grades.

use crate::model::student::StudentId;
use crate::repo::grade_repo::{GradeRepository, GradeScope};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum GradeServiceError {
    StudentNotFound(StudentId),
    Repo(RepoError),
}

impl Display for GradeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GradeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StudentNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for GradeServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service for grade statistics.
pub struct GradeService<R: GradeRepository> {
    repo: R,
}

impl<R: GradeRepository> GradeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Mean of the student's grades within `scope`, rounded to two decimals.
    ///
    /// Returns `Ok(None)` when no grade qualifies.
    ///
    /// # Errors
    /// - `StudentNotFound` when `student_id` is not a live student.
    pub fn calculate_average_grade(
        &self,
        student_id: StudentId,
        scope: &GradeScope,
    ) -> Result<Option<f64>, GradeServiceError> {
        let summary = self.repo.summarize_grades(student_id, scope)?;
        if !summary.student_exists {
            return Err(GradeServiceError::StudentNotFound(student_id));
        }
        Ok(summary.mean.map(round_to_cents))
    }
}

/// Rounds half away from zero to two decimals.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round_to_cents, GradeService, GradeServiceError};
    use crate::model::grade::{Grade, GradeId};
    use crate::model::student::StudentId;
    use crate::repo::grade_repo::{GradeRepository, GradeScope, GradeSummary};
    use crate::repo::RepoResult;
    use uuid::Uuid;

    struct FixedSummary(GradeSummary);

    impl GradeRepository for FixedSummary {
        fn insert_grade(&self, grade: &Grade) -> RepoResult<GradeId> {
            Ok(grade.id)
        }

        fn get_grade(&self, _id: GradeId) -> RepoResult<Option<Grade>> {
            Ok(None)
        }

        fn list_grades_by_student(&self, _student_id: StudentId) -> RepoResult<Vec<Grade>> {
            Ok(Vec::new())
        }

        fn delete_grade(&self, _id: GradeId) -> RepoResult<()> {
            Ok(())
        }

        fn summarize_grades(
            &self,
            _student_id: StudentId,
            _scope: &GradeScope,
        ) -> RepoResult<GradeSummary> {
            Ok(self.0)
        }
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_cents(83.755), 83.76);
        assert_eq!(round_to_cents(83.754), 83.75);
        assert_eq!(round_to_cents(90.0), 90.0);
    }

    #[test]
    fn missing_student_is_reported() {
        let service = GradeService::new(FixedSummary(GradeSummary {
            student_exists: false,
            count: 0,
            mean: None,
        }));
        let id = Uuid::new_v4();
        let err = service
            .calculate_average_grade(id, &GradeScope::default())
            .unwrap_err();
        assert!(matches!(err, GradeServiceError::StudentNotFound(found) if found == id));
    }

    #[test]
    fn no_qualifying_grades_is_none_not_zero() {
        let service = GradeService::new(FixedSummary(GradeSummary {
            student_exists: true,
            count: 0,
            mean: None,
        }));
        let average = service
            .calculate_average_grade(Uuid::new_v4(), &GradeScope::all())
            .unwrap();
        assert_eq!(average, None);
    }
}
