//! Grade repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A grade always references a live student, teacher and subject.
//! - Aggregates are computed in one statement so they read one snapshot.

use crate::model::catalog::SubjectId;
use crate::model::grade::{Grade, GradeId, GradeKind};
use crate::model::student::StudentId;
use crate::model::EntityKind;
use crate::repo::{bool_to_int, parse_bool, parse_count, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const GRADE_SELECT_SQL: &str = "SELECT
    id,
    student_id,
    teacher_id,
    subject_id,
    value,
    kind,
    is_final,
    grade_date,
    comment
FROM grades";

/// Selects which grades of one student take part in an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeScope {
    /// Only grades with `is_final = true`.
    pub final_only: bool,
    /// Only grades of one subject.
    pub subject_id: Option<SubjectId>,
}

impl GradeScope {
    /// Final grades across all subjects.
    pub fn final_grades() -> Self {
        Self {
            final_only: true,
            subject_id: None,
        }
    }

    /// Every grade, final or not.
    pub fn all() -> Self {
        Self {
            final_only: false,
            subject_id: None,
        }
    }

    /// Every grade in one subject.
    pub fn for_subject(subject_id: SubjectId) -> Self {
        Self {
            final_only: false,
            subject_id: Some(subject_id),
        }
    }
}

impl Default for GradeScope {
    fn default() -> Self {
        Self::final_grades()
    }
}

/// Raw aggregate row for one student and scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeSummary {
    pub student_exists: bool,
    pub count: u32,
    /// `None` when `count == 0`.
    pub mean: Option<f64>,
}

/// Repository interface for grade operations.
pub trait GradeRepository {
    fn insert_grade(&self, grade: &Grade) -> RepoResult<GradeId>;
    fn get_grade(&self, id: GradeId) -> RepoResult<Option<Grade>>;
    /// Lists a student's grades ordered by `grade_date`, then id.
    fn list_grades_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Grade>>;
    fn delete_grade(&self, id: GradeId) -> RepoResult<()>;
    fn summarize_grades(&self, student_id: StudentId, scope: &GradeScope)
        -> RepoResult<GradeSummary>;
}

/// SQLite-backed grade repository.
pub struct SqliteGradeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGradeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GradeRepository for SqliteGradeRepository<'_> {
    fn insert_grade(&self, grade: &Grade) -> RepoResult<GradeId> {
        grade.validate()?;

        self.conn.execute(
            "INSERT INTO grades (
                id,
                student_id,
                teacher_id,
                subject_id,
                value,
                kind,
                is_final,
                grade_date,
                comment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                grade.id.to_string(),
                grade.student_id.to_string(),
                grade.teacher_id.to_string(),
                grade.subject_id.to_string(),
                grade.value,
                grade_kind_to_db(grade.kind),
                bool_to_int(grade.is_final),
                grade.grade_date,
                grade.comment.as_deref(),
            ],
        )?;

        Ok(grade.id)
    }

    fn get_grade(&self, id: GradeId) -> RepoResult<Option<Grade>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GRADE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_grade_row(row)?));
        }
        Ok(None)
    }

    fn list_grades_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Grade>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_SELECT_SQL}
             WHERE student_id = ?1
             ORDER BY grade_date ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([student_id.to_string()])?;
        let mut grades = Vec::new();
        while let Some(row) = rows.next()? {
            grades.push(parse_grade_row(row)?);
        }
        Ok(grades)
    }

    fn delete_grade(&self, id: GradeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM grades WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Grade,
                id,
            });
        }
        Ok(())
    }

    fn summarize_grades(
        &self,
        student_id: StudentId,
        scope: &GradeScope,
    ) -> RepoResult<GradeSummary> {
        let (exists, count, mean): (i64, i64, Option<f64>) = self.conn.query_row(
            "SELECT
                EXISTS(SELECT 1 FROM students WHERE id = ?1),
                COUNT(g.id),
                AVG(g.value)
             FROM grades g
             WHERE g.student_id = ?1
               AND (?2 = 0 OR g.is_final = 1)
               AND (?3 IS NULL OR g.subject_id = ?3);",
            params![
                student_id.to_string(),
                bool_to_int(scope.final_only),
                scope.subject_id.map(|value| value.to_string()),
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(GradeSummary {
            student_exists: exists == 1,
            count: parse_count(count, "grades.count")?,
            mean,
        })
    }
}

fn parse_grade_row(row: &Row<'_>) -> RepoResult<Grade> {
    let id_text: String = row.get("id")?;
    let student_text: String = row.get("student_id")?;
    let teacher_text: String = row.get("teacher_id")?;
    let subject_text: String = row.get("subject_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = parse_grade_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid grade kind `{kind_text}` in grades.kind"))
    })?;

    let grade = Grade {
        id: parse_uuid(&id_text, "grades.id")?,
        student_id: parse_uuid(&student_text, "grades.student_id")?,
        teacher_id: parse_uuid(&teacher_text, "grades.teacher_id")?,
        subject_id: parse_uuid(&subject_text, "grades.subject_id")?,
        value: row.get("value")?,
        kind,
        is_final: parse_bool(row.get("is_final")?, "grades.is_final")?,
        grade_date: row.get("grade_date")?,
        comment: row.get("comment")?,
    };
    grade.validate()?;
    Ok(grade)
}

pub(crate) fn grade_kind_to_db(kind: GradeKind) -> &'static str {
    match kind {
        GradeKind::Exam => "exam",
        GradeKind::Test => "test",
        GradeKind::Coursework => "coursework",
        GradeKind::Lab => "lab",
        GradeKind::Oral => "oral",
    }
}

pub(crate) fn parse_grade_kind(value: &str) -> Option<GradeKind> {
    match value {
        "exam" => Some(GradeKind::Exam),
        "test" => Some(GradeKind::Test),
        "coursework" => Some(GradeKind::Coursework),
        "lab" => Some(GradeKind::Lab),
        "oral" => Some(GradeKind::Oral),
        _ => None,
    }
}
