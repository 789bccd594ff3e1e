//! Archive store repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist archive snapshots written by the archive engine.
//! - Serve every read path of the archive query service.
//!
//! # Invariants
//! - Snapshots are inserted once and never updated.
//! - `original_*_id` is unique per archive table (UNIQUE index), so a second
//!   insert for the same original id fails even if the engine guard is
//!   bypassed.
//! - Listings are ordered `archived_at DESC, id ASC`.
//! - Each read is a single statement, so it observes one consistent state.

use crate::db::ensure_schema_ready;
use crate::model::archive::{
    ArchiveRecordId, ArchiveStatistics, ArchivedGrade, ArchivedStudent, ArchivedStudentGroup,
};
use crate::model::grade::GradeId;
use crate::model::group::GroupId;
use crate::model::student::StudentId;
use crate::model::EntityKind;
use crate::repo::grade_repo::{grade_kind_to_db, parse_grade_kind};
use crate::repo::student_repo::{parse_study_form, study_form_to_db};
use crate::repo::{
    bool_to_int, like_contains_pattern, parse_bool, parse_count, parse_optional_uuid, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const ARCHIVED_GROUP_SELECT_SQL: &str = "SELECT
    id,
    original_group_id,
    code,
    name,
    specialization,
    capacity,
    was_active,
    student_count,
    original_created_at,
    archived_by,
    archived_at,
    reason
FROM archived_student_groups";

const ARCHIVED_STUDENT_SELECT_SQL: &str = "SELECT
    id,
    original_student_id,
    original_group_id,
    group_code,
    group_name,
    student_number,
    first_name,
    last_name,
    enrollment_year,
    study_form,
    grade_count,
    archived_by,
    archived_at,
    reason
FROM archived_students";

const ARCHIVED_GRADE_SELECT_SQL: &str = "SELECT
    id,
    original_grade_id,
    original_student_id,
    student_number,
    student_name,
    teacher_id,
    teacher_name,
    subject_id,
    subject_code,
    subject_name,
    value,
    kind,
    is_final,
    grade_date,
    comment,
    archived_by,
    archived_at,
    reason
FROM archived_grades";

const ARCHIVE_ORDER_SQL: &str = "ORDER BY archived_at DESC, id ASC";

/// Repository interface for the archive store.
pub trait ArchiveRepository {
    fn insert_archived_group(&self, record: &ArchivedStudentGroup) -> RepoResult<()>;
    fn insert_archived_student(&self, record: &ArchivedStudent) -> RepoResult<()>;
    fn insert_archived_grade(&self, record: &ArchivedGrade) -> RepoResult<()>;

    fn is_group_archived(&self, original_group_id: GroupId) -> RepoResult<bool>;
    fn is_student_archived(&self, original_student_id: StudentId) -> RepoResult<bool>;
    fn is_grade_archived(&self, original_grade_id: GradeId) -> RepoResult<bool>;

    fn list_archived_groups(&self) -> RepoResult<Vec<ArchivedStudentGroup>>;
    fn list_archived_students(&self) -> RepoResult<Vec<ArchivedStudent>>;
    fn list_archived_grades(&self) -> RepoResult<Vec<ArchivedGrade>>;

    fn get_archived_group(&self, id: ArchiveRecordId) -> RepoResult<Option<ArchivedStudentGroup>>;
    fn get_archived_student(&self, id: ArchiveRecordId) -> RepoResult<Option<ArchivedStudent>>;
    fn get_archived_grade(&self, id: ArchiveRecordId) -> RepoResult<Option<ArchivedGrade>>;
    fn find_archived_group_by_original_id(
        &self,
        original_group_id: GroupId,
    ) -> RepoResult<Option<ArchivedStudentGroup>>;

    /// Case-insensitive literal substring match over code and name.
    fn search_archived_groups(&self, term: &str) -> RepoResult<Vec<ArchivedStudentGroup>>;
    /// Case-insensitive literal substring match over student number.
    fn search_archived_students(&self, term: &str) -> RepoResult<Vec<ArchivedStudent>>;

    fn list_archived_students_by_group(
        &self,
        original_group_id: GroupId,
    ) -> RepoResult<Vec<ArchivedStudent>>;
    fn list_archived_grades_by_student(
        &self,
        original_student_id: StudentId,
    ) -> RepoResult<Vec<ArchivedGrade>>;
    /// Groups with `start <= archived_at <= end`.
    fn list_archived_groups_between(
        &self,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<ArchivedStudentGroup>>;

    fn archive_statistics(&self) -> RepoResult<ArchiveStatistics>;

    fn delete_archived_group(&self, id: ArchiveRecordId) -> RepoResult<()>;
    fn delete_archived_student(&self, id: ArchiveRecordId) -> RepoResult<()>;
    fn delete_archived_grade(&self, id: ArchiveRecordId) -> RepoResult<()>;
}

/// SQLite-backed archive repository.
pub struct SqliteArchiveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArchiveRepository<'conn> {
    /// Wraps a connection already known to be migrated.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn exists_by(&self, table: &'static str, column: &'static str, id: Uuid) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {column} = ?1);"),
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_by_id(&self, table: &'static str, entity: EntityKind, id: Uuid) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity, id });
        }
        Ok(())
    }

    fn query_groups(&self, sql: &str, binds: Vec<Value>) -> RepoResult<Vec<ArchivedStudentGroup>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_archived_group_row(row)?);
        }
        Ok(records)
    }

    fn query_students(&self, sql: &str, binds: Vec<Value>) -> RepoResult<Vec<ArchivedStudent>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_archived_student_row(row)?);
        }
        Ok(records)
    }

    fn query_grades(&self, sql: &str, binds: Vec<Value>) -> RepoResult<Vec<ArchivedGrade>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_archived_grade_row(row)?);
        }
        Ok(records)
    }
}

impl ArchiveRepository for SqliteArchiveRepository<'_> {
    fn insert_archived_group(&self, record: &ArchivedStudentGroup) -> RepoResult<()> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO archived_student_groups (
                id,
                original_group_id,
                code,
                name,
                specialization,
                capacity,
                was_active,
                student_count,
                original_created_at,
                archived_by,
                archived_at,
                reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                record.id.to_string(),
                record.original_group_id.to_string(),
                record.code.as_str(),
                record.name.as_str(),
                record.specialization.as_deref(),
                record.capacity,
                bool_to_int(record.was_active),
                record.student_count,
                record.original_created_at,
                record.archived_by.as_str(),
                record.archived_at,
                record.reason.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn insert_archived_student(&self, record: &ArchivedStudent) -> RepoResult<()> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO archived_students (
                id,
                original_student_id,
                original_group_id,
                group_code,
                group_name,
                student_number,
                first_name,
                last_name,
                enrollment_year,
                study_form,
                grade_count,
                archived_by,
                archived_at,
                reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                record.id.to_string(),
                record.original_student_id.to_string(),
                record.original_group_id.map(|value| value.to_string()),
                record.group_code.as_deref(),
                record.group_name.as_deref(),
                record.student_number.as_str(),
                record.first_name.as_str(),
                record.last_name.as_str(),
                record.enrollment_year,
                study_form_to_db(record.study_form),
                record.grade_count,
                record.archived_by.as_str(),
                record.archived_at,
                record.reason.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn insert_archived_grade(&self, record: &ArchivedGrade) -> RepoResult<()> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO archived_grades (
                id,
                original_grade_id,
                original_student_id,
                student_number,
                student_name,
                teacher_id,
                teacher_name,
                subject_id,
                subject_code,
                subject_name,
                value,
                kind,
                is_final,
                grade_date,
                comment,
                archived_by,
                archived_at,
                reason
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            );",
            params![
                record.id.to_string(),
                record.original_grade_id.to_string(),
                record.original_student_id.to_string(),
                record.student_number.as_str(),
                record.student_name.as_str(),
                record.teacher_id.to_string(),
                record.teacher_name.as_str(),
                record.subject_id.to_string(),
                record.subject_code.as_str(),
                record.subject_name.as_str(),
                record.value,
                grade_kind_to_db(record.kind),
                bool_to_int(record.is_final),
                record.grade_date,
                record.comment.as_deref(),
                record.archived_by.as_str(),
                record.archived_at,
                record.reason.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn is_group_archived(&self, original_group_id: GroupId) -> RepoResult<bool> {
        self.exists_by(
            "archived_student_groups",
            "original_group_id",
            original_group_id,
        )
    }

    fn is_student_archived(&self, original_student_id: StudentId) -> RepoResult<bool> {
        self.exists_by(
            "archived_students",
            "original_student_id",
            original_student_id,
        )
    }

    fn is_grade_archived(&self, original_grade_id: GradeId) -> RepoResult<bool> {
        self.exists_by("archived_grades", "original_grade_id", original_grade_id)
    }

    fn list_archived_groups(&self) -> RepoResult<Vec<ArchivedStudentGroup>> {
        self.query_groups(
            &format!("{ARCHIVED_GROUP_SELECT_SQL} {ARCHIVE_ORDER_SQL};"),
            Vec::new(),
        )
    }

    fn list_archived_students(&self) -> RepoResult<Vec<ArchivedStudent>> {
        self.query_students(
            &format!("{ARCHIVED_STUDENT_SELECT_SQL} {ARCHIVE_ORDER_SQL};"),
            Vec::new(),
        )
    }

    fn list_archived_grades(&self) -> RepoResult<Vec<ArchivedGrade>> {
        self.query_grades(
            &format!("{ARCHIVED_GRADE_SELECT_SQL} {ARCHIVE_ORDER_SQL};"),
            Vec::new(),
        )
    }

    fn get_archived_group(&self, id: ArchiveRecordId) -> RepoResult<Option<ArchivedStudentGroup>> {
        let records = self.query_groups(
            &format!("{ARCHIVED_GROUP_SELECT_SQL} WHERE id = ?;"),
            vec![Value::Text(id.to_string())],
        )?;
        Ok(records.into_iter().next())
    }

    fn get_archived_student(&self, id: ArchiveRecordId) -> RepoResult<Option<ArchivedStudent>> {
        let records = self.query_students(
            &format!("{ARCHIVED_STUDENT_SELECT_SQL} WHERE id = ?;"),
            vec![Value::Text(id.to_string())],
        )?;
        Ok(records.into_iter().next())
    }

    fn get_archived_grade(&self, id: ArchiveRecordId) -> RepoResult<Option<ArchivedGrade>> {
        let records = self.query_grades(
            &format!("{ARCHIVED_GRADE_SELECT_SQL} WHERE id = ?;"),
            vec![Value::Text(id.to_string())],
        )?;
        Ok(records.into_iter().next())
    }

    fn find_archived_group_by_original_id(
        &self,
        original_group_id: GroupId,
    ) -> RepoResult<Option<ArchivedStudentGroup>> {
        let records = self.query_groups(
            &format!("{ARCHIVED_GROUP_SELECT_SQL} WHERE original_group_id = ?;"),
            vec![Value::Text(original_group_id.to_string())],
        )?;
        Ok(records.into_iter().next())
    }

    fn search_archived_groups(&self, term: &str) -> RepoResult<Vec<ArchivedStudentGroup>> {
        let pattern = like_contains_pattern(term);
        self.query_groups(
            &format!(
                "{ARCHIVED_GROUP_SELECT_SQL}
                 WHERE unicode_lower(code) LIKE ?1 ESCAPE '\\'
                    OR unicode_lower(name) LIKE ?1 ESCAPE '\\'
                 {ARCHIVE_ORDER_SQL};"
            ),
            vec![Value::Text(pattern)],
        )
    }

    fn search_archived_students(&self, term: &str) -> RepoResult<Vec<ArchivedStudent>> {
        let pattern = like_contains_pattern(term);
        self.query_students(
            &format!(
                "{ARCHIVED_STUDENT_SELECT_SQL}
                 WHERE unicode_lower(student_number) LIKE ?1 ESCAPE '\\'
                 {ARCHIVE_ORDER_SQL};"
            ),
            vec![Value::Text(pattern)],
        )
    }

    fn list_archived_students_by_group(
        &self,
        original_group_id: GroupId,
    ) -> RepoResult<Vec<ArchivedStudent>> {
        self.query_students(
            &format!("{ARCHIVED_STUDENT_SELECT_SQL} WHERE original_group_id = ? {ARCHIVE_ORDER_SQL};"),
            vec![Value::Text(original_group_id.to_string())],
        )
    }

    fn list_archived_grades_by_student(
        &self,
        original_student_id: StudentId,
    ) -> RepoResult<Vec<ArchivedGrade>> {
        self.query_grades(
            &format!(
                "{ARCHIVED_GRADE_SELECT_SQL} WHERE original_student_id = ? {ARCHIVE_ORDER_SQL};"
            ),
            vec![Value::Text(original_student_id.to_string())],
        )
    }

    fn list_archived_groups_between(
        &self,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<ArchivedStudentGroup>> {
        self.query_groups(
            &format!(
                "{ARCHIVED_GROUP_SELECT_SQL}
                 WHERE archived_at >= ? AND archived_at <= ?
                 {ARCHIVE_ORDER_SQL};"
            ),
            vec![Value::Integer(start), Value::Integer(end)],
        )
    }

    fn archive_statistics(&self) -> RepoResult<ArchiveStatistics> {
        let (groups, students, grades, last): (i64, i64, i64, Option<i64>) =
            self.conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM archived_student_groups),
                    (SELECT COUNT(*) FROM archived_students),
                    (SELECT COUNT(*) FROM archived_grades),
                    (SELECT MAX(archived_at) FROM (
                        SELECT archived_at FROM archived_student_groups
                        UNION ALL
                        SELECT archived_at FROM archived_students
                        UNION ALL
                        SELECT archived_at FROM archived_grades
                    ));",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(ArchiveStatistics {
            total_groups: parse_total(groups, "archived_student_groups")?,
            total_students: parse_total(students, "archived_students")?,
            total_grades: parse_total(grades, "archived_grades")?,
            last_archive_date: last,
        })
    }

    fn delete_archived_group(&self, id: ArchiveRecordId) -> RepoResult<()> {
        self.delete_by_id(
            "archived_student_groups",
            EntityKind::ArchivedStudentGroup,
            id,
        )
    }

    fn delete_archived_student(&self, id: ArchiveRecordId) -> RepoResult<()> {
        self.delete_by_id("archived_students", EntityKind::ArchivedStudent, id)
    }

    fn delete_archived_grade(&self, id: ArchiveRecordId) -> RepoResult<()> {
        self.delete_by_id("archived_grades", EntityKind::ArchivedGrade, id)
    }
}

fn parse_total(value: i64, table: &'static str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid row count `{value}` for {table}")))
}

fn parse_archived_group_row(row: &Row<'_>) -> RepoResult<ArchivedStudentGroup> {
    let id_text: String = row.get("id")?;
    let original_text: String = row.get("original_group_id")?;

    let record = ArchivedStudentGroup {
        id: parse_uuid(&id_text, "archived_student_groups.id")?,
        original_group_id: parse_uuid(&original_text, "archived_student_groups.original_group_id")?,
        code: row.get("code")?,
        name: row.get("name")?,
        specialization: row.get("specialization")?,
        capacity: parse_count(row.get("capacity")?, "archived_student_groups.capacity")?,
        was_active: parse_bool(row.get("was_active")?, "archived_student_groups.was_active")?,
        student_count: parse_count(
            row.get("student_count")?,
            "archived_student_groups.student_count",
        )?,
        original_created_at: row.get("original_created_at")?,
        archived_by: row.get("archived_by")?,
        archived_at: row.get("archived_at")?,
        reason: row.get("reason")?,
    };
    record.validate()?;
    Ok(record)
}

fn parse_archived_student_row(row: &Row<'_>) -> RepoResult<ArchivedStudent> {
    let id_text: String = row.get("id")?;
    let original_text: String = row.get("original_student_id")?;
    let form_text: String = row.get("study_form")?;
    let study_form = parse_study_form(&form_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid study form `{form_text}` in archived_students.study_form"
        ))
    })?;

    let record = ArchivedStudent {
        id: parse_uuid(&id_text, "archived_students.id")?,
        original_student_id: parse_uuid(&original_text, "archived_students.original_student_id")?,
        original_group_id: parse_optional_uuid(
            row.get("original_group_id")?,
            "archived_students.original_group_id",
        )?,
        group_code: row.get("group_code")?,
        group_name: row.get("group_name")?,
        student_number: row.get("student_number")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        enrollment_year: row.get("enrollment_year")?,
        study_form,
        grade_count: parse_count(row.get("grade_count")?, "archived_students.grade_count")?,
        archived_by: row.get("archived_by")?,
        archived_at: row.get("archived_at")?,
        reason: row.get("reason")?,
    };
    record.validate()?;
    Ok(record)
}

fn parse_archived_grade_row(row: &Row<'_>) -> RepoResult<ArchivedGrade> {
    let id_text: String = row.get("id")?;
    let original_text: String = row.get("original_grade_id")?;
    let student_text: String = row.get("original_student_id")?;
    let teacher_text: String = row.get("teacher_id")?;
    let subject_text: String = row.get("subject_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = parse_grade_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid grade kind `{kind_text}` in archived_grades.kind"
        ))
    })?;

    let record = ArchivedGrade {
        id: parse_uuid(&id_text, "archived_grades.id")?,
        original_grade_id: parse_uuid(&original_text, "archived_grades.original_grade_id")?,
        original_student_id: parse_uuid(&student_text, "archived_grades.original_student_id")?,
        student_number: row.get("student_number")?,
        student_name: row.get("student_name")?,
        teacher_id: parse_uuid(&teacher_text, "archived_grades.teacher_id")?,
        teacher_name: row.get("teacher_name")?,
        subject_id: parse_uuid(&subject_text, "archived_grades.subject_id")?,
        subject_code: row.get("subject_code")?,
        subject_name: row.get("subject_name")?,
        value: row.get("value")?,
        kind,
        is_final: parse_bool(row.get("is_final")?, "archived_grades.is_final")?,
        grade_date: row.get("grade_date")?,
        comment: row.get("comment")?,
        archived_by: row.get("archived_by")?,
        archived_at: row.get("archived_at")?,
        reason: row.get("reason")?,
    };
    record.validate()?;
    Ok(record)
}
