#![allow(dead_code)]

use gradebook_core::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use gradebook_core::repo::grade_repo::{GradeRepository, SqliteGradeRepository};
use gradebook_core::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use gradebook_core::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use gradebook_core::{Grade, GradeKind, Student, StudentGroup, Subject, Teacher};
use rusqlite::Connection;

/// Group G with students S1 {g1, g2} and S2 {g3}.
pub struct Fixture {
    pub group: StudentGroup,
    pub s1: Student,
    pub s2: Student,
    pub teacher: Teacher,
    pub subject: Subject,
    pub g1: Grade,
    pub g2: Grade,
    pub g3: Grade,
}

/// Row counts of every live and archive table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub groups: i64,
    pub students: i64,
    pub grades: i64,
    pub archived_groups: i64,
    pub archived_students: i64,
    pub archived_grades: i64,
}

pub fn seed_group(conn: &Connection, code: &str) -> Fixture {
    let teacher = Teacher::new("Ada", "Lovelace");
    let subject = Subject::new(format!("{code}-MATH"), "Mathematics", 5);
    let catalog = SqliteCatalogRepository::new(conn);
    catalog.insert_teacher(&teacher).unwrap();
    catalog.insert_subject(&subject).unwrap();

    let group = SqliteGroupRepository::new(conn)
        .insert_group(&StudentGroup::new(code, format!("Group {code}"), 30))
        .unwrap();

    let s1 = Student::new(format!("{code}-001"), "Alan", "Turing", 2022).in_group(group.id);
    let s2 = Student::new(format!("{code}-002"), "Grace", "Hopper", 2022).in_group(group.id);
    let students = SqliteStudentRepository::new(conn);
    students.insert_student(&s1).unwrap();
    students.insert_student(&s2).unwrap();

    let g1 = insert_grade(conn, &s1, &teacher, &subject, 85.0, 1_000);
    let g2 = insert_grade(conn, &s1, &teacher, &subject, 90.0, 2_000);
    let g3 = insert_grade(conn, &s2, &teacher, &subject, 78.0, 3_000);

    Fixture {
        group,
        s1,
        s2,
        teacher,
        subject,
        g1,
        g2,
        g3,
    }
}

pub fn insert_grade(
    conn: &Connection,
    student: &Student,
    teacher: &Teacher,
    subject: &Subject,
    value: f64,
    grade_date: i64,
) -> Grade {
    let grade = Grade::new(
        student.id,
        teacher.id,
        subject.id,
        value,
        GradeKind::Exam,
        grade_date,
    )
    .finalized();
    SqliteGradeRepository::new(conn).insert_grade(&grade).unwrap();
    grade
}

pub fn store_counts(conn: &Connection) -> StoreCounts {
    StoreCounts {
        groups: count_rows(conn, "student_groups"),
        students: count_rows(conn, "students"),
        grades: count_rows(conn, "grades"),
        archived_groups: count_rows(conn, "archived_student_groups"),
        archived_students: count_rows(conn, "archived_students"),
        archived_grades: count_rows(conn, "archived_grades"),
    }
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
