use gradebook_core::{
    ArchiveStatistics, Grade, GradeKind, ModelValidationError, Student, StudentGroup, StudyForm,
    Subject, Teacher,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn new_student_is_unassigned_full_time() {
    let student = Student::new("N-1", "Alan", "Turing", 2022);

    assert!(!student.id.is_nil());
    assert_eq!(student.study_form, StudyForm::FullTime);
    assert_eq!(student.group_id, None);
    assert_eq!(student.full_name(), "Alan Turing");
    student.validate().unwrap();
}

#[test]
fn enrollment_year_outside_range_is_rejected() {
    let student = Student::new("N-1", "Alan", "Turing", 1899);
    assert_eq!(
        student.validate(),
        Err(ModelValidationError::EnrollmentYearOutOfRange(1899))
    );
}

#[test]
fn zero_capacity_group_is_rejected() {
    let group = StudentGroup::new("CS-1", "Computer Science", 0);
    assert_eq!(group.validate(), Err(ModelValidationError::InvalidCapacity(0)));
}

#[test]
fn grade_value_must_be_finite_and_in_range() {
    let base = Grade::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        100.0,
        GradeKind::Exam,
        0,
    );
    base.validate().unwrap();

    for value in [-0.5, 100.5, f64::NAN, f64::INFINITY] {
        let grade = Grade { value, ..base.clone() };
        assert!(matches!(
            grade.validate(),
            Err(ModelValidationError::GradeValueOutOfRange(_))
        ));
    }
}

#[test]
fn enums_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_value(StudyForm::PartTime).unwrap(),
        json!("part_time")
    );
    assert_eq!(
        serde_json::to_value(GradeKind::Coursework).unwrap(),
        json!("coursework")
    );
}

#[test]
fn statistics_wire_shape() {
    let stats = ArchiveStatistics {
        total_groups: 1,
        total_students: 2,
        total_grades: 3,
        last_archive_date: None,
    };
    assert_eq!(
        serde_json::to_value(stats).unwrap(),
        json!({
            "total_groups": 1,
            "total_students": 2,
            "total_grades": 3,
            "last_archive_date": null,
        })
    );
}

#[test]
fn catalog_entries_validate_required_text() {
    let teacher = Teacher::new("  ", "Lovelace");
    assert!(matches!(
        teacher.validate(),
        Err(ModelValidationError::BlankField { field: "first_name", .. })
    ));
    Subject::new("MATH", "Mathematics", 5).validate().unwrap();
}
