use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};

use edugest_academics::{
    ClassGroup, ClassGroupPatch, ClassLevel, Course, CurriculumEntry, NewClassGroup, NewClassLevel, NewCourse,
    NewCurriculumEntry, NewPeriod, NewRoom, NewSchoolYear, NewSubject, Period, Room, RoomPatch,
    SchoolYear, Subject,
};
use edugest_billing::{InvoiceStatus, NewFeeItem, NewInvoice, NewInvoiceLine};
use edugest_core::{DomainError, PageRequest};
use edugest_enrollment::{Enrollment, EnrollmentStatus, NewEnrollment, NewStudent, Student, TransferEnrollment};
use edugest_staff::{NewTeacher, NewTeachingAssignment, Teacher};

use super::*;
use crate::store::InMemorySchoolStore;

fn service() -> SchoolService {
    SchoolService::new(Arc::new(InMemorySchoolStore::new()), ServiceSettings::default())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One school year with a single course, class, room and two periods.
struct School {
    year: SchoolYear,
    course: Course,
    level: ClassLevel,
    room: Room,
    morning: Period,
    afternoon: Period,
}

async fn school(svc: &SchoolService) -> School {
    let year = svc
        .create_school_year(NewSchoolYear {
            designation: "2024/2025".into(),
            start_date: date(2024, 9, 1),
            end_date: date(2025, 7, 31),
            is_current: true,
        })
        .await
        .unwrap();
    let course = svc
        .create_course(NewCourse {
            name: "Ciências Físicas e Biológicas".into(),
            code: "CFB".into(),
            description: None,
        })
        .await
        .unwrap();
    let level = svc
        .create_class_level(NewClassLevel {
            name: "10ª Classe".into(),
            grade: 10,
        })
        .await
        .unwrap();
    let room = svc
        .create_room(NewRoom {
            designation: "Sala 1".into(),
            capacity: 30,
            location: None,
        })
        .await
        .unwrap();
    let morning = svc
        .create_period(NewPeriod {
            designation: "Manhã".into(),
            start_time: "07:30".into(),
            end_time: "12:30".into(),
        })
        .await
        .unwrap();
    let afternoon = svc
        .create_period(NewPeriod {
            designation: "Tarde".into(),
            start_time: "13:00".into(),
            end_time: "18:00".into(),
        })
        .await
        .unwrap();
    School {
        year,
        course,
        level,
        room,
        morning,
        afternoon,
    }
}

async fn group(
    svc: &SchoolService,
    s: &School,
    designation: &str,
    period: &Period,
    capacity: u32,
) -> ClassGroup {
    svc.create_class_group(NewClassGroup {
        designation: designation.into(),
        school_year_id: s.year.id,
        course_id: s.course.id,
        class_level_id: s.level.id,
        room_id: s.room.id,
        period_id: period.id,
        capacity: Some(capacity),
    })
    .await
    .unwrap()
}

async fn student(svc: &SchoolService, name: &str, document: &str) -> Student {
    svc.create_student(NewStudent {
        full_name: name.into(),
        document_number: document.into(),
        birth_date: date(2008, 3, 14),
        guardian_name: None,
        tax_id: None,
        address: None,
        city: Some("Luanda".into()),
    })
    .await
    .unwrap()
}

async fn subject_in_grid(svc: &SchoolService, s: &School) -> (Subject, CurriculumEntry) {
    let subject = svc
        .create_subject(NewSubject {
            name: "Matemática".into(),
            code: "MAT".into(),
        })
        .await
        .unwrap();
    let entry = svc
        .create_curriculum_entry(NewCurriculumEntry {
            course_id: s.course.id,
            class_level_id: s.level.id,
            subject_id: subject.id,
            weekly_hours: 5,
        })
        .await
        .unwrap();
    (subject, entry)
}

async fn teacher(svc: &SchoolService) -> Teacher {
    svc.create_teacher(NewTeacher {
        full_name: "Ana Domingos".into(),
        document_number: "004512LA041".into(),
        email: Some("ana@escola.ao".into()),
        phone: None,
        academic_degree: Some("Licenciatura".into()),
    })
    .await
    .unwrap()
}

fn enroll_in(student: &Student, group: &ClassGroup) -> NewEnrollment {
    NewEnrollment {
        student_id: student.id,
        class_group_id: group.id,
        enrolled_on: None,
    }
}

#[tokio::test]
async fn only_one_school_year_is_current() {
    let svc = service();
    let s = school(&svc).await;
    let next = svc
        .create_school_year(NewSchoolYear {
            designation: "2025/2026".into(),
            start_date: date(2025, 9, 1),
            end_date: date(2026, 7, 31),
            is_current: true,
        })
        .await
        .unwrap();

    assert!(next.is_current);
    assert_eq!(svc.current_school_year().await.unwrap().id, next.id);
    assert!(!svc.get::<SchoolYear>(s.year.id).await.unwrap().is_current);

    svc.activate_school_year(s.year.id).await.unwrap();
    assert_eq!(svc.current_school_year().await.unwrap().id, s.year.id);
}

#[tokio::test]
async fn deleting_a_school_year_cascades_to_its_groups() {
    let svc = service();
    let s = school(&svc).await;
    let (subject, _) = subject_in_grid(&svc, &s).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    let b = group(&svc, &s, "10B", &s.afternoon, 30).await;
    let t = teacher(&svc).await;
    for g in [&a, &b] {
        svc.assign_teacher(NewTeachingAssignment {
            teacher_id: t.id,
            class_group_id: g.id,
            subject_id: subject.id,
        })
        .await
        .unwrap();
    }
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;
    svc.enroll(enroll_in(&ana, &a)).await.unwrap();
    svc.enroll(enroll_in(&rui, &b)).await.unwrap();

    let summary = svc.delete_school_year(s.year.id).await.unwrap();
    assert_eq!(summary.deleted.get("class_groups"), Some(&2));
    assert_eq!(summary.deleted.get("enrollments"), Some(&2));
    assert_eq!(summary.deleted.get("teaching_assignments"), Some(&2));
    assert_eq!(summary.total(), 6);

    assert!(matches!(
        svc.get::<ClassGroup>(a.id).await,
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
    // Students and the teacher survive.
    assert!(svc.get::<Student>(ana.id).await.is_ok());
    assert!(svc.get::<Teacher>(t.id).await.is_ok());
}

#[tokio::test]
async fn restricted_delete_reports_a_conflict() {
    let svc = service();
    let s = school(&svc).await;
    group(&svc, &s, "10A", &s.morning, 30).await;

    let err = svc.delete_room(s.room.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))), "{err}");
}

#[tokio::test]
async fn class_group_with_unknown_room_is_not_found() {
    let svc = service();
    let s = school(&svc).await;
    let err = svc
        .create_class_group(NewClassGroup {
            designation: "10A".into(),
            school_year_id: s.year.id,
            course_id: s.course.id,
            class_level_id: s.level.id,
            room_id: edugest_core::RoomId::new(),
            period_id: s.morning.id,
            capacity: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "room not found");
}

#[tokio::test]
async fn room_cannot_shrink_below_a_hosted_group() {
    let svc = service();
    let s = school(&svc).await;
    group(&svc, &s, "10A", &s.morning, 25).await;

    let err = svc
        .update_room(
            s.room.id,
            RoomPatch {
                capacity: Some(20),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvariantViolation(_))));
    assert_eq!(svc.get::<Room>(s.room.id).await.unwrap().capacity, 30);
}

#[tokio::test]
async fn full_group_rejects_enrollment() {
    let svc = service();
    let s = school(&svc).await;
    let g = group(&svc, &s, "10A", &s.morning, 1).await;
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;

    svc.enroll(enroll_in(&ana, &g)).await.unwrap();
    let err = svc.enroll(enroll_in(&rui, &g)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))), "{err}");
}

#[tokio::test]
async fn one_enrollment_per_student_and_year_until_cancelled() {
    let svc = service();
    let s = school(&svc).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    let b = group(&svc, &s, "10B", &s.afternoon, 30).await;
    let ana = student(&svc, "Ana", "A1").await;

    let first = svc.enroll(enroll_in(&ana, &a)).await.unwrap();
    let err = svc.enroll(enroll_in(&ana, &b)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))), "{err}");

    let cancelled = svc.cancel_enrollment(first.id).await.unwrap();
    assert_eq!(cancelled.status, EnrollmentStatus::Cancelled);
    svc.enroll(enroll_in(&ana, &b)).await.unwrap();
}

#[tokio::test]
async fn transfer_moves_the_seat() {
    let svc = service();
    let s = school(&svc).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    let b = group(&svc, &s, "10B", &s.afternoon, 1).await;
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;

    let enrollment = svc.enroll(enroll_in(&ana, &a)).await.unwrap();
    let moved = svc
        .transfer_enrollment(enrollment.id, TransferEnrollment { class_group_id: b.id })
        .await
        .unwrap();
    assert_eq!(moved.class_group_id, b.id);
    assert_eq!(moved.previous_class_group_id, Some(a.id));
    assert_eq!(svc.store.count_active_enrollments(a.id).await.unwrap(), 0);

    // 10B is now full.
    let other = svc.enroll(enroll_in(&rui, &a)).await.unwrap();
    let err = svc
        .transfer_enrollment(other.id, TransferEnrollment { class_group_id: b.id })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));

    let students = svc
        .class_group_students(b.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(students.total, 1);
    assert_eq!(students.items[0].id, ana.id);
}

#[tokio::test]
async fn transfer_out_frees_the_seat_but_blocks_the_year() {
    let svc = service();
    let s = school(&svc).await;
    let g = group(&svc, &s, "10A", &s.morning, 1).await;
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;

    let enrollment = svc.enroll(enroll_in(&ana, &g)).await.unwrap();
    let left = svc.transfer_out(enrollment.id).await.unwrap();
    assert_eq!(left.status, EnrollmentStatus::Transferred);

    svc.enroll(enroll_in(&rui, &g)).await.unwrap();
    assert!(svc.enroll(enroll_in(&ana, &g)).await.is_err());
}

#[tokio::test]
async fn assignment_requires_the_subject_in_the_grid() {
    let svc = service();
    let s = school(&svc).await;
    let g = group(&svc, &s, "10A", &s.morning, 30).await;
    let t = teacher(&svc).await;
    let outside = svc
        .create_subject(NewSubject {
            name: "Filosofia".into(),
            code: "FIL".into(),
        })
        .await
        .unwrap();

    let err = svc
        .assign_teacher(NewTeachingAssignment {
            teacher_id: t.id,
            class_group_id: g.id,
            subject_id: outside.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvariantViolation(_))));
}

#[tokio::test]
async fn curriculum_entry_in_use_cannot_be_deleted() {
    let svc = service();
    let s = school(&svc).await;
    let (subject, entry) = subject_in_grid(&svc, &s).await;
    let g = group(&svc, &s, "10A", &s.morning, 30).await;
    let t = teacher(&svc).await;
    let assignment = svc
        .assign_teacher(NewTeachingAssignment {
            teacher_id: t.id,
            class_group_id: g.id,
            subject_id: subject.id,
        })
        .await
        .unwrap();

    let err = svc.delete_curriculum_entry(entry.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));

    svc.delete_assignment(assignment.id).await.unwrap();
    svc.delete_curriculum_entry(entry.id).await.unwrap();

    let page = svc
        .teacher_assignments(t.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn deleting_a_teacher_removes_assignments() {
    let svc = service();
    let s = school(&svc).await;
    let (subject, _) = subject_in_grid(&svc, &s).await;
    let g = group(&svc, &s, "10A", &s.morning, 30).await;
    let t = teacher(&svc).await;
    svc.assign_teacher(NewTeachingAssignment {
        teacher_id: t.id,
        class_group_id: g.id,
        subject_id: subject.id,
    })
    .await
    .unwrap();

    let summary = svc.delete_teacher(t.id).await.unwrap();
    assert_eq!(summary.message(), "teacher deleted (teaching_assignments: 1)");
}

#[tokio::test]
async fn group_cannot_shrink_below_its_roll() {
    let svc = service();
    let s = school(&svc).await;
    let g = group(&svc, &s, "10A", &s.morning, 2).await;
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;
    svc.enroll(enroll_in(&ana, &g)).await.unwrap();
    svc.enroll(enroll_in(&rui, &g)).await.unwrap();

    let err = svc
        .update_class_group(
            g.id,
            ClassGroupPatch {
                capacity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvariantViolation(_))));
    assert_eq!(svc.get::<ClassGroup>(g.id).await.unwrap().capacity, 2);
}

#[tokio::test]
async fn store_rechecks_seats_on_stale_writes() {
    let svc = service();
    let s = school(&svc).await;
    let g = group(&svc, &s, "10A", &s.morning, 2).await;
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;
    svc.enroll(enroll_in(&ana, &g)).await.unwrap();

    // Counted one seat, a second student arrived before the write.
    let mut stale = g.clone();
    stale.capacity = 1;
    svc.enroll(enroll_in(&rui, &g)).await.unwrap();
    let err = svc.store.place_class_group(&stale, false).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::InvariantViolation(_))), "{err}");
    assert_eq!(svc.get::<ClassGroup>(g.id).await.unwrap().capacity, 2);

    // A room checked before the group was created.
    let mut room = s.room.clone();
    room.capacity = 1;
    let err = svc.store.resize_room(&room).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::InvariantViolation(_))), "{err}");
    assert_eq!(svc.get::<Room>(s.room.id).await.unwrap().capacity, 30);
}

#[tokio::test]
async fn deleting_a_course_cascades_to_groups_and_grid() {
    let svc = service();
    let s = school(&svc).await;
    let (subject, _) = subject_in_grid(&svc, &s).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    group(&svc, &s, "10B", &s.afternoon, 30).await;
    let t = teacher(&svc).await;
    svc.assign_teacher(NewTeachingAssignment {
        teacher_id: t.id,
        class_group_id: a.id,
        subject_id: subject.id,
    })
    .await
    .unwrap();
    let ana = student(&svc, "Ana", "A1").await;
    svc.enroll(enroll_in(&ana, &a)).await.unwrap();

    let summary = svc.delete_course(s.course.id).await.unwrap();
    assert_eq!(summary.deleted.get("class_groups"), Some(&2));
    assert_eq!(summary.deleted.get("enrollments"), Some(&1));
    assert_eq!(summary.deleted.get("teaching_assignments"), Some(&1));
    assert_eq!(summary.deleted.get("curriculum_entries"), Some(&1));
    assert_eq!(summary.total(), 5);

    assert!(matches!(
        svc.get::<Course>(s.course.id).await,
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
    assert!(svc.get::<ClassLevel>(s.level.id).await.is_ok());
    assert!(svc.get::<Subject>(subject.id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_class_level_cascades_to_groups_and_grid() {
    let svc = service();
    let s = school(&svc).await;
    subject_in_grid(&svc, &s).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;
    svc.enroll(enroll_in(&ana, &a)).await.unwrap();
    svc.enroll(enroll_in(&rui, &a)).await.unwrap();

    let summary = svc.delete_class_level(s.level.id).await.unwrap();
    assert_eq!(summary.deleted.get("class_groups"), Some(&1));
    assert_eq!(summary.deleted.get("enrollments"), Some(&2));
    assert_eq!(summary.deleted.get("teaching_assignments"), Some(&0));
    assert_eq!(summary.deleted.get("curriculum_entries"), Some(&1));

    assert!(svc.get::<ClassLevel>(s.level.id).await.is_err());
    assert!(svc.get::<Course>(s.course.id).await.is_ok());
    assert!(svc.get::<Student>(ana.id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_class_group_reports_only_its_dependents() {
    let svc = service();
    let s = school(&svc).await;
    let (subject, _) = subject_in_grid(&svc, &s).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    let b = group(&svc, &s, "10B", &s.afternoon, 30).await;
    let t = teacher(&svc).await;
    svc.assign_teacher(NewTeachingAssignment {
        teacher_id: t.id,
        class_group_id: a.id,
        subject_id: subject.id,
    })
    .await
    .unwrap();
    let ana = student(&svc, "Ana", "A1").await;
    let rui = student(&svc, "Rui", "R1").await;
    svc.enroll(enroll_in(&ana, &a)).await.unwrap();
    let kept = svc.enroll(enroll_in(&rui, &b)).await.unwrap();

    let summary = svc.delete_class_group(a.id).await.unwrap();
    assert_eq!(summary.deleted.get("class_groups"), None);
    assert_eq!(
        summary.message(),
        "class group deleted (enrollments: 1, teaching_assignments: 1)"
    );

    assert!(svc.get::<ClassGroup>(a.id).await.is_err());
    assert!(svc.get::<ClassGroup>(b.id).await.is_ok());
    assert!(svc.get::<Enrollment>(kept.id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_student_removes_enrollments() {
    let svc = service();
    let s = school(&svc).await;
    let g = group(&svc, &s, "10A", &s.morning, 30).await;
    let ana = student(&svc, "Ana", "A1").await;
    let enrollment = svc.enroll(enroll_in(&ana, &g)).await.unwrap();

    let summary = svc.delete_student(ana.id).await.unwrap();
    assert_eq!(summary.message(), "student deleted (enrollments: 1)");

    assert!(svc.get::<Student>(ana.id).await.is_err());
    assert!(svc.get::<Enrollment>(enrollment.id).await.is_err());
    assert_eq!(svc.store.count_active_enrollments(g.id).await.unwrap(), 0);
}

#[tokio::test]
async fn cascade_clears_the_previous_group_of_transferred_enrollments() {
    let svc = service();
    let s = school(&svc).await;
    let a = group(&svc, &s, "10A", &s.morning, 30).await;
    let other = svc
        .create_course(NewCourse {
            name: "Ciências Económicas e Jurídicas".into(),
            code: "CEJ".into(),
            description: None,
        })
        .await
        .unwrap();
    let target = svc
        .create_class_group(NewClassGroup {
            designation: "10C".into(),
            school_year_id: s.year.id,
            course_id: other.id,
            class_level_id: s.level.id,
            room_id: s.room.id,
            period_id: s.afternoon.id,
            capacity: None,
        })
        .await
        .unwrap();
    let ana = student(&svc, "Ana", "A1").await;
    let enrollment = svc.enroll(enroll_in(&ana, &a)).await.unwrap();
    let moved = svc
        .transfer_enrollment(enrollment.id, TransferEnrollment { class_group_id: target.id })
        .await
        .unwrap();
    assert_eq!(moved.previous_class_group_id, Some(a.id));

    let summary = svc.delete_course(s.course.id).await.unwrap();
    assert_eq!(summary.deleted.get("class_groups"), Some(&1));
    assert_eq!(summary.deleted.get("enrollments"), Some(&0));

    let kept = svc.get::<Enrollment>(enrollment.id).await.unwrap();
    assert_eq!(kept.class_group_id, target.id);
    assert_eq!(kept.previous_class_group_id, None);
    assert!(kept.is_active());
}

mod billing {
    use super::*;

    async fn tuition(svc: &SchoolService) -> edugest_billing::FeeItem {
        svc.create_fee_item(NewFeeItem {
            code: "PROPINA".into(),
            description: "Propina mensal".into(),
            unit_price: 1_500_000,
            tax_rate_bp: 0,
            tax_exemption_code: Some("M11".into()),
            tax_exemption_reason: Some("Isento - ensino".into()),
        })
        .await
        .unwrap()
    }

    fn invoice_for(student: &Student, fee: &edugest_billing::FeeItem, quantity: i64) -> NewInvoice {
        NewInvoice {
            student_id: student.id,
            issue_date: None,
            lines: vec![NewInvoiceLine {
                fee_item_id: fee.id,
                quantity,
                description: None,
            }],
        }
    }

    #[tokio::test]
    async fn invoices_are_numbered_sequentially_per_series() {
        let svc = service();
        let ana = student(&svc, "Ana", "A1").await;
        let fee = tuition(&svc).await;

        let first = svc.issue_invoice(invoice_for(&ana, &fee, 1)).await.unwrap();
        let second = svc.issue_invoice(invoice_for(&ana, &fee, 2)).await.unwrap();

        let year = Utc::now().year();
        assert_eq!(first.number, format!("FT EDU{year}/1"));
        assert_eq!(second.number, format!("FT EDU{year}/2"));
        assert_eq!(second.gross_total.minor(), 3_000_000);

        let cancelled = svc.cancel_invoice(first.id, "Emitida em duplicado").await.unwrap();
        assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
        assert_eq!(cancelled.number, first.number);

        let third = svc.issue_invoice(invoice_for(&ana, &fee, 1)).await.unwrap();
        assert_eq!(third.sequence, 3);
    }

    #[tokio::test]
    async fn invoiced_students_and_fee_items_are_kept() {
        let svc = service();
        let ana = student(&svc, "Ana", "A1").await;
        let fee = tuition(&svc).await;
        svc.issue_invoice(invoice_for(&ana, &fee, 1)).await.unwrap();

        assert!(matches!(
            svc.delete_student(ana.id).await,
            Err(ServiceError::Store(StoreError::Conflict(_)))
        ));
        assert!(matches!(
            svc.delete_fee_item(fee.id).await,
            Err(ServiceError::Store(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn unknown_fee_item_is_not_found() {
        let svc = service();
        let ana = student(&svc, "Ana", "A1").await;
        let err = svc
            .issue_invoice(NewInvoice {
                student_id: ana.id,
                issue_date: None,
                lines: vec![NewInvoiceLine {
                    fee_item_id: edugest_core::FeeItemId::new(),
                    quantity: 1,
                    description: None,
                }],
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fee item not found");
    }

    #[tokio::test]
    async fn saft_export_covers_the_period() {
        let svc = service();
        let ana = student(&svc, "Ana", "A1").await;
        let fee = tuition(&svc).await;
        let first = svc.issue_invoice(invoice_for(&ana, &fee, 1)).await.unwrap();
        svc.issue_invoice(invoice_for(&ana, &fee, 1)).await.unwrap();
        svc.cancel_invoice(first.id, "Erro").await.unwrap();

        let today = Utc::now().date_naive();
        let start = date(today.year(), 1, 1);
        let export = svc.export_saft(start, today).await.unwrap();

        assert_eq!(export.invoice_count, 2);
        // Cancelled documents stay in the file but not in the credit total.
        assert_eq!(export.total_credit.minor(), 1_500_000);
        assert!(export.xml.contains(&first.number));
        assert!(export.xml.contains("<InvoiceStatus>A</InvoiceStatus>"));
        assert!(export.file_name.ends_with(".xml"));
    }

    #[tokio::test]
    async fn saft_export_rejects_an_inverted_period() {
        let svc = service();
        let err = svc
            .export_saft(date(2025, 3, 1), date(2025, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        let err = svc
            .export_saft(date(2024, 12, 1), date(2025, 1, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }
}
