use edugest_academics::{
    ClassGroup, ClassLevel, Course, CurriculumEntry, Period, Room, SchoolYear, Subject,
};
use edugest_billing::{FeeItem, Invoice};
use edugest_core::Entity;
use edugest_enrollment::{Enrollment, Student};
use edugest_staff::{Teacher, TeachingAssignment};

use super::Filter;

/// A persisted entity: what the generic repositories need besides identity.
pub trait Record: Entity + Clone + Send + Sync + Unpin + 'static {
    /// Value matched (case-insensitively) by `ListQuery::search`; entities
    /// without a display column ignore the search term.
    fn search_text(&self) -> Option<&str> {
        None
    }

    /// Filter columns this entity can be listed by.
    const FILTERS: &'static [&'static str] = &[];

    /// In-memory evaluation of a supported filter.
    fn matches(&self, _filter: &Filter) -> bool {
        false
    }

    fn supports(filter: &Filter) -> bool {
        Self::FILTERS.contains(&filter.column())
    }
}

impl Record for SchoolYear {
    fn search_text(&self) -> Option<&str> {
        Some(&self.designation)
    }
}

impl Record for Course {
    fn search_text(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Record for ClassLevel {
    fn search_text(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Record for Subject {
    fn search_text(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Record for Room {
    fn search_text(&self) -> Option<&str> {
        Some(&self.designation)
    }
}

impl Record for Period {
    fn search_text(&self) -> Option<&str> {
        Some(&self.designation)
    }
}

impl Record for ClassGroup {
    const FILTERS: &'static [&'static str] = &["school_year_id", "course_id", "class_level_id"];

    fn search_text(&self) -> Option<&str> {
        Some(&self.designation)
    }

    fn matches(&self, filter: &Filter) -> bool {
        match filter {
            Filter::SchoolYear(id) => self.school_year_id == *id,
            Filter::Course(id) => self.course_id == *id,
            Filter::ClassLevel(id) => self.class_level_id == *id,
            _ => false,
        }
    }
}

impl Record for CurriculumEntry {
    const FILTERS: &'static [&'static str] = &["course_id", "class_level_id", "subject_id"];

    fn matches(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Course(id) => self.course_id == *id,
            Filter::ClassLevel(id) => self.class_level_id == *id,
            Filter::Subject(id) => self.subject_id == *id,
            _ => false,
        }
    }
}

impl Record for Teacher {
    fn search_text(&self) -> Option<&str> {
        Some(&self.full_name)
    }
}

impl Record for TeachingAssignment {
    const FILTERS: &'static [&'static str] =
        &["teacher_id", "class_group_id", "subject_id", "school_year_id"];

    fn matches(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Teacher(id) => self.teacher_id == *id,
            Filter::ClassGroup(id) => self.class_group_id == *id,
            Filter::Subject(id) => self.subject_id == *id,
            Filter::SchoolYear(id) => self.school_year_id == *id,
            _ => false,
        }
    }
}

impl Record for Student {
    fn search_text(&self) -> Option<&str> {
        Some(&self.full_name)
    }
}

impl Record for Enrollment {
    const FILTERS: &'static [&'static str] =
        &["student_id", "class_group_id", "school_year_id", "status"];

    fn matches(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Student(id) => self.student_id == *id,
            Filter::ClassGroup(id) => self.class_group_id == *id,
            Filter::SchoolYear(id) => self.school_year_id == *id,
            Filter::EnrollmentStatus(status) => self.status == *status,
            _ => false,
        }
    }
}

impl Record for FeeItem {
    fn search_text(&self) -> Option<&str> {
        Some(&self.description)
    }
}

impl Record for Invoice {
    const FILTERS: &'static [&'static str] = &["student_id", "status"];

    fn search_text(&self) -> Option<&str> {
        Some(&self.number)
    }

    fn matches(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Student(id) => self.student_id == *id,
            Filter::InvoiceStatus(status) => self.status == *status,
            _ => false,
        }
    }
}
