//! `edugest-core`: shared building blocks for the school domain.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod text;
pub mod value_object;

pub use entity::{Entity, Timestamps};
pub use error::{DomainError, DomainResult};
pub use id::{
    AssignmentId, ClassGroupId, ClassLevelId, CourseId, CurriculumEntryId, EnrollmentId, FeeItemId,
    InvoiceId, PeriodId, RoomId, SchoolYearId, StudentId, SubjectId, TeacherId,
};
pub use page::{Page, PageRequest};
pub use value_object::{Money, TaxRate, ValueObject};
