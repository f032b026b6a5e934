//! `edugest-staff`: teaching staff and their class assignments.

pub mod assignment;
pub mod teacher;

pub use assignment::{NewTeachingAssignment, TeachingAssignment};
pub use teacher::{NewTeacher, Teacher, TeacherPatch};
