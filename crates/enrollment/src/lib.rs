//! `edugest-enrollment`: students and their enrollment in class groups.

pub mod enrollment;
pub mod student;

pub use enrollment::{Enrollment, EnrollmentStatus, NewEnrollment, TransferEnrollment};
pub use student::{NewStudent, Student, StudentPatch};
