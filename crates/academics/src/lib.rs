//! `edugest-academics`: the academic structure of the school.
//!
//! School years, courses, class levels, subjects, rooms, periods, class groups
//! and the curriculum grid. Pure domain: constructors validate input and return
//! ready-to-persist records; uniqueness and references are enforced by the
//! store and the application services.

pub mod class_group;
pub mod class_level;
pub mod course;
pub mod curriculum;
pub mod period;
pub mod room;
pub mod school_year;
pub mod subject;

pub use class_group::{ClassGroup, ClassGroupPatch, NewClassGroup};
pub use class_level::{ClassLevel, ClassLevelPatch, NewClassLevel};
pub use course::{Course, CoursePatch, NewCourse};
pub use curriculum::{CurriculumEntry, CurriculumEntryPatch, NewCurriculumEntry};
pub use period::{NewPeriod, Period, PeriodPatch};
pub use room::{NewRoom, Room, RoomPatch};
pub use school_year::{NewSchoolYear, SchoolYear, SchoolYearPatch};
pub use subject::{NewSubject, Subject, SubjectPatch};
